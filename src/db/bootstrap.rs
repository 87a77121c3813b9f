//! Idempotent seed data, run once at startup after migrations.
//!
//! Every step is gated by an existence check so restarting the process
//! never duplicates rows or resets the admin password.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::models::permission::{ROLE_ADMIN, ROLE_USER};

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    (
        "Unit Kegiatan Olahraga",
        "Wadah pengembangan bakat olahraga",
        "🏃",
    ),
    (
        "Unit Kegiatan Kesenian",
        "Tempat berkreasi seni dan budaya",
        "🎭",
    ),
    (
        "Unit Kegiatan Khusus",
        "Kegiatan khusus dan penalaran",
        "⭐",
    ),
];

pub async fn run(store: &Store, config: &Config) -> Result<()> {
    let role_repo = crate::db::repositories::role::RoleRepository::new(store.conn.clone());
    let category_repo =
        crate::db::repositories::category::CategoryRepository::new(store.conn.clone());

    let admin_role = role_repo
        .ensure(ROLE_ADMIN, "Administrator with full access")
        .await
        .context("Failed to seed admin role")?;
    role_repo
        .ensure(ROLE_USER, "Regular user with limited access")
        .await
        .context("Failed to seed user role")?;

    for (name, description, icon) in DEFAULT_CATEGORIES {
        category_repo
            .ensure(name, description, icon)
            .await
            .context("Failed to seed default category")?;
    }

    if store.get_user_by_username("admin").await?.is_none() {
        store
            .create_user(
                "admin",
                "admin@ukmiverse.com",
                &config.security.bootstrap_admin_password,
                Some("Administrator".to_string()),
                admin_role.id,
                &config.security,
            )
            .await
            .context("Failed to seed admin account")?;
        info!("Seeded bootstrap admin account");
    }

    Ok(())
}
