use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{categories, roles};
use crate::models::avatar::Avatar;
use crate::models::ukm::Ukm;
use crate::models::user::User;

pub mod bootstrap;
pub mod migrator;
pub mod repositories;

pub use repositories::role::RoleWithCount;
pub use repositories::ukm::{UkmInput, UkmUpdate};
pub use repositories::user::ProfileUpdate;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn role_repo(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn ukm_repo(&self) -> repositories::ukm::UkmRepository {
        repositories::ukm::UkmRepository::new(self.conn.clone())
    }

    // ---- users ----

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.user_repo().username_taken(username).await
    }

    pub async fn email_taken(&self, email: &str, exclude_user: Option<i32>) -> Result<bool> {
        self.user_repo().email_taken(email, exclude_user).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        full_name: Option<String>,
        role_id: i32,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, email, password, full_name, role_id, security)
            .await
    }

    pub async fn verify_user_password(&self, user_id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(user_id, password).await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, security)
            .await
    }

    pub async fn update_user_profile(&self, user_id: i32, update: ProfileUpdate) -> Result<()> {
        self.user_repo().update_profile(user_id, update).await
    }

    /// Returns the avatar state being replaced.
    pub async fn set_user_avatar(&self, user_id: i32, avatar: &Avatar) -> Result<Avatar> {
        self.user_repo().set_avatar(user_id, avatar).await
    }

    pub async fn assign_user_role(&self, user_id: i32, role_name: &str) -> Result<bool> {
        self.user_repo().assign_role(user_id, role_name).await
    }

    pub async fn delete_user(&self, user_id: i32) -> Result<bool> {
        self.user_repo().delete(user_id).await
    }

    // ---- roles ----

    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<roles::Model>> {
        self.role_repo().get_by_name(name).await
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleWithCount>> {
        self.role_repo().list_with_counts().await
    }

    // ---- categories ----

    pub async fn get_category(&self, id: i32) -> Result<Option<categories::Model>> {
        self.category_repo().get(id).await
    }

    pub async fn category_exists(&self, id: i32) -> Result<bool> {
        self.category_repo().exists(id).await
    }

    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<categories::Model>> {
        self.category_repo().get_by_name(name).await
    }

    pub async fn list_categories(&self) -> Result<Vec<categories::Model>> {
        self.category_repo().list().await
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<categories::Model> {
        self.category_repo().create(name, description, icon).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        name: Option<String>,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<Option<categories::Model>> {
        self.category_repo()
            .update(id, name, description, icon)
            .await
    }

    pub async fn category_ukm_count(&self, id: i32) -> Result<u64> {
        self.category_repo().ukm_count(id).await
    }

    pub async fn delete_category(&self, id: i32) -> Result<bool> {
        self.category_repo().delete(id).await
    }

    // ---- ukms ----

    pub async fn list_ukms(&self, include_inactive: bool) -> Result<Vec<Ukm>> {
        self.ukm_repo().list(include_inactive).await
    }

    pub async fn get_ukm(&self, id: i32, include_inactive: bool) -> Result<Option<Ukm>> {
        self.ukm_repo().get(id, include_inactive).await
    }

    pub async fn create_ukm(&self, input: UkmInput) -> Result<Ukm> {
        self.ukm_repo().create(input).await
    }

    pub async fn update_ukm(&self, id: i32, update: UkmUpdate) -> Result<Option<Ukm>> {
        self.ukm_repo().update(id, update).await
    }

    pub async fn soft_delete_ukm(&self, id: i32) -> Result<bool> {
        self.ukm_repo().soft_delete(id).await
    }
}
