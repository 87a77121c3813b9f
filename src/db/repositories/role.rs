use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{roles, users};

/// Role with the number of users bound to it.
#[derive(Debug, Clone)]
pub struct RoleWithCount {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub user_count: u64,
}

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<roles::Model>> {
        roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query role by name")
    }

    pub async fn list_with_counts(&self) -> Result<Vec<RoleWithCount>> {
        let roles = roles::Entity::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list roles")?;

        let mut result = Vec::with_capacity(roles.len());
        for role in roles {
            let user_count = users::Entity::find()
                .filter(users::Column::RoleId.eq(role.id))
                .count(&self.conn)
                .await
                .context("Failed to count users for role")?;
            result.push(RoleWithCount {
                id: role.id,
                name: role.name,
                description: role.description,
                created_at: role.created_at,
                user_count,
            });
        }

        Ok(result)
    }

    /// Create the role if it does not exist yet. Idempotent.
    pub async fn ensure(&self, name: &str, description: &str) -> Result<roles::Model> {
        if let Some(existing) = self.get_by_name(name).await? {
            return Ok(existing);
        }

        let active = roles::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert role")
    }
}
