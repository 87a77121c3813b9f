use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{categories, ukms};

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<categories::Model>> {
        categories::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category")
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query category by name")
    }

    pub async fn list(&self) -> Result<Vec<categories::Model>> {
        categories::Entity::find()
            .order_by_asc(categories::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list categories")
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<categories::Model> {
        let active = categories::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description),
            icon: Set(icon),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert category")
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<String>,
        description: Option<String>,
        icon: Option<String>,
    ) -> Result<Option<categories::Model>> {
        let Some(category) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = category.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(Some(description));
        }
        if let Some(icon) = icon {
            active.icon = Set(Some(icon));
        }

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update category")?;
        Ok(Some(updated))
    }

    /// Number of UKM rows still referencing the category. Deletion is
    /// refused while this is non-zero to keep the FK invariant intact.
    pub async fn ukm_count(&self, id: i32) -> Result<u64> {
        ukms::Entity::find()
            .filter(ukms::Column::CategoryId.eq(id))
            .count(&self.conn)
            .await
            .context("Failed to count UKMs for category")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = categories::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete category")?;
        Ok(result.rows_affected > 0)
    }

    /// Create the category if missing. Idempotent; used by bootstrap.
    pub async fn ensure(&self, name: &str, description: &str, icon: &str) -> Result<()> {
        if self.get_by_name(name).await?.is_none() {
            self.create(name, Some(description.to_string()), Some(icon.to_string()))
                .await?;
        }
        Ok(())
    }
}
