use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::{categories, ukms};
use crate::models::ukm::Ukm;

/// Fields accepted when creating a UKM. The category reference is validated
/// by the caller before the insert.
#[derive(Debug, Clone)]
pub struct UkmInput {
    pub nama: String,
    pub deskripsi: Option<String>,
    pub category_id: i32,
    pub logo_url: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub prestasi: Option<String>,
    pub kegiatan_rutin: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct UkmUpdate {
    pub nama: Option<String>,
    pub deskripsi: Option<String>,
    pub category_id: Option<i32>,
    pub logo_url: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub prestasi: Option<String>,
    pub kegiatan_rutin: Option<String>,
}

pub struct UkmRepository {
    conn: DatabaseConnection,
}

impl UkmRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_row(row: (ukms::Model, Option<categories::Model>)) -> Result<Ukm> {
        let (ukm, category) = row;
        let category =
            category.ok_or_else(|| anyhow::anyhow!("UKM {} has a dangling category", ukm.id))?;
        Ok(Ukm::from_models(ukm, category))
    }

    /// List UKMs joined with their category. Inactive rows are only
    /// included for administrative callers.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Ukm>> {
        let mut query = ukms::Entity::find().order_by_asc(ukms::Column::Id);
        if !include_inactive {
            query = query.filter(ukms::Column::IsActive.eq(true));
        }

        let rows = query
            .find_also_related(categories::Entity)
            .all(&self.conn)
            .await
            .context("Failed to list UKMs")?;

        rows.into_iter().map(Self::map_row).collect()
    }

    pub async fn get(&self, id: i32, include_inactive: bool) -> Result<Option<Ukm>> {
        let row = ukms::Entity::find_by_id(id)
            .find_also_related(categories::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query UKM")?;

        match row {
            Some(row) => {
                let ukm = Self::map_row(row)?;
                if ukm.is_active || include_inactive {
                    Ok(Some(ukm))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    pub async fn create(&self, input: UkmInput) -> Result<Ukm> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = ukms::ActiveModel {
            nama: Set(input.nama.clone()),
            deskripsi: Set(input.deskripsi),
            category_id: Set(input.category_id),
            logo_url: Set(input.logo_url),
            contact_person: Set(input.contact_person),
            contact_email: Set(input.contact_email),
            contact_phone: Set(input.contact_phone),
            prestasi: Set(input.prestasi),
            kegiatan_rutin: Set(input.kegiatan_rutin),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert UKM")?;

        info!("Added UKM: {}", input.nama);

        self.get(model.id, true)
            .await?
            .ok_or_else(|| anyhow::anyhow!("UKM vanished after insert"))
    }

    pub async fn update(&self, id: i32, update: UkmUpdate) -> Result<Option<Ukm>> {
        let Some(ukm) = ukms::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query UKM for update")?
        else {
            return Ok(None);
        };

        let mut active: ukms::ActiveModel = ukm.into();

        if let Some(nama) = update.nama {
            active.nama = Set(nama);
        }
        if let Some(deskripsi) = update.deskripsi {
            active.deskripsi = Set(Some(deskripsi));
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(logo_url) = update.logo_url {
            active.logo_url = Set(Some(logo_url));
        }
        if let Some(contact_person) = update.contact_person {
            active.contact_person = Set(Some(contact_person));
        }
        if let Some(contact_email) = update.contact_email {
            active.contact_email = Set(Some(contact_email));
        }
        if let Some(contact_phone) = update.contact_phone {
            active.contact_phone = Set(Some(contact_phone));
        }
        if let Some(prestasi) = update.prestasi {
            active.prestasi = Set(Some(prestasi));
        }
        if let Some(kegiatan_rutin) = update.kegiatan_rutin {
            active.kegiatan_rutin = Set(Some(kegiatan_rutin));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        self.get(id, true).await
    }

    /// Soft delete: the row stays but leaves public listings.
    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let Some(ukm) = ukms::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query UKM for delete")?
        else {
            return Ok(false);
        };

        let mut active: ukms::ActiveModel = ukm.into();
        active.is_active = Set(false);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}
