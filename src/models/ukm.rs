use crate::entities::{categories, ukms};

/// UKM row joined with its category.
#[derive(Debug, Clone)]
pub struct Ukm {
    pub id: i32,
    pub nama: String,
    pub deskripsi: Option<String>,
    pub category: CategoryInfo,
    pub logo_url: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub prestasi: Option<String>,
    pub kegiatan_rutin: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CategoryInfo {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: String,
}

impl From<categories::Model> for CategoryInfo {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            icon: model.icon,
            created_at: model.created_at,
        }
    }
}

impl Ukm {
    #[must_use]
    pub fn from_models(model: ukms::Model, category: categories::Model) -> Self {
        Self {
            id: model.id,
            nama: model.nama,
            deskripsi: model.deskripsi,
            category: category.into(),
            logo_url: model.logo_url,
            contact_person: model.contact_person,
            contact_email: model.contact_email,
            contact_phone: model.contact_phone,
            prestasi: model.prestasi,
            kegiatan_rutin: model.kegiatan_rutin,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
