use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ukms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub nama: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub deskripsi: Option<String>,

    pub category_id: i32,

    pub logo_url: Option<String>,

    pub contact_person: Option<String>,

    pub contact_email: Option<String>,

    pub contact_phone: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub prestasi: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub kegiatan_rutin: Option<String>,

    /// Soft-delete flag: inactive rows stay in the table but leave public listings.
    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
