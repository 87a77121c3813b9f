use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub full_name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    pub phone: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    /// ISO date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,

    /// male, female or other
    pub gender: Option<String>,

    /// NIM
    pub student_id: Option<String>,

    pub faculty: Option<String>,

    pub major: Option<String>,

    /// External URL or base64 data URI; mutually exclusive with `avatar_filename`.
    pub avatar_url: Option<String>,

    /// Filename inside the uploads directory; mutually exclusive with `avatar_url`.
    pub avatar_filename: Option<String>,

    /// Discriminator: 'url', 'local' or 'base64'
    pub avatar_type: String,

    pub role_id: i32,

    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id"
    )]
    Role,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
