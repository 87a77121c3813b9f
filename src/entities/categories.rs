use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Emoji or icon class shown by the frontend.
    pub icon: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ukms::Entity")]
    Ukms,
}

impl Related<super::ukms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ukms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
