use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Canonical lower-cased username, unique across the table.
    #[sea_orm(unique)]
    pub username: String,

    pub displayname: String,

    /// Stored as text, validated against `domain::Role` at the web boundary.
    pub role: String,

    pub is_active: bool,

    pub created_at: String,

    pub last_login_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
