use sea_orm::entity::prelude::*;

/// Append-only audit trail of cost value changes. Rows are never updated or
/// deleted once written.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "change_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub log_id: i64,

    pub prodnum: i32,

    pub buildcatnum: i32,

    /// None for the initial insert of a cost target.
    pub old_value: Option<f64>,

    pub new_value: f64,

    pub changed_by: String,

    pub changed_at: String,

    pub source: String,

    pub comment: Option<String>,

    pub hostname: String,

    pub ip_address: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
