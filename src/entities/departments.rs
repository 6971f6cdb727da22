use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    /// Matches the leading digit of a product number, so keys stay 1-9.
    #[sea_orm(primary_key, auto_increment = false)]
    pub department_id: i32,

    pub department_name: String,

    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cost_targets::Entity")]
    CostTargets,
}

impl Related<super::cost_targets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CostTargets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
