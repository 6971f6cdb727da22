use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cost_targets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub prodnum: i32,

    pub buildcatnum: i32,

    pub target_cost: f64,

    pub comments: String,

    pub department_id: Option<i32>,

    pub created_by: String,

    pub created_at: String,

    pub updated_by: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::DepartmentId"
    )]
    Department,
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
