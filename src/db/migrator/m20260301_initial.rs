use crate::entities::prelude::*;
use crate::entities::{cost_targets, departments, users};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Departments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CostTargets)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ChangeLog)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Uniqueness of (prodnum, buildcatnum) is enforced here so concurrent
        // inserts of the same pair cannot both succeed; the application maps
        // the constraint violation to a duplicate error.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_cost_targets_prodnum_buildcatnum")
                    .table(CostTargets)
                    .col(cost_targets::Column::Prodnum)
                    .col(cost_targets::Column::Buildcatnum)
                    .unique()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();

        // Seed the admin account so the admin screens are reachable on a
        // fresh database. Regular users are provisioned on first login.
        let seed_admin = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Username,
                users::Column::Displayname,
                users::Column::Role,
                users::Column::IsActive,
                users::Column::CreatedAt,
            ])
            .values_panic([
                "admin".into(),
                "Administrator".into(),
                "admin".into(),
                true.into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(seed_admin).await?;

        // One department per possible leading digit, so department
        // auto-detection always resolves to an existing row.
        for id in 1..=9 {
            let seed_dept = sea_orm_migration::sea_query::Query::insert()
                .into_table(Departments)
                .columns([
                    departments::Column::DepartmentId,
                    departments::Column::DepartmentName,
                    departments::Column::IsActive,
                ])
                .values_panic([id.into(), format!("Department {id}").into(), true.into()])
                .to_owned();

            manager.exec_stmt(seed_dept).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChangeLog).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CostTargets).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
