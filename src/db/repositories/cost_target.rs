use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};

use crate::domain::{SortField, SortOrder};
use crate::entities::{cost_targets, departments, prelude::*};

use super::super::StoreError;

/// One listing row: a cost target joined with its department name.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CostTargetRow {
    pub id: i32,
    pub prodnum: i32,
    pub buildcatnum: i32,
    pub target_cost: f64,
    pub comments: String,
    pub department_id: Option<i32>,
    pub department_name: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: String,
    pub updated_at: String,
}

/// Listing parameters, parsed and validated at the web boundary. A `None`
/// department filter means the `all` sentinel (no filter).
#[derive(Debug, Clone, Default)]
pub struct CostTargetQuery {
    pub prodnum_filter: Option<String>,
    pub buildcat_filter: Option<String>,
    pub department: Option<i32>,
    pub sort: SortField,
    pub order: SortOrder,
}

pub struct CostTargetRepository {
    conn: DatabaseConnection,
}

impl CostTargetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, query: &CostTargetQuery) -> Result<Vec<CostTargetRow>> {
        let mut select = CostTargets::find()
            .join(
                sea_orm::JoinType::LeftJoin,
                cost_targets::Relation::Department.def(),
            )
            .column_as(departments::Column::DepartmentName, "department_name");

        // Glob filters match the numeric column cast to text, with the
        // user's `*` translated to the SQL `%` wildcard.
        if let Some(pattern) = like_pattern(query.prodnum_filter.as_deref()) {
            select = select.filter(Expr::cust_with_values(
                r#"CAST("cost_targets"."prodnum" AS TEXT) LIKE ?"#,
                [pattern],
            ));
        }

        if let Some(pattern) = like_pattern(query.buildcat_filter.as_deref()) {
            select = select.filter(Expr::cust_with_values(
                r#"CAST("cost_targets"."buildcatnum" AS TEXT) LIKE ?"#,
                [pattern],
            ));
        }

        if let Some(department_id) = query.department {
            select = select.filter(cost_targets::Column::DepartmentId.eq(department_id));
        }

        let order = match query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let select = match query.sort {
            SortField::Prodnum => select.order_by(cost_targets::Column::Prodnum, order),
            SortField::Buildcatnum => select.order_by(cost_targets::Column::Buildcatnum, order),
            SortField::TargetCost => select.order_by(cost_targets::Column::TargetCost, order),
            SortField::Department => select.order_by(departments::Column::DepartmentName, order),
            SortField::CreatedAt => select.order_by(cost_targets::Column::CreatedAt, order),
            SortField::UpdatedAt => select.order_by(cost_targets::Column::UpdatedAt, order),
        };

        let rows = select
            .into_model::<CostTargetRow>()
            .all(&self.conn)
            .await
            .context("Failed to list cost targets")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<CostTargetRow>> {
        let row = CostTargets::find_by_id(id)
            .join(
                sea_orm::JoinType::LeftJoin,
                cost_targets::Relation::Department.def(),
            )
            .column_as(departments::Column::DepartmentName, "department_name")
            .into_model::<CostTargetRow>()
            .one(&self.conn)
            .await
            .context("Failed to query cost target by id")?;

        Ok(row)
    }

    /// Insert a new cost target. The unique index on (prodnum, buildcatnum)
    /// turns a concurrent duplicate into `StoreError::Duplicate` instead of a
    /// second row.
    pub async fn insert(
        &self,
        prodnum: i32,
        buildcatnum: i32,
        target_cost: f64,
        comments: &str,
        department_id: Option<i32>,
        username: &str,
    ) -> Result<(), StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = cost_targets::ActiveModel {
            prodnum: Set(prodnum),
            buildcatnum: Set(buildcatnum),
            target_cost: Set(target_cost),
            comments: Set(comments.to_string()),
            department_id: Set(department_id),
            created_by: Set(username.to_string()),
            created_at: Set(now.clone()),
            updated_by: Set(username.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };

        match CostTargets::insert(active).exec(&self.conn).await {
            Ok(_) => Ok(()),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(StoreError::Duplicate),
                _ => Err(StoreError::Other(
                    anyhow::Error::from(err).context("Failed to insert cost target"),
                )),
            },
        }
    }

    /// Overwrite cost, comments and department; stamps updated_by/updated_at.
    /// Returns false for an unknown id.
    pub async fn update(
        &self,
        id: i32,
        target_cost: f64,
        comments: &str,
        department_id: Option<i32>,
        username: &str,
    ) -> Result<bool> {
        let Some(record) = CostTargets::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query cost target for update")?
        else {
            return Ok(false);
        };

        let mut active: cost_targets::ActiveModel = record.into();
        active.target_cost = Set(target_cost);
        active.comments = Set(comments.to_string());
        active.department_id = Set(department_id);
        active.updated_by = Set(username.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}

/// Empty filters are no filters; `*` becomes the SQL wildcard.
fn like_pattern(filter: Option<&str>) -> Option<String> {
    let filter = filter?.trim();
    if filter.is_empty() {
        return None;
    }
    Some(filter.replace('*', "%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_translates_glob() {
        assert_eq!(like_pattern(Some("12*")), Some("12%".to_string()));
        assert_eq!(like_pattern(Some("*5*")), Some("%5%".to_string()));
        assert_eq!(like_pattern(Some("500")), Some("500".to_string()));
    }

    #[test]
    fn like_pattern_ignores_blank_input() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("")), None);
        assert_eq!(like_pattern(Some("   ")), None);
    }
}
