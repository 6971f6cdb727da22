use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::entities::{departments, prelude::*};

pub struct DepartmentRepository {
    conn: DatabaseConnection,
}

impl DepartmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<departments::Model>> {
        let departments = Departments::find()
            .order_by_asc(departments::Column::DepartmentId)
            .all(&self.conn)
            .await
            .context("Failed to list departments")?;

        Ok(departments)
    }

    /// Overwrite name and active flag. Returns false for an unknown id.
    pub async fn update(&self, id: i32, name: &str, is_active: bool) -> Result<bool> {
        let Some(department) = Departments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query department for update")?
        else {
            return Ok(false);
        };

        let mut active: departments::ActiveModel = department.into();
        active.department_name = Set(name.to_string());
        active.is_active = Set(is_active);
        active.update(&self.conn).await?;

        Ok(true)
    }
}
