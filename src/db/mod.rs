use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::Role;
use crate::entities::{change_log, departments, users};

pub mod migrator;
pub mod repositories;

pub use repositories::cost_target::{CostTargetQuery, CostTargetRow};

/// Errors surfaced by write operations that have a typed conflict outcome.
/// Everything else rides along as an opaque failure of the current request.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A Cost Target for this Product + Category already exists.")]
    Duplicate,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn department_repo(&self) -> repositories::department::DepartmentRepository {
        repositories::department::DepartmentRepository::new(self.conn.clone())
    }

    fn cost_target_repo(&self) -> repositories::cost_target::CostTargetRepository {
        repositories::cost_target::CostTargetRepository::new(self.conn.clone())
    }

    fn change_log_repo(&self) -> repositories::change_log::ChangeLogRepository {
        repositories::change_log::ChangeLogRepository::new(self.conn.clone())
    }

    // === Users ===

    pub async fn get_user(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_or_create_user(
        &self,
        username: &str,
        displayname: &str,
    ) -> Result<users::Model> {
        self.user_repo().get_or_create(username, displayname).await
    }

    pub async fn update_last_login(&self, username: &str) -> Result<()> {
        self.user_repo().update_last_login(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list().await
    }

    pub async fn update_user_record(
        &self,
        username: &str,
        displayname: &str,
        role: Role,
        is_active: bool,
    ) -> Result<bool> {
        self.user_repo()
            .update_record(username, displayname, role, is_active)
            .await
    }

    // === Departments ===

    pub async fn list_departments(&self) -> Result<Vec<departments::Model>> {
        self.department_repo().list().await
    }

    pub async fn update_department(&self, id: i32, name: &str, is_active: bool) -> Result<bool> {
        self.department_repo().update(id, name, is_active).await
    }

    // === Cost targets ===

    pub async fn list_cost_targets(&self, query: &CostTargetQuery) -> Result<Vec<CostTargetRow>> {
        self.cost_target_repo().list(query).await
    }

    pub async fn get_cost_target(&self, id: i32) -> Result<Option<CostTargetRow>> {
        self.cost_target_repo().get(id).await
    }

    pub async fn insert_cost_target(
        &self,
        prodnum: i32,
        buildcatnum: i32,
        target_cost: f64,
        comments: &str,
        department_id: Option<i32>,
        username: &str,
    ) -> Result<(), StoreError> {
        self.cost_target_repo()
            .insert(
                prodnum,
                buildcatnum,
                target_cost,
                comments,
                department_id,
                username,
            )
            .await
    }

    pub async fn update_cost_target(
        &self,
        id: i32,
        target_cost: f64,
        comments: &str,
        department_id: Option<i32>,
        username: &str,
    ) -> Result<bool> {
        self.cost_target_repo()
            .update(id, target_cost, comments, department_id, username)
            .await
    }

    // === Change log ===

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_log(
        &self,
        prodnum: i32,
        buildcatnum: i32,
        old_value: Option<f64>,
        new_value: f64,
        username: &str,
        ip_address: &str,
        hostname: &str,
    ) -> Result<()> {
        self.change_log_repo()
            .add(
                prodnum,
                buildcatnum,
                old_value,
                new_value,
                username,
                ip_address,
                hostname,
            )
            .await
    }

    pub async fn list_logs(&self) -> Result<Vec<change_log::Model>> {
        self.change_log_repo().list().await
    }
}
