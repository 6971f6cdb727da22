use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::entities::{change_log, prelude::*};

/// All audit rows carry the same source tag; the table predates this app and
/// other tools write their own tags.
const SOURCE_WEB: &str = "web";

pub struct ChangeLogRepository {
    conn: DatabaseConnection,
}

impl ChangeLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add(
        &self,
        prodnum: i32,
        buildcatnum: i32,
        old_value: Option<f64>,
        new_value: f64,
        username: &str,
        ip_address: &str,
        hostname: &str,
    ) -> Result<()> {
        let active = change_log::ActiveModel {
            prodnum: Set(prodnum),
            buildcatnum: Set(buildcatnum),
            old_value: Set(old_value),
            new_value: Set(new_value),
            changed_by: Set(username.to_string()),
            changed_at: Set(chrono::Utc::now().to_rfc3339()),
            source: Set(SOURCE_WEB.to_string()),
            comment: Set(None),
            hostname: Set(hostname.to_string()),
            ip_address: Set(ip_address.to_string()),
            ..Default::default()
        };

        ChangeLog::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to append change log entry")?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<change_log::Model>> {
        let entries = ChangeLog::find()
            .order_by_desc(change_log::Column::ChangedAt)
            .all(&self.conn)
            .await
            .context("Failed to list change log")?;

        Ok(entries)
    }
}
