use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::Role;
use crate::entities::{prelude::*, users};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user)
    }

    /// Fetch a user, provisioning the row on first sight. The insert uses
    /// `ON CONFLICT DO NOTHING` on the unique username column, so two
    /// concurrent first sightings of the same user still produce one row.
    pub async fn get_or_create(&self, username: &str, displayname: &str) -> Result<users::Model> {
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            displayname: Set(displayname.to_string()),
            role: Set(Role::User.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Users::insert(active)
            .on_conflict(
                OnConflict::column(users::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to provision user")?;

        self.get_by_username(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {username} missing after provisioning"))
    }

    pub async fn update_last_login(&self, username: &str) -> Result<()> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for login stamp")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let mut active: users::ActiveModel = user.into();
        active.last_login_at = Set(Some(chrono::Utc::now().to_rfc3339()));
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        let users = Users::find()
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users)
    }

    /// Overwrite the admin-editable fields. Returns false when the username
    /// does not exist.
    pub async fn update_record(
        &self,
        username: &str,
        displayname: &str,
        role: Role,
        is_active: bool,
    ) -> Result<bool> {
        let Some(user) = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.displayname = Set(displayname.to_string());
        active.role = Set(role.as_str().to_string());
        active.is_active = Set(is_active);
        active.update(&self.conn).await?;

        Ok(true)
    }
}
