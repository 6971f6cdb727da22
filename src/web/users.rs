use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tower_sessions::Session;

use crate::domain::Role;

use super::auth::{current_user, require_admin};
use super::render::{self, esc, esc_attr, fmt_ts, fmt_ts_opt, push_flash, take_flashes};
use super::{AppState, WebError};

#[derive(Deserialize)]
pub struct EditUserForm {
    pub displayname: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
}

/// GET /users (admin)
pub async fn users_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    require_admin(&user)?;

    let users = state.store.list_users().await?;

    let mut body = String::from(
        "<table>\n<tr><th>Username</th><th>Display name</th><th>Role</th><th>Active</th>\
<th>Created</th><th>Last login</th><th></th></tr>\n",
    );
    for u in &users {
        let _ = write!(
            body,
            "<tr><td>{username}</td><td>{display}</td><td>{role}</td><td>{active}</td>\
<td>{created}</td><td>{last_login}</td>\
<td><a href=\"/users/edit/{username_attr}\">Edit</a></td></tr>\n",
            username = esc(&u.username),
            display = esc(&u.displayname),
            role = esc(&u.role),
            active = if u.is_active { "yes" } else { "no" },
            created = fmt_ts(&u.created_at),
            last_login = fmt_ts_opt(u.last_login_at.as_ref()),
            username_attr = urlencoding::encode(&u.username),
        );
    }
    body.push_str("</table>");

    let flashes = take_flashes(&session).await;
    Ok(render::page("Users", &user, &flashes, &body).into_response())
}

/// GET /users/edit/{username} (admin)
pub async fn edit_user_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    require_admin(&user)?;

    let target = state
        .store
        .get_user(&username)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("User {username} not found.")))?;

    let role = Role::parse(&target.role).unwrap_or(Role::User);
    let (admin_sel, user_sel) = match role {
        Role::Admin => (" selected", ""),
        Role::User => ("", " selected"),
    };
    let active_checked = if target.is_active { " checked" } else { "" };

    let body = format!(
        r#"<form method="post" action="/users/edit/{username_attr}">
<p><label>Display name <input name="displayname" value="{display}"></label></p>
<p><label>Role <select name="role">
<option value="admin"{admin_sel}>admin</option>
<option value="user"{user_sel}>user</option>
</select></label></p>
<p><label><input type="checkbox" name="is_active" value="1"{active_checked}> Active</label></p>
<button type="submit">Save</button>
</form>"#,
        username_attr = urlencoding::encode(&target.username),
        display = esc_attr(&target.displayname),
    );

    let flashes = take_flashes(&session).await;
    let title = format!("Edit User {}", target.username);
    Ok(render::page(&title, &user, &flashes, &body).into_response())
}

/// POST /users/edit/{username} (admin)
pub async fn edit_user_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(username): Path<String>,
    Form(form): Form<EditUserForm>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    require_admin(&user)?;

    // A cleared display name falls back to the username itself.
    let displayname = form
        .displayname
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| username.clone());

    let Some(role) = Role::parse(form.role.as_deref().unwrap_or("")) else {
        push_flash(&session, "danger", "Role must be admin or user.").await;
        let back = format!("/users/edit/{}", urlencoding::encode(&username));
        return Ok(Redirect::to(&back).into_response());
    };

    let is_active = form.is_active.as_deref() == Some("1");

    let updated = state
        .store
        .update_user_record(&username, &displayname, role, is_active)
        .await?;
    if !updated {
        return Err(WebError::NotFound(format!("User {username} not found.")));
    }

    Ok(Redirect::to("/users").into_response())
}
