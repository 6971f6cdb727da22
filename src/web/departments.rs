use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{current_user, require_admin};
use super::render::{self, esc_attr, push_flash, take_flashes};
use super::{AppState, WebError};

#[derive(Deserialize)]
pub struct EditDepartmentForm {
    pub department_name: Option<String>,
    pub is_active: Option<String>,
}

/// GET /departments (admin)
pub async fn departments_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    require_admin(&user)?;

    let departments = state.store.list_departments().await?;

    // Each row edits through its own form; the inputs reference it by id so
    // the table markup stays valid.
    let mut body =
        String::from("<table>\n<tr><th>Id</th><th>Name</th><th>Active</th><th></th></tr>\n");
    let mut forms = String::new();
    for dept in &departments {
        let checked = if dept.is_active { " checked" } else { "" };
        let _ = write!(
            body,
            r#"<tr><td>{id}</td>
<td><input form="dept-{id}" name="department_name" value="{name}"></td>
<td><input form="dept-{id}" type="checkbox" name="is_active" value="1"{checked}></td>
<td><button form="dept-{id}" type="submit">Save</button></td>
</tr>
"#,
            id = dept.department_id,
            name = esc_attr(&dept.department_name),
        );
        let _ = write!(
            forms,
            r#"<form id="dept-{id}" method="post" action="/departments/edit/{id}"></form>"#,
            id = dept.department_id,
        );
    }
    body.push_str("</table>\n");
    body.push_str(&forms);

    let flashes = take_flashes(&session).await;
    Ok(render::page("Departments", &user, &flashes, &body).into_response())
}

/// POST /departments/edit/{dept_id} (admin)
pub async fn edit_department_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(dept_id): Path<i32>,
    Form(form): Form<EditDepartmentForm>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    require_admin(&user)?;

    let name = form.department_name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        push_flash(&session, "danger", "Department name required.").await;
        return Ok(Redirect::to("/departments").into_response());
    }

    let is_active = form.is_active.as_deref() == Some("1");

    let updated = state
        .store
        .update_department(dept_id, &name, is_active)
        .await?;
    if !updated {
        return Err(WebError::NotFound(format!(
            "Department {dept_id} not found."
        )));
    }

    Ok(Redirect::to("/departments").into_response())
}
