use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tower_sessions::Session;

use crate::db::{CostTargetQuery, StoreError};
use crate::domain::{SortField, SortOrder, detect_department};
use crate::entities::departments;

use super::auth::current_user;
use super::render::{self, esc, esc_attr, fmt_cost, fmt_ts, push_flash, take_flashes};
use super::{AppState, WebError};

#[derive(Deserialize)]
pub struct ListParams {
    pub prodnum_filter: Option<String>,
    pub buildcatnum_filter: Option<String>,
    pub dept_filter: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Deserialize)]
pub struct AddForm {
    pub prodnum: Option<String>,
    pub buildcatnum: Option<String>,
    pub target_cost: Option<String>,
    pub comments: Option<String>,
    pub department_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Deserialize)]
pub struct EditForm {
    pub target_cost: Option<String>,
    pub comments: Option<String>,
    pub department_id: Option<String>,
}

// ============================================================================
// Home / list
// ============================================================================

/// GET /
pub async fn list_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;

    let prod_filter = params.prodnum_filter.unwrap_or_default().trim().to_string();
    let cat_filter = params
        .buildcatnum_filter
        .unwrap_or_default()
        .trim()
        .to_string();
    let dept_filter = {
        let raw = params.dept_filter.unwrap_or_default().trim().to_string();
        if raw.is_empty() { "all".to_string() } else { raw }
    };
    let sort = SortField::parse(params.sort.as_deref().unwrap_or(""));
    let order = SortOrder::parse(params.order.as_deref().unwrap_or(""));

    let query = CostTargetQuery {
        prodnum_filter: Some(prod_filter.clone()),
        buildcat_filter: Some(cat_filter.clone()),
        // Anything that is not a department id means the `all` sentinel.
        department: dept_filter.parse::<i32>().ok(),
        sort,
        order,
    };

    let rows = state.store.list_cost_targets(&query).await?;
    let departments = state.store.list_departments().await?;

    let mut dept_options = String::from(r#"<option value="all">All departments</option>"#);
    for dept in &departments {
        let selected = if dept_filter == dept.department_id.to_string() {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            dept_options,
            r#"<option value="{}"{selected}>{}</option>"#,
            dept.department_id,
            esc(&dept.department_name)
        );
    }

    let mut body = format!(
        r#"<form method="get" action="/">
<label>Product <input name="prodnum_filter" value="{prod}" placeholder="e.g. 12*"></label>
<label>Category <input name="buildcatnum_filter" value="{cat}"></label>
<label>Department <select name="dept_filter">{dept_options}</select></label>
<input type="hidden" name="sort" value="{sort}">
<input type="hidden" name="order" value="{order}">
<button type="submit">Filter</button>
</form>
<table>
<tr>"#,
        prod = esc_attr(&prod_filter),
        cat = esc_attr(&cat_filter),
        sort = sort.as_str(),
        order = order.as_str(),
    );

    let columns = [
        (SortField::Prodnum, "Product"),
        (SortField::Buildcatnum, "Category"),
        (SortField::TargetCost, "Target Cost"),
        (SortField::Department, "Department"),
        (SortField::CreatedAt, "Created"),
        (SortField::UpdatedAt, "Updated"),
    ];
    for (field, label) in columns {
        let href = sort_href(field, sort, order, &prod_filter, &cat_filter, &dept_filter);
        let marker = if sort == field {
            match order {
                SortOrder::Asc => " \u{25b2}",
                SortOrder::Desc => " \u{25bc}",
            }
        } else {
            ""
        };
        let _ = write!(body, r#"<th><a href="{href}">{label}{marker}</a></th>"#);
    }
    body.push_str("<th>Comments</th><th>Updated By</th><th></th></tr>\n");

    for row in &rows {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/edit/{}\">Edit</a></td></tr>\n",
            row.prodnum,
            row.buildcatnum,
            fmt_cost(row.target_cost),
            esc(row.department_name.as_deref().unwrap_or("")),
            fmt_ts(&row.created_at),
            fmt_ts(&row.updated_at),
            esc(&row.comments),
            esc(&row.updated_by),
            row.id,
        );
    }
    body.push_str("</table>");

    let flashes = take_flashes(&session).await;
    Ok(render::page("Cost Targets", &user, &flashes, &body).into_response())
}

fn sort_href(
    field: SortField,
    current_sort: SortField,
    current_order: SortOrder,
    prod_filter: &str,
    cat_filter: &str,
    dept_filter: &str,
) -> String {
    // Clicking the active column toggles direction; a new column starts asc.
    let order = if field == current_sort {
        current_order.toggled()
    } else {
        SortOrder::Asc
    };
    format!(
        "/?prodnum_filter={}&buildcatnum_filter={}&dept_filter={}&sort={}&order={}",
        urlencoding::encode(prod_filter),
        urlencoding::encode(cat_filter),
        urlencoding::encode(dept_filter),
        field.as_str(),
        order.as_str(),
    )
}

// ============================================================================
// Add
// ============================================================================

/// GET /add
pub async fn add_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    let departments = state.store.list_departments().await?;

    let body = format!(
        r#"<form method="post" action="/add">
<p><label>Product number <input name="prodnum" required></label></p>
<p><label>Build category <input name="buildcatnum" required></label></p>
<p><label>Target cost <input name="target_cost" required></label></p>
<p><label>Comments <input name="comments" size="60"></label></p>
<p><label>Department <select name="department_id">
<option value="">Auto-detect from product number</option>
{}</select></label></p>
<button type="submit" name="action" value="add">Save</button>
<button type="submit" name="action" value="add_another">Save and add another</button>
</form>"#,
        department_options(&departments, None),
    );

    let flashes = take_flashes(&session).await;
    Ok(render::page("Add Cost Target", &user, &flashes, &body).into_response())
}

/// POST /add
pub async fn add_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddForm>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;

    let Some(prodnum) = parse_int(form.prodnum.as_deref()).filter(|n| *n > 0) else {
        push_flash(
            &session,
            "danger",
            "Product number must be a positive whole number.",
        )
        .await;
        return Ok(Redirect::to("/add").into_response());
    };

    let Some(buildcatnum) = parse_int(form.buildcatnum.as_deref()) else {
        push_flash(&session, "danger", "Build category must be a whole number.").await;
        return Ok(Redirect::to("/add").into_response());
    };

    let Some(target_cost) = parse_cost(form.target_cost.as_deref()) else {
        push_flash(&session, "danger", "Target cost must be a number.").await;
        return Ok(Redirect::to("/add").into_response());
    };

    let comments = form.comments.unwrap_or_default();

    let department_id = match parse_department(
        &state,
        form.department_id.as_deref(),
    )
    .await?
    {
        DepartmentChoice::Explicit(id) => Some(id),
        DepartmentChoice::Auto => detect_department(prodnum),
        DepartmentChoice::Unknown => {
            push_flash(&session, "danger", "Unknown department.").await;
            return Ok(Redirect::to("/add").into_response());
        }
    };

    match state
        .store
        .insert_cost_target(
            prodnum,
            buildcatnum,
            target_cost,
            &comments,
            department_id,
            &user.username,
        )
        .await
    {
        Ok(()) => {}
        Err(StoreError::Duplicate) => {
            push_flash(&session, "danger", StoreError::Duplicate.to_string()).await;
            return Ok(Redirect::to("/add").into_response());
        }
        Err(StoreError::Other(err)) => return Err(err.into()),
    }

    state
        .store
        .insert_log(
            prodnum,
            buildcatnum,
            None,
            target_cost,
            &user.username,
            &client_ip(&headers),
            &state.hostname,
        )
        .await?;

    if form.action.as_deref() == Some("add_another") {
        push_flash(&session, "success", "Cost Target added!").await;
        return Ok(Redirect::to("/add").into_response());
    }

    push_flash(&session, "success", "Cost Target added successfully!").await;
    Ok(Redirect::to("/").into_response())
}

// ============================================================================
// Edit
// ============================================================================

/// GET /edit/{record_id}
pub async fn edit_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(record_id): Path<i32>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;

    let record = state
        .store
        .get_cost_target(record_id)
        .await?
        .ok_or_else(|| WebError::NotFound("Record not found.".to_string()))?;

    let departments = state.store.list_departments().await?;

    let body = format!(
        r#"<p>Product <strong>{prodnum}</strong>, category <strong>{buildcatnum}</strong>
(created by {created_by} on {created_at})</p>
<form method="post" action="/edit/{id}">
<p><label>Target cost <input name="target_cost" value="{cost}" required></label></p>
<p><label>Comments <input name="comments" value="{comments}" size="60"></label></p>
<p><label>Department <select name="department_id">
{options}</select></label></p>
<button type="submit">Save</button>
</form>"#,
        prodnum = record.prodnum,
        buildcatnum = record.buildcatnum,
        created_by = esc(&record.created_by),
        created_at = fmt_ts(&record.created_at),
        id = record.id,
        cost = fmt_cost(record.target_cost),
        comments = esc_attr(&record.comments),
        options = department_options(&departments, record.department_id),
    );

    let flashes = take_flashes(&session).await;
    Ok(render::page("Edit Cost Target", &user, &flashes, &body).into_response())
}

/// POST /edit/{record_id}
pub async fn edit_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(record_id): Path<i32>,
    headers: HeaderMap,
    Form(form): Form<EditForm>,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;

    let record = state
        .store
        .get_cost_target(record_id)
        .await?
        .ok_or_else(|| WebError::NotFound("Record not found.".to_string()))?;

    let back = format!("/edit/{record_id}");

    let Some(target_cost) = parse_cost(form.target_cost.as_deref()) else {
        push_flash(&session, "danger", "Target cost must be a number.").await;
        return Ok(Redirect::to(&back).into_response());
    };

    let comments = form.comments.unwrap_or_default();

    let department_id = match parse_department(&state, form.department_id.as_deref()).await? {
        DepartmentChoice::Explicit(id) => Some(id),
        // The edit form always posts a department; treat a missing one as
        // keeping the current assignment.
        DepartmentChoice::Auto => record.department_id,
        DepartmentChoice::Unknown => {
            push_flash(&session, "danger", "Unknown department.").await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let updated = state
        .store
        .update_cost_target(
            record_id,
            target_cost,
            &comments,
            department_id,
            &user.username,
        )
        .await?;
    if !updated {
        return Err(WebError::NotFound("Record not found.".to_string()));
    }

    state
        .store
        .insert_log(
            record.prodnum,
            record.buildcatnum,
            Some(record.target_cost),
            target_cost,
            &user.username,
            &client_ip(&headers),
            &state.hostname,
        )
        .await?;

    Ok(Redirect::to("/").into_response())
}

// ============================================================================
// Form helpers
// ============================================================================

fn parse_int(value: Option<&str>) -> Option<i32> {
    value?.trim().parse().ok()
}

fn parse_cost(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|c| c.is_finite())
}

enum DepartmentChoice {
    Explicit(i32),
    Auto,
    Unknown,
}

/// An explicit department pick must reference an existing row; a missing or
/// blank pick falls back to auto-detection.
async fn parse_department(
    state: &AppState,
    value: Option<&str>,
) -> Result<DepartmentChoice, WebError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DepartmentChoice::Auto);
    };

    let Ok(id) = value.parse::<i32>() else {
        return Ok(DepartmentChoice::Unknown);
    };

    let departments = state.store.list_departments().await?;
    if departments.iter().any(|d| d.department_id == id) {
        Ok(DepartmentChoice::Explicit(id))
    } else {
        Ok(DepartmentChoice::Unknown)
    }
}

fn department_options(departments: &[departments::Model], selected: Option<i32>) -> String {
    let mut options = String::new();
    for dept in departments {
        let marker = if selected == Some(dept.department_id) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{}"{marker}>{} - {}</option>"#,
            dept.department_id,
            dept.department_id,
            esc(&dept.department_name)
        );
    }
    options
}

/// First hop of X-Forwarded-For when present; the app itself has no reliable
/// view of the peer address behind the proxy.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}
