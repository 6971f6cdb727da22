use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::fmt::Write as _;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{current_user, require_admin};
use super::render::{self, esc, fmt_cost, fmt_ts, take_flashes};
use super::{AppState, WebError};

/// GET /logs (admin) — the append-only change trail, newest first.
pub async fn logs_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&session).await?;
    require_admin(&user)?;

    let logs = state.store.list_logs().await?;

    let mut body = String::from(
        "<table>\n<tr><th>Changed At</th><th>Product</th><th>Category</th><th>Old Value</th>\
<th>New Value</th><th>Changed By</th><th>Source</th><th>Hostname</th><th>IP</th></tr>\n",
    );
    for entry in &logs {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            fmt_ts(&entry.changed_at),
            entry.prodnum,
            entry.buildcatnum,
            entry.old_value.map(fmt_cost).unwrap_or_default(),
            fmt_cost(entry.new_value),
            esc(&entry.changed_by),
            esc(&entry.source),
            esc(&entry.hostname),
            esc(&entry.ip_address),
        );
    }
    body.push_str("</table>");

    let flashes = take_flashes(&session).await;
    Ok(render::page("Change Log", &user, &flashes, &body).into_response())
}
