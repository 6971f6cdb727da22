use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_sessions::Session;

use super::auth::SessionUser;

const FLASH_KEY: &str = "flash";

/// One flash message, rendered once on the next page and then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub level: String,
    pub message: String,
}

pub async fn push_flash(session: &Session, level: &str, message: impl Into<String>) {
    let mut flashes: Vec<Flash> = session
        .get(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    flashes.push(Flash {
        level: level.to_string(),
        message: message.into(),
    });
    let _ = session.insert(FLASH_KEY, &flashes).await;
}

pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[must_use]
pub fn esc(s: &str) -> Cow<'_, str> {
    html_escape::encode_text(s)
}

#[must_use]
pub fn esc_attr(s: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(s)
}

/// Timestamps are stored as RFC 3339; pages show them as
/// `YYYY-MM-DD HH:MM:SS`. Unparseable values pass through untouched.
#[must_use]
pub fn fmt_ts(value: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(value).map_or_else(
        |_| value.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

#[must_use]
pub fn fmt_ts_opt(value: Option<&String>) -> String {
    value.map(|v| fmt_ts(v)).unwrap_or_default()
}

#[must_use]
pub fn fmt_cost(value: f64) -> String {
    format!("{value:.2}")
}

/// Shared page shell: nav bar (admin links only for admins), flash banners,
/// then the page body.
#[must_use]
pub fn layout(title: &str, user: Option<&SessionUser>, flashes: &[Flash], body: &str) -> String {
    let nav = user.map_or_else(String::new, |user| {
        let admin_links = if user.role.is_admin() {
            r#" <a href="/logs">Logs</a> <a href="/users">Users</a> <a href="/departments">Departments</a>"#
        } else {
            ""
        };
        format!(
            r#"<nav><a href="/">Home</a> <a href="/add">Add</a>{admin_links} <span class="who">{} (<a href="/logout">Log out</a>)</span></nav>"#,
            esc(&user.displayname)
        )
    });

    let mut banners = String::new();
    for flash in flashes {
        banners.push_str(&format!(
            r#"<p class="flash flash-{}">{}</p>"#,
            esc_attr(&flash.level),
            esc(&flash.message)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Cost Targets</title>
<style>
body {{ font-family: sans-serif; margin: 1.5em; }}
nav a {{ margin-right: 0.5em; }}
nav .who {{ float: right; }}
table {{ border-collapse: collapse; margin-top: 1em; }}
th, td {{ border: 1px solid #ccc; padding: 0.3em 0.6em; text-align: left; }}
th a {{ text-decoration: none; }}
.flash-danger {{ color: #a00; }}
.flash-success {{ color: #070; }}
.flash-info {{ color: #036; }}
</style>
</head>
<body>
{nav}
{banners}
<h1>{heading}</h1>
{body}
</body>
</html>
"#,
        title = esc(title),
        heading = esc(title),
    )
}

#[must_use]
pub fn page(title: &str, user: &SessionUser, flashes: &[Flash], body: &str) -> Html<String> {
    Html(layout(title, Some(user), flashes, body))
}

/// Standalone error page, usable before any session exists.
#[must_use]
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = format!("<p>{}</p>", esc(message));
    (status, Html(layout("Error", None, &[], &body))).into_response()
}
