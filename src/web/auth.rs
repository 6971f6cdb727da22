use axum::{
    Form,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use crate::config::AuthMode;
use crate::domain::Role;

use super::render::{push_flash, take_flashes};
use super::{AppState, WebError, render};

pub const SESSION_USER_KEY: &str = "user";

/// The verified identity for one session: written only by the resolver
/// below, read by handler access checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub displayname: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gate on every page except /login and /logout. Manual mode requires an
/// established session and redirects to the login form otherwise. Forwarded
/// mode resolves the proxy-supplied identity header on every request,
/// lazily provisioning the user and stamping the login time the first time
/// a session sees that identity.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    match state.config.auth.mode {
        AuthMode::Manual => match session.get::<SessionUser>(SESSION_USER_KEY).await {
            Ok(Some(_)) => next.run(request).await,
            Ok(None) => Redirect::to("/login").into_response(),
            Err(err) => WebError::internal(format!("Session error: {err}")).into_response(),
        },
        AuthMode::Forwarded => {
            let raw = request
                .headers()
                .get(state.config.auth.forwarded_header.as_str())
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let Some(raw) = raw else {
                return missing_identity_response(&state.config.auth.forwarded_header);
            };

            let username = normalize_identity(&raw);
            if username.is_empty() {
                return (
                    StatusCode::UNAUTHORIZED,
                    "Forwarded identity header is present but empty.",
                )
                    .into_response();
            }

            // Session already bound to this identity: skip the lookup.
            if let Ok(Some(user)) = session.get::<SessionUser>(SESSION_USER_KEY).await
                && user.username == username
            {
                return next.run(request).await;
            }

            match establish_session(&state, &session, &username).await {
                Ok(None) => next.run(request).await,
                Ok(Some(denied)) => denied,
                Err(err) => WebError::Internal(err).into_response(),
            }
        }
    }
}

/// Strip the domain part from `DOMAIN\user` or `user@domain` and lower-case
/// the remainder.
#[must_use]
pub fn normalize_identity(raw: &str) -> String {
    let raw = raw.trim();
    let user = raw.rsplit('\\').next().unwrap_or(raw);
    let user = user.split('@').next().unwrap_or(user);
    user.trim().to_lowercase()
}

/// Fetch-or-create the user, reject inactive accounts, stamp the login and
/// write the session. Returns a denial response for inactive accounts.
async fn establish_session(
    state: &AppState,
    session: &Session,
    username: &str,
) -> anyhow::Result<Option<Response>> {
    let user = state.store.get_or_create_user(username, username).await?;

    if !user.is_active {
        return Ok(Some(render::error_response(
            StatusCode::FORBIDDEN,
            "Your account is inactive.",
        )));
    }

    state.store.update_last_login(&user.username).await?;

    let session_user = SessionUser {
        username: user.username,
        displayname: user.displayname,
        role: Role::parse(&user.role).unwrap_or(Role::User),
    };
    session
        .insert(SESSION_USER_KEY, &session_user)
        .await
        .map_err(|err| anyhow::anyhow!("Failed to write session: {err}"))?;

    tracing::info!("User {} logged in", session_user.username);

    Ok(None)
}

fn missing_identity_response(header: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        format!(
            "No authenticated identity was forwarded by the proxy (expected the {header} header)."
        ),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Response {
    match state.config.auth.mode {
        AuthMode::Manual => {
            let flashes = take_flashes(&session).await;
            let body = r#"<form method="post" action="/login">
<label>Username <input name="username" autofocus></label>
<button type="submit">Log in</button>
</form>"#;
            axum::response::Html(render::layout("Log in", None, &flashes, body)).into_response()
        }
        AuthMode::Forwarded => {
            if headers.contains_key(state.config.auth.forwarded_header.as_str()) {
                Redirect::to("/").into_response()
            } else {
                missing_identity_response(&state.config.auth.forwarded_header)
            }
        }
    }
}

/// POST /login — manual mode only; a free-text username, no password.
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if state.config.auth.mode == AuthMode::Forwarded {
        return Ok(Redirect::to("/login").into_response());
    }

    let username = form.username.unwrap_or_default().trim().to_lowercase();

    if username.is_empty() {
        push_flash(&session, "danger", "Username required.").await;
        return Ok(Redirect::to("/login").into_response());
    }

    let user = state.store.get_or_create_user(&username, &username).await?;

    if !user.is_active {
        return Ok(render::error_response(
            StatusCode::FORBIDDEN,
            "Your account is inactive.",
        ));
    }

    state.store.update_last_login(&user.username).await?;

    let session_user = SessionUser {
        username: user.username,
        displayname: user.displayname,
        role: Role::parse(&user.role).unwrap_or(Role::User),
    };
    session
        .insert(SESSION_USER_KEY, &session_user)
        .await
        .map_err(|err| WebError::internal(format!("Failed to write session: {err}")))?;

    tracing::info!("User {} logged in", session_user.username);

    Ok(Redirect::to("/").into_response())
}

/// GET /logout
pub async fn logout(session: Session) -> Response {
    let _ = session.flush().await;
    push_flash(&session, "info", "Logged out.").await;
    Redirect::to("/login").into_response()
}

// ============================================================================
// Helpers for handlers
// ============================================================================

/// The session identity, or an unauthenticated error. The middleware makes
/// this infallible on protected routes; this is the explicit context object
/// handlers thread through their calls.
pub async fn current_user(session: &Session) -> Result<SessionUser, WebError> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(|err| WebError::internal(format!("Session error: {err}")))?
        .ok_or(WebError::Unauthenticated)
}

pub fn require_admin(user: &SessionUser) -> Result<(), WebError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(WebError::Forbidden("Admin access required.".to_string()))
    }
}
