use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::db::Store;

pub mod auth;
mod cost_targets;
mod departments;
mod error;
mod logs;
mod render;
mod users;

pub use error::WebError;

pub struct AppState {
    pub config: Config,
    pub store: Store,

    /// Server host name recorded in audit rows, resolved once at startup.
    pub hostname: String,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());

    Ok(Arc::new(AppState {
        config,
        store,
        hostname,
    }))
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.server.session_minutes,
        )));

    let protected = Router::new()
        .route("/", get(cost_targets::list_page))
        .route(
            "/add",
            get(cost_targets::add_page).post(cost_targets::add_submit),
        )
        .route(
            "/edit/{record_id}",
            get(cost_targets::edit_page).post(cost_targets::edit_submit),
        )
        .route("/logs", get(logs::logs_page))
        .route("/users", get(users::users_page))
        .route(
            "/users/edit/{username}",
            get(users::edit_user_page).post(users::edit_user_submit),
        )
        .route("/departments", get(departments::departments_page))
        .route(
            "/departments/edit/{dept_id}",
            post(departments::edit_department_submit),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ));

    Router::new()
        .merge(protected)
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
