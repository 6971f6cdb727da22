use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use std::fmt;

use super::render;

/// Page-level failures. Validation and duplicate-key problems are not here:
/// those flash a message and redirect back to the form instead of producing
/// an error response.
#[derive(Debug)]
pub enum WebError {
    NotFound(String),

    Forbidden(String),

    Unauthenticated,

    Internal(anyhow::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::Unauthenticated => write!(f, "Not authenticated"),
            Self::Internal(err) => write!(f, "Internal error: {err}"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(msg) => render::error_response(StatusCode::NOT_FOUND, &msg),
            Self::Forbidden(msg) => render::error_response(StatusCode::FORBIDDEN, &msg),
            Self::Unauthenticated => Redirect::to("/login").into_response(),
            Self::Internal(err) => {
                tracing::error!("Internal error: {err:#}");
                render::error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred.",
                )
            }
        }
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl WebError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }
}
