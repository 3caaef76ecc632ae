//! Error types surfaced by the gateway.
//!
//! Resolution failures (no prefix match, missing or hidden file) are not
//! errors: they become a passthrough to the fallback application. Only
//! application build failures and path rewrite failures reach the caller.

use std::path::{Path, PathBuf};

use axum::http::uri::InvalidUriParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure to construct an application for a discovered file.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("failed to build application for {}: {message}", path.display())]
    Factory { path: PathBuf, message: String },

    #[error("application build for {} did not complete: {message}", path.display())]
    Aborted { path: PathBuf, message: String },
}

impl BuildError {
    pub fn factory(path: &Path, err: impl std::fmt::Display) -> Self {
        BuildError::Factory {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("invalid rewritten URI: {0}")]
    Rewrite(#[from] InvalidUriParts),

    #[error("invalid rewritten path: {0}")]
    RewritePath(#[from] axum::http::uri::InvalidUri),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Gateway error");
        let body = match self {
            GatewayError::Build(_) => "Failed to build application",
            GatewayError::Rewrite(_) | GatewayError::RewritePath(_) => "Failed to route request",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
