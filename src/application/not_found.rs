use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use super::stream::{CloseReason, CLOSE_POLICY};
use super::{Application, StreamSession};

/// Fallback that answers everything with 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

#[async_trait]
impl Application for NotFound {
    async fn handle_request(&self, request: Request<Body>) -> Response {
        tracing::debug!(path = %request.uri().path(), "No application for request");
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }

    async fn handle_stream(&self, session: StreamSession) {
        tracing::debug!(path = %session.uri().path(), "No application for stream");
        session.close(Some(CloseReason::new(CLOSE_POLICY, "Not Found"))).await;
    }
}
