//! Application capability.
//!
//! # Data Flow
//! ```text
//! HTTP request  ──▶ Application::handle_request ──▶ Response
//! WS upgrade    ──▶ Application::handle_stream  ──▶ (session runs until closed)
//! ```
//!
//! # Design Decisions
//! - One closed trait for every backend: routers, gateways and leaf apps
//! - Both protocol shapes expose the same routing surface ([`Inbound`])
//! - The path a backend sees is relative to its own mount point; the
//!   stripped prefix travels in the [`MountPath`] extension

pub mod not_found;
pub mod source_file;
pub mod stream;
pub mod upstream;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Extensions, Request, Uri};
use axum::response::Response;

pub use not_found::NotFound;
pub use source_file::{SourceFileApp, SourceFileFactory};
pub use stream::{CloseReason, StreamMessage, StreamPeer, StreamSession};
pub use upstream::UpstreamApp;

/// A mounted backend.
#[async_trait]
pub trait Application: Send + Sync + 'static {
    /// Handle a single request/response exchange.
    async fn handle_request(&self, request: Request<Body>) -> Response;

    /// Take over an accepted full-duplex stream.
    ///
    /// The session is closed when this returns.
    async fn handle_stream(&self, session: StreamSession);
}

pub type SharedApplication = Arc<dyn Application>;

/// Routing surface shared by requests and stream sessions.
pub trait Inbound {
    fn uri(&self) -> &Uri;
    fn uri_mut(&mut self) -> &mut Uri;
    fn extensions_mut(&mut self) -> &mut Extensions;
}

impl Inbound for Request<Body> {
    fn uri(&self) -> &Uri {
        Request::uri(self)
    }

    fn uri_mut(&mut self) -> &mut Uri {
        Request::uri_mut(self)
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        Request::extensions_mut(self)
    }
}

/// The URL prefix that was stripped before the request reached its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPath(String);

impl MountPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a further stripped prefix.
    pub fn join(&self, prefix: &str) -> Self {
        let base = self.0.trim_end_matches('/');
        let prefix = prefix.trim_start_matches('/');
        Self(format!("{}/{}", base, prefix))
    }

    /// Record `prefix` as stripped on an inbound request or stream.
    pub fn push<I: Inbound>(inbound: &mut I, prefix: &str) {
        let extensions = inbound.extensions_mut();
        let next = match extensions.get::<MountPath>() {
            Some(existing) => existing.join(prefix),
            None => MountPath::new(prefix),
        };
        extensions.insert(next);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    /// Answers with its name and the path it was given.
    pub struct Tagged(pub &'static str);

    #[async_trait]
    impl Application for Tagged {
        async fn handle_request(&self, request: Request<Body>) -> Response {
            let path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default();
            let mount = request
                .extensions()
                .get::<MountPath>()
                .map(|m| m.as_str().to_string());

            let mut response = (StatusCode::OK, format!("{} {}", self.0, path)).into_response();
            if let Some(mount) = mount {
                if let Ok(value) = mount.parse() {
                    response.headers_mut().insert("x-mount-path", value);
                }
            }
            response
        }

        async fn handle_stream(&self, session: StreamSession) {
            let greeting = format!("{} {}", self.0, session.uri().path());
            session.send(StreamMessage::Text(greeting)).await;
        }
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
