//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router around the root application
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Detect WebSocket upgrades and hand them to the stream bridge
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts, State},
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::application::SharedApplication;
use crate::config::GatewayConfig;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::websocket::bridge;
use crate::lifecycle::shutdown;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub application: SharedApplication,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, application: SharedApplication) -> Self {
        let state = AppState { application };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let request_id = header::HeaderName::from_static(X_REQUEST_ID);
        Router::new().fallback(entry_handler).with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Single entry point: every path goes to the root application.
async fn entry_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    tracing::debug!(method = %method, uri = %request.uri(), "Dispatching request");

    let response = if is_websocket_upgrade(request.headers()) {
        upgrade(&state, request).await
    } else {
        state.application.handle_request(request).await
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

async fn upgrade(state: &AppState, request: Request<Body>) -> Response {
    let (mut parts, _body) = request.into_parts();
    let ws = match WebSocketUpgrade::from_request_parts(&mut parts, state).await {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let application = Arc::clone(&state.application);
    let uri = parts.uri;
    let headers = parts.headers;
    ws.on_upgrade(move |socket| bridge(socket, uri, headers, application))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{body_text, Tagged};
    use crate::application::{Application, StreamSession};
    use crate::routing::PrefixRouter;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    /// Never answers within the test's timeout.
    struct Stalled;

    #[async_trait]
    impl Application for Stalled {
        async fn handle_request(&self, _request: Request<Body>) -> Response {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK.into_response()
        }

        async fn handle_stream(&self, _session: StreamSession) {}
    }

    fn server() -> HttpServer {
        let router = PrefixRouter::builder()
            .mount("/app1", Arc::new(Tagged("app1")))
            .build();
        HttpServer::new(GatewayConfig::default(), Arc::new(router))
    }

    #[tokio::test]
    async fn test_requests_reach_root_application() {
        let res = server()
            .router()
            .oneshot(Request::builder().uri("/app1/health?x=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(X_REQUEST_ID));
        assert_eq!(body_text(res).await, "app1 /health?x=1");
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_kept() {
        let res = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/missing")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = GatewayConfig::default();
        config.limits.max_body_size = 4;
        let server = HttpServer::new(config, Arc::new(Tagged("app")));

        let res = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_LENGTH, "11")
                    .body(Body::from("hello world"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_slow_application_times_out() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 1;
        let server = HttpServer::new(config, Arc::new(Stalled));

        let res = server
            .router()
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(res.headers().contains_key(X_REQUEST_ID));
    }

    #[test]
    fn test_upgrade_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_websocket_upgrade(&headers));
        headers.insert(header::UPGRADE, "WebSocket".parse().unwrap());
        assert!(is_websocket_upgrade(&headers));
    }
}
