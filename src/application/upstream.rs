//! Application that forwards to an upstream HTTP server.
//!
//! # Responsibilities
//! - Rewrite the mount-relative request onto the upstream base URL
//! - Forward requests over a pooled client, streaming both bodies
//! - Bridge stream sessions to the upstream WebSocket endpoint
//!
//! # Design Decisions
//! - No retries: bodies are streamed, not buffered
//! - Upstream failures map to 502 (requests) or close 1011 (streams)
//! - The stripped mount prefix is passed on as `x-forwarded-prefix`

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use url::Url;

use super::stream::{CloseReason, StreamMessage, CLOSE_INTERNAL};
use super::{Application, MountPath, StreamSession};

pub const X_FORWARDED_PREFIX: &str = "x-forwarded-prefix";

pub struct UpstreamApp {
    base: Url,
    client: Client<HttpConnector, Body>,
}

impl UpstreamApp {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Map a mount-relative URI onto the upstream.
    fn target(&self, uri: &Uri, websocket: bool) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}{}", self.base.path().trim_end_matches('/'), uri.path());
        url.set_path(&path);
        url.set_query(uri.query());
        if websocket {
            let scheme = if self.base.scheme() == "https" { "wss" } else { "ws" };
            let _ = url.set_scheme(scheme);
        }
        url
    }
}

#[async_trait]
impl Application for UpstreamApp {
    async fn handle_request(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();
        let target = self.target(&parts.uri, false);

        parts.uri = match target.as_str().parse::<Uri>() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(target = %target, error = %e, "Invalid upstream URI");
                return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
            }
        };
        parts.version = Version::HTTP_11;
        parts.headers.remove(header::HOST);
        if let Some(mount) = parts.extensions.get::<MountPath>() {
            if let Ok(value) = HeaderValue::from_str(mount.as_str()) {
                parts.headers.insert(X_FORWARDED_PREFIX, value);
            }
        }

        tracing::debug!(target = %target, method = %parts.method, "Forwarding to upstream");

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(target = %target, error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }

    async fn handle_stream(&self, session: StreamSession) {
        let target = self.target(session.uri(), true);
        let upstream = match tokio_tungstenite::connect_async(target.as_str()).await {
            Ok((socket, _)) => socket,
            Err(e) => {
                tracing::error!(target = %target, error = %e, "Upstream stream connect failed");
                session
                    .close(Some(CloseReason::new(CLOSE_INTERNAL, "Upstream unavailable")))
                    .await;
                return;
            }
        };

        let (mut upstream_tx, mut upstream_rx) = upstream.split();
        let (mut incoming, outgoing) = session.into_split();

        let client_to_upstream = async {
            while let Some(message) = incoming.recv().await {
                let closing = matches!(message, StreamMessage::Close(_));
                if upstream_tx.send(to_upstream(message)).await.is_err() || closing {
                    break;
                }
            }
        };

        let upstream_to_client = async {
            while let Some(Ok(message)) = upstream_rx.next().await {
                let Some(message) = from_upstream(message) else {
                    continue;
                };
                let closing = matches!(message, StreamMessage::Close(_));
                if outgoing.send(message).await.is_err() || closing {
                    break;
                }
            }
        };

        tokio::select! {
            _ = client_to_upstream => {}
            _ = upstream_to_client => {}
        }
        tracing::debug!(target = %target, "Upstream stream finished");
    }
}

fn to_upstream(message: StreamMessage) -> WsMessage {
    match message {
        StreamMessage::Text(text) => WsMessage::Text(text.into()),
        StreamMessage::Binary(bytes) => WsMessage::Binary(bytes),
        StreamMessage::Close(reason) => WsMessage::Close(reason.map(|r| CloseFrame {
            code: CloseCode::from(r.code),
            reason: r.reason.into(),
        })),
    }
}

fn from_upstream(message: WsMessage) -> Option<StreamMessage> {
    match message {
        WsMessage::Text(text) => Some(StreamMessage::Text(text.as_str().to_owned())),
        WsMessage::Binary(bytes) => Some(StreamMessage::Binary(bytes)),
        WsMessage::Close(frame) => Some(StreamMessage::Close(
            frame.map(|f| CloseReason::new(u16::from(f.code), f.reason.as_str())),
        )),
        _ => None,
    }
}
