//! Built-in application serving a single discovered source file.
//!
//! Routes (relative to the application's mount point):
//! - `GET /`       file contents as plain text
//! - `GET /health` liveness JSON
//! - stream `/ws`  greeting followed by an echo loop

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::stream::{CloseReason, StreamMessage, CLOSE_POLICY};
use super::{Application, MountPath, SharedApplication, StreamSession};
use crate::error::BuildError;
use crate::gateway::ApplicationFactory;

pub const X_MOUNT_PATH: &str = "x-mount-path";

#[derive(Debug)]
pub struct SourceFileApp {
    path: PathBuf,
    stem: String,
    base_url: String,
    contents: String,
}

impl SourceFileApp {
    /// Load `path` and build an application for it.
    pub async fn load(base_url: &str, path: &Path) -> Result<Self, BuildError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BuildError::factory(path, e))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            stem,
            base_url: base_url.to_string(),
            contents,
        })
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn echo(&self, mut session: StreamSession) {
        if !session
            .send(StreamMessage::Text(format!("connected to {}", self.stem)))
            .await
        {
            return;
        }

        while let Some(message) = session.recv().await {
            match message {
                StreamMessage::Close(_) => break,
                other => {
                    if !session.send(other).await {
                        return;
                    }
                }
            }
        }
        session.close(None).await;
    }
}

#[async_trait]
impl Application for SourceFileApp {
    async fn handle_request(&self, request: Request<Body>) -> Response {
        let mount_path = request
            .extensions()
            .get::<MountPath>()
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.base_url.clone());

        if request.method() != Method::GET && request.method() != Method::HEAD {
            return StatusCode::METHOD_NOT_ALLOWED.into_response();
        }

        match request.uri().path() {
            "/" => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (header::HeaderName::from_static(X_MOUNT_PATH), mount_path),
                ],
                self.contents.clone(),
            )
                .into_response(),
            "/health" => Json(json!({ "status": "healthy", "app": self.stem })).into_response(),
            _ => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        }
    }

    async fn handle_stream(&self, session: StreamSession) {
        if session.uri().path() == "/ws" {
            self.echo(session).await;
        } else {
            session
                .close(Some(CloseReason::new(CLOSE_POLICY, "Not Found")))
                .await;
        }
    }
}

/// Builds a [`SourceFileApp`] per discovered file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceFileFactory;

#[async_trait]
impl ApplicationFactory for SourceFileFactory {
    async fn build(&self, base_url: &str, file_path: &Path) -> Result<SharedApplication, BuildError> {
        let app: SharedApplication = Arc::new(SourceFileApp::load(base_url, file_path).await?);
        tracing::info!(file = %file_path.display(), base_url, "Loaded source file application");
        Ok(app)
    }
}
