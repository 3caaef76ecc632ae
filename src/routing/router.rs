//! Mount lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled mounts
//! - Look up the mount for a request path
//! - Return the matched mount or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan over mounts sorted longest-first (root last)
//! - Duplicate prefixes in the builder: last write wins
//! - Explicit NotFound rather than silent default

use std::cmp::Reverse;
use std::fmt;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::matcher::PathPrefixMatcher;
use super::Forward;
use crate::application::stream::{CloseReason, CLOSE_INTERNAL, CLOSE_POLICY};
use crate::application::{Application, SharedApplication, StreamSession};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no mount matches {0}")]
    NotFound(String),
}

/// A prefix bound to an application.
#[derive(Clone)]
pub struct Mount {
    matcher: PathPrefixMatcher,
    application: SharedApplication,
}

impl Mount {
    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn application(&self) -> &SharedApplication {
        &self.application
    }

    pub fn is_root(&self) -> bool {
        self.matcher.is_root()
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount").field("prefix", &self.prefix()).finish()
    }
}

#[derive(Default)]
pub struct PrefixRouterBuilder {
    mounts: Vec<Mount>,
}

impl PrefixRouterBuilder {
    /// Mount `application` under `prefix`.
    ///
    /// Prefixes are normalized before comparison, so `/app` and `/app/` name
    /// the same mount; mounting an existing prefix replaces its application.
    pub fn mount(mut self, prefix: &str, application: SharedApplication) -> Self {
        let matcher = PathPrefixMatcher::new(prefix);
        match self.mounts.iter_mut().find(|m| m.matcher == matcher) {
            Some(existing) => {
                tracing::warn!(prefix = %matcher.prefix(), "Replacing existing mount");
                existing.application = application;
            }
            None => self.mounts.push(Mount {
                matcher,
                application,
            }),
        }
        self
    }

    pub fn build(mut self) -> PrefixRouter {
        self.mounts
            .sort_by_key(|m| (m.is_root(), Reverse(m.prefix().len())));
        tracing::debug!(
            mounts = ?self.mounts.iter().map(Mount::prefix).collect::<Vec<_>>(),
            "Prefix router compiled"
        );
        PrefixRouter {
            mounts: self.mounts,
        }
    }
}

/// Dispatches to a fixed set of mounts by longest path prefix.
#[derive(Debug)]
pub struct PrefixRouter {
    mounts: Vec<Mount>,
}

impl PrefixRouter {
    pub fn builder() -> PrefixRouterBuilder {
        PrefixRouterBuilder::default()
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Find the mount responsible for `path`.
    pub fn dispatch(&self, path: &str) -> Result<&Mount, RouteError> {
        self.mounts
            .iter()
            .find(|m| m.matcher.matches(path))
            .ok_or_else(|| RouteError::NotFound(path.to_string()))
    }

    fn forward(&self, path: &str) -> Result<Forward, RouteError> {
        let mount = self.dispatch(path)?;
        let backend_path = mount
            .matcher
            .backend_path(path)
            .ok_or_else(|| RouteError::NotFound(path.to_string()))?;
        Ok(Forward {
            application: mount.application.clone(),
            mount_path: mount.prefix().to_string(),
            path: backend_path,
        })
    }
}

#[async_trait]
impl Application for PrefixRouter {
    async fn handle_request(&self, mut request: Request<Body>) -> Response {
        let forward = match self.forward(request.uri().path()) {
            Ok(forward) => forward,
            Err(e) => {
                tracing::debug!(error = %e, "No mount matched");
                return (StatusCode::NOT_FOUND, "Not Found").into_response();
            }
        };
        if let Err(e) = forward.prepare(&mut request) {
            return e.into_response();
        }
        forward.application.handle_request(request).await
    }

    async fn handle_stream(&self, mut session: StreamSession) {
        let forward = match self.forward(session.uri().path()) {
            Ok(forward) => forward,
            Err(e) => {
                tracing::debug!(error = %e, "No mount matched stream");
                session
                    .close(Some(CloseReason::new(CLOSE_POLICY, "Not Found")))
                    .await;
                return;
            }
        };
        if let Err(e) = forward.prepare(&mut session) {
            tracing::error!(error = %e, "Failed to rewrite stream path");
            session
                .close(Some(CloseReason::new(CLOSE_INTERNAL, "Failed to route stream")))
                .await;
            return;
        }
        forward.application.handle_stream(session).await
    }
}
