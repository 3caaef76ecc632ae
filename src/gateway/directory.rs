//! Directory-backed gateway.
//!
//! # Responsibilities
//! - Intercept paths under one base prefix; pass everything else through
//! - Route sub-paths of already-built applications to them
//! - Discover a source file for new leaves, redirect leaves lacking `/`
//! - Build applications lazily through the cache and forward to them
//!
//! # Design Decisions
//! - Requests and streams share [`DynamicDirectoryGateway::route`]; only the
//!   final hand-off differs
//! - Misses always defer to the fallback application
//! - Discovery sees percent-decoded segments; mount paths and redirect
//!   targets keep the raw URL form
//! - A sub-route (`leaf/assets/...`) only resolves once `leaf/` has been
//!   requested and its application built

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Uri};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use super::cache::AppCache;
use super::discovery::Discovery;
use super::factory::ApplicationFactory;
use crate::application::stream::{CloseReason, CLOSE_INTERNAL, CLOSE_POLICY};
use crate::application::{Application, MountPath, SharedApplication, StreamSession};
use crate::error::{BuildError, GatewayError};
use crate::http::response::{temporary_redirect, trailing_slash_location};
use crate::observability::metrics;
use crate::routing::{Forward, PathPrefixMatcher};

/// Outcome of routing one request path.
enum Route {
    Fallback,
    Redirect(String),
    Forward(Forward),
}

pub struct DynamicDirectoryGateway {
    fallback: SharedApplication,
    base: PathPrefixMatcher,
    discovery: Discovery,
    cache: AppCache,
    /// URL subpath → built application, for routing sub-paths.
    mounted: DashMap<String, SharedApplication>,
}

impl DynamicDirectoryGateway {
    pub fn new(
        fallback: SharedApplication,
        base_prefix: &str,
        root_directory: impl Into<PathBuf>,
        factory: impl ApplicationFactory,
    ) -> Self {
        Self {
            fallback,
            base: PathPrefixMatcher::new(base_prefix),
            discovery: Discovery::new(root_directory),
            cache: AppCache::new(Arc::new(factory)),
            mounted: DashMap::new(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.discovery = self.discovery.with_extension(extension);
        self
    }

    pub fn with_hidden_prefix(mut self, prefix: &str) -> Self {
        self.discovery = self.discovery.with_hidden_prefix(prefix);
        self
    }

    pub fn base_prefix(&self) -> &str {
        self.base.prefix()
    }

    pub fn root_directory(&self) -> &Path {
        self.discovery.root()
    }

    /// The application built for `file_path`, if any.
    pub fn cached(&self, file_path: &Path) -> Option<SharedApplication> {
        self.cache.get(file_path)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn mount_path(&self, subpath: &str) -> String {
        format!("{}/{}", self.base.prefix().trim_end_matches('/'), subpath)
    }

    /// Longest already-built subpath that owns `relative`.
    fn built_owner(&self, relative: &str) -> Option<Forward> {
        relative.rmatch_indices('/').find_map(|(i, _)| {
            let subpath = &relative[..i];
            self.mounted.get(subpath).map(|app| Forward {
                application: app.value().clone(),
                mount_path: self.mount_path(subpath),
                path: relative[i..].to_string(),
            })
        })
    }

    /// `outer` is the prefix already stripped by enclosing routers; redirects
    /// put it back so the client lands on the same mount.
    async fn route(&self, uri: &Uri, outer: Option<&MountPath>) -> Result<Route, BuildError> {
        let Some(rest) = self.base.strip(uri.path()) else {
            return Ok(Route::Fallback);
        };
        let relative = rest.strip_prefix('/').unwrap_or(rest);
        if relative.is_empty() {
            return Ok(Route::Fallback);
        }

        if let Some(forward) = self.built_owner(relative) {
            metrics::record_cache_hit();
            return Ok(Route::Forward(forward));
        }

        let (leaf, has_trailing_slash) = match relative.strip_suffix('/') {
            Some(leaf) => (leaf, true),
            None => (relative, false),
        };
        let Some(found) = self.discovery.resolve(leaf).await else {
            return Ok(Route::Fallback);
        };
        if !has_trailing_slash {
            return Ok(Route::Redirect(redirect_location(uri, outer)));
        }

        let mount_path = self.mount_path(&found.relative_url_subpath);
        let application = self.cache.get_or_build(&found.file_path, &mount_path).await?;
        self.mounted
            .insert(found.relative_url_subpath, application.clone());

        Ok(Route::Forward(Forward {
            application,
            mount_path,
            path: "/".to_string(),
        }))
    }
}

#[async_trait]
impl Application for DynamicDirectoryGateway {
    async fn handle_request(&self, mut request: Request<Body>) -> Response {
        let outer = request.extensions().get::<MountPath>().cloned();
        match self.route(request.uri(), outer.as_ref()).await {
            Ok(Route::Fallback) => {
                metrics::record_discovery("passthrough");
                self.fallback.handle_request(request).await
            }
            Ok(Route::Redirect(location)) => {
                metrics::record_discovery("redirect");
                tracing::debug!(location = %location, "Redirecting to trailing slash");
                temporary_redirect(&location)
            }
            Ok(Route::Forward(forward)) => {
                metrics::record_discovery("forward");
                if let Err(e) = forward.prepare(&mut request) {
                    return e.into_response();
                }
                forward.application.handle_request(request).await
            }
            Err(e) => {
                metrics::record_discovery("build_error");
                GatewayError::from(e).into_response()
            }
        }
    }

    async fn handle_stream(&self, mut session: StreamSession) {
        let outer = session.extensions().get::<MountPath>().cloned();
        match self.route(session.uri(), outer.as_ref()).await {
            Ok(Route::Fallback) => {
                metrics::record_discovery("passthrough");
                self.fallback.handle_stream(session).await
            }
            Ok(Route::Redirect(location)) => {
                metrics::record_discovery("redirect");
                tracing::debug!(location = %location, "Stream opened without trailing slash");
                session
                    .close(Some(CloseReason::new(CLOSE_POLICY, "Trailing slash required")))
                    .await;
            }
            Ok(Route::Forward(forward)) => {
                metrics::record_discovery("forward");
                if let Err(e) = forward.prepare(&mut session) {
                    tracing::error!(error = %e, "Failed to rewrite stream path");
                    session
                        .close(Some(CloseReason::new(CLOSE_INTERNAL, "Failed to route stream")))
                        .await;
                    return;
                }
                forward.application.handle_stream(session).await
            }
            Err(e) => {
                metrics::record_discovery("build_error");
                tracing::error!(error = %e, "Failed to build application for stream");
                session
                    .close(Some(CloseReason::new(CLOSE_INTERNAL, "Failed to build application")))
                    .await;
            }
        }
    }
}

fn redirect_location(uri: &Uri, outer: Option<&MountPath>) -> String {
    let location = trailing_slash_location(uri);
    match outer {
        Some(mount) => format!("{}{}", mount.as_str().trim_end_matches('/'), location),
        None => location,
    }
}
