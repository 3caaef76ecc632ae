//! Build-once application cache.
//!
//! # Responsibilities
//! - Map canonical file paths to built applications
//! - Run at most one build per path, even under concurrent first access
//! - Keep failed builds out of the cache so the next request retries
//!
//! # Design Decisions
//! - `DashMap` of per-key `OnceCell`s: a build only blocks waiters for the
//!   same key, and shard locks are never held across an await
//! - Builds run in a spawned task so a requester that goes away does not
//!   cancel a build other requests (or later ones) will use
//! - No eviction: entries live as long as the cache

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::factory::ApplicationFactory;
use crate::application::SharedApplication;
use crate::error::BuildError;
use crate::observability::metrics;

type Slot = Arc<OnceCell<SharedApplication>>;

pub struct AppCache {
    entries: DashMap<PathBuf, Slot>,
    factory: Arc<dyn ApplicationFactory>,
}

impl AppCache {
    pub fn new(factory: Arc<dyn ApplicationFactory>) -> Self {
        Self {
            entries: DashMap::new(),
            factory,
        }
    }

    /// The built application for `file_path`, if any.
    pub fn get(&self, file_path: &Path) -> Option<SharedApplication> {
        self.entries
            .get(file_path)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Number of successfully built applications.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached application for `file_path`, building it first if
    /// needed.
    pub async fn get_or_build(
        &self,
        file_path: &Path,
        base_url: &str,
    ) -> Result<SharedApplication, BuildError> {
        if let Some(app) = self.get(file_path) {
            metrics::record_cache_hit();
            return Ok(app);
        }

        let slot: Slot = Arc::clone(&*self.entries.entry(file_path.to_path_buf()).or_default());
        let factory = Arc::clone(&self.factory);
        let path = file_path.to_path_buf();
        let base_url = base_url.to_string();

        let build = tokio::spawn(async move {
            let built = slot.get_or_try_init(|| async {
                let started = Instant::now();
                tracing::info!(file = %path.display(), base_url = %base_url, "Building application");
                let result = factory.build(&base_url, &path).await;
                metrics::record_build(result.is_ok(), started);
                if let Err(e) = &result {
                    tracing::warn!(file = %path.display(), error = %e, "Application build failed");
                }
                result
            })
            .await
            .cloned();
            built
        });

        let result = match build.await {
            Ok(result) => result,
            Err(e) => Err(BuildError::Aborted {
                path: file_path.to_path_buf(),
                message: e.to_string(),
            }),
        };
        if result.is_ok() {
            metrics::record_cached_applications(self.len());
        }
        result
    }
}
