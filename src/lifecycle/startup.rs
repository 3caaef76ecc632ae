//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated [`GatewayConfig`] into the root application
//! - Load statically mounted files and upstreams
//! - Wrap the result in a directory gateway when configured
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Mounts load in config order; the router's ordering does not depend on it

use std::sync::Arc;

use thiserror::Error;

use crate::application::{NotFound, SharedApplication, SourceFileApp, SourceFileFactory, UpstreamApp};
use crate::config::{GatewayConfig, MountConfig};
use crate::error::BuildError;
use crate::gateway::DynamicDirectoryGateway;
use crate::routing::{normalize_prefix, PrefixRouter};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("mount {prefix:?} has an invalid upstream URL: {source}")]
    Upstream {
        prefix: String,
        #[source]
        source: url::ParseError,
    },

    #[error("mount {0:?} has no target")]
    MissingTarget(String),
}

/// Build the root application described by `config`.
pub async fn build_application(config: &GatewayConfig) -> Result<SharedApplication, StartupError> {
    let mut app: SharedApplication = if config.mounts.is_empty() {
        Arc::new(NotFound)
    } else {
        let mut builder = PrefixRouter::builder();
        for mount in &config.mounts {
            builder = builder.mount(&mount.prefix, load_mount(mount).await?);
        }
        Arc::new(builder.build())
    };

    if let Some(directory) = &config.directory {
        tracing::info!(
            base_path = %directory.base_path,
            root = %directory.root.display(),
            extension = %directory.extension,
            "Directory discovery enabled"
        );
        let gateway = DynamicDirectoryGateway::new(
            app,
            &directory.base_path,
            &directory.root,
            SourceFileFactory,
        )
        .with_extension(&directory.extension)
        .with_hidden_prefix(&directory.hidden_prefix);
        app = Arc::new(gateway);
    }

    Ok(app)
}

async fn load_mount(mount: &MountConfig) -> Result<SharedApplication, StartupError> {
    let app: SharedApplication = match (&mount.file, &mount.upstream) {
        (Some(file), _) => {
            let base_url = normalize_prefix(&mount.prefix);
            Arc::new(SourceFileApp::load(&base_url, file).await?)
        }
        (None, Some(upstream)) => {
            Arc::new(UpstreamApp::new(upstream).map_err(|source| StartupError::Upstream {
                prefix: mount.prefix.clone(),
                source,
            })?)
        }
        (None, None) => return Err(StartupError::MissingTarget(mount.prefix.clone())),
    };

    tracing::info!(prefix = %mount.prefix, "Mounted application");
    Ok(app)
}
