//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gateway::{DEFAULT_EXTENSION, DEFAULT_HIDDEN_PREFIX};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Statically mounted applications.
    pub mounts: Vec<MountConfig>,

    /// Directory discovery settings. Disabled when absent.
    pub directory: Option<DirectoryConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// A statically mounted application. Exactly one target must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MountConfig {
    /// Path prefix, e.g. "/app1".
    pub prefix: String,

    /// Serve a single source file.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Forward to an upstream HTTP server.
    #[serde(default)]
    pub upstream: Option<String>,
}

/// Per-file applications discovered under a directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// URL prefix the directory is exposed under.
    pub base_path: String,

    /// Directory to search.
    pub root: PathBuf,

    /// Recognized source file extension.
    pub extension: String,

    /// File names starting with this are never served.
    pub hidden_prefix: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_path: "/apps".to_string(),
            root: PathBuf::from("./apps"),
            extension: DEFAULT_EXTENSION.to_string(),
            hidden_prefix: DEFAULT_HIDDEN_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level, overridden by `RUST_LOG`.
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.mounts.is_empty());
        assert!(config.directory.is_none());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_full_document() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[mounts]]
            prefix = "/app1"
            file = "notebooks/app1.py"

            [[mounts]]
            prefix = "/api"
            upstream = "http://127.0.0.1:3000"

            [directory]
            root = "/srv/apps"
            "#,
        )
        .unwrap();

        assert_eq!(config.mounts.len(), 2);
        assert_eq!(config.mounts[0].file.as_deref(), Some(std::path::Path::new("notebooks/app1.py")));
        assert_eq!(config.mounts[1].upstream.as_deref(), Some("http://127.0.0.1:3000"));

        let directory = config.directory.unwrap();
        assert_eq!(directory.base_path, "/apps");
        assert_eq!(directory.root, PathBuf::from("/srv/apps"));
        assert_eq!(directory.extension, ".py");
        assert_eq!(directory.hidden_prefix, "_");
    }
}
