//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting mounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DirectoryConfig, GatewayConfig, MountConfig};
use crate::routing::normalize_prefix;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("mount prefix {0:?} must start with '/'")]
    PrefixNotAbsolute(String),

    #[error("mount prefix {0:?} is defined more than once")]
    DuplicatePrefix(String),

    #[error("mount {0:?} must set exactly one of `file` or `upstream`")]
    MountTarget(String),

    #[error("mount {prefix:?} has an invalid upstream URL: {reason}")]
    UpstreamUrl { prefix: String, reason: String },

    #[error("directory base path {0:?} must start with '/' and not be the root")]
    BasePath(String),

    #[error("directory extension must not be empty")]
    EmptyExtension,
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    validate_mounts(&config.mounts, &mut errors);
    if let Some(directory) = &config.directory {
        validate_directory(directory, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mounts(mounts: &[MountConfig], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for mount in mounts {
        if !mount.prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(mount.prefix.clone()));
        }
        let normalized = normalize_prefix(&mount.prefix);
        if !seen.insert(normalized.clone()) {
            errors.push(ValidationError::DuplicatePrefix(normalized));
        }

        match (&mount.file, &mount.upstream) {
            (Some(_), None) => {}
            (None, Some(upstream)) => {
                if let Err(e) = url::Url::parse(upstream) {
                    errors.push(ValidationError::UpstreamUrl {
                        prefix: mount.prefix.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            _ => errors.push(ValidationError::MountTarget(mount.prefix.clone())),
        }
    }
}

fn validate_directory(directory: &DirectoryConfig, errors: &mut Vec<ValidationError>) {
    let base = &directory.base_path;
    if !base.starts_with('/') || normalize_prefix(base) == "/" {
        errors.push(ValidationError::BasePath(base.clone()));
    }
    if directory.extension.trim_start_matches('.').is_empty() {
        errors.push(ValidationError::EmptyExtension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file_mount(prefix: &str) -> MountConfig {
        MountConfig {
            prefix: prefix.to_string(),
            file: Some(PathBuf::from("a.py")),
            upstream: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not an address".into();
        config.timeouts.request_secs = 0;
        config.mounts = vec![
            file_mount("app1"),
            file_mount("/app2"),
            file_mount("/app2/"),
            MountConfig {
                prefix: "/both".into(),
                file: Some(PathBuf::from("b.py")),
                upstream: Some("http://127.0.0.1:1".into()),
            },
            MountConfig {
                prefix: "/bad".into(),
                file: None,
                upstream: Some("::not a url".into()),
            },
        ];
        config.directory = Some(DirectoryConfig {
            base_path: "/".into(),
            extension: ".".into(),
            ..DirectoryConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("not an address".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::PrefixNotAbsolute("app1".into())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/app2".into())));
        assert!(errors.contains(&ValidationError::MountTarget("/both".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UpstreamUrl { prefix, .. } if prefix == "/bad")));
        assert!(errors.contains(&ValidationError::BasePath("/".into())));
        assert!(errors.contains(&ValidationError::EmptyExtension));
        assert_eq!(errors.len(), 8);
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nope".into())])
        );
    }
}
