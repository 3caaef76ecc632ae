//! Path prefix matching.
//!
//! # Responsibilities
//! - Normalize mount prefixes (leading `/`, no trailing `/` except root)
//! - Match request paths on path-segment boundaries
//! - Strip a matched prefix to produce the mount-relative remainder
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/app` matches `/app` and `/app/...`, never `/apple`
//! - Root (`/`) matches every path
//! - No regex to guarantee O(n) matching

/// Canonical form of a mount prefix.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Matches the request path against a segment-aligned prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. The prefix is normalized first.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_root(&self) -> bool {
        self.prefix == "/"
    }

    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// The part of `path` after the prefix: empty or starting with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.is_root() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// The path a backend mounted at this prefix sees for `path`.
    pub fn backend_path(&self, path: &str) -> Option<String> {
        self.strip(path).map(|rest| {
            if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            }
        })
    }
}
