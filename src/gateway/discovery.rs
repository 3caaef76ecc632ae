//! Mapping URL subpaths to source files.
//!
//! # Responsibilities
//! - Percent-decode and validate a URL subpath (`dir/sub/leaf`) and build
//!   the candidate path
//! - Reject hidden leaves, `.`/`..`/empty segments, and escapes from the root
//! - Confirm the candidate is a regular file and canonicalize it
//!
//! # Design Decisions
//! - One `metadata` + one `canonicalize` per lookup, nothing cached
//! - Only the leaf is checked against the hidden prefix
//! - Any I/O error is a miss, never an error

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

pub const DEFAULT_EXTENSION: &str = ".py";
pub const DEFAULT_HIDDEN_PREFIX: &str = "_";

/// A file resolved for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// URL subpath relative to the gateway base, e.g. `nested/leaf`.
    pub relative_url_subpath: String,
    /// Canonical absolute path; the cache key.
    pub file_path: PathBuf,
    /// File name without extension.
    pub stem: String,
}

#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    extension: String,
    hidden_prefix: String,
}

impl Discovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            hidden_prefix: DEFAULT_HIDDEN_PREFIX.to_string(),
        }
    }

    /// Recognized source extension, with or without the leading dot.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };
        self
    }

    pub fn with_hidden_prefix(mut self, prefix: &str) -> Self {
        self.hidden_prefix = prefix.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether a bare file name is eligible for discovery.
    pub fn is_eligible(&self, file_name: &str) -> bool {
        match file_name.strip_suffix(self.extension.as_str()) {
            Some(stem) => !stem.is_empty() && !self.is_hidden(stem),
            None => false,
        }
    }

    fn is_hidden(&self, leaf: &str) -> bool {
        !self.hidden_prefix.is_empty() && leaf.starts_with(self.hidden_prefix.as_str())
    }

    /// Candidate file for the URL-encoded `subpath`, without touching the
    /// filesystem.
    pub fn candidate(&self, subpath: &str) -> Option<PathBuf> {
        self.locate(subpath).map(|(path, _)| path)
    }

    /// Candidate path and decoded leaf name.
    fn locate(&self, subpath: &str) -> Option<(PathBuf, String)> {
        let segments = subpath
            .split('/')
            .map(decode_segment)
            .collect::<Option<Vec<_>>>()?;
        let (leaf, dirs) = segments.split_last()?;

        let file_name = format!("{}{}", leaf, self.extension);
        if !self.is_eligible(&file_name) {
            return None;
        }

        let mut path = self.root.clone();
        for dir in dirs {
            path.push(dir);
        }
        path.push(file_name);
        Some((path, leaf.clone()))
    }

    /// Resolve the URL-encoded `subpath` to an eligible file under the root.
    pub async fn resolve(&self, subpath: &str) -> Option<DiscoveredFile> {
        let (candidate, stem) = self.locate(subpath)?;

        let metadata = tokio::fs::metadata(&candidate).await.ok()?;
        if !metadata.is_file() {
            return None;
        }

        let file_path = tokio::fs::canonicalize(&candidate).await.ok()?;
        let root = tokio::fs::canonicalize(&self.root).await.ok()?;
        if !file_path.starts_with(&root) {
            tracing::warn!(
                candidate = %candidate.display(),
                resolved = %file_path.display(),
                "Discovered file escapes the root directory"
            );
            return None;
        }

        Some(DiscoveredFile {
            relative_url_subpath: subpath.to_string(),
            file_path,
            stem,
        })
    }
}

/// Percent-decode one path segment. Segments that are empty, `.`/`..`, not
/// UTF-8, or that decode to a separator or NUL are rejected.
fn decode_segment(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let valid = !decoded.is_empty()
        && decoded != "."
        && decoded != ".."
        && !decoded.contains(['/', '\\', '\0']);
    valid.then(|| decoded.into_owned())
}
