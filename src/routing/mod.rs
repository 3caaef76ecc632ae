//! Static prefix routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request or stream (path)
//!     → router.rs (longest segment-aligned prefix)
//!     → matcher.rs (normalize, match, strip)
//!     → Forward: rewritten path + mount path → mounted Application
//!     → NoMatch: 404 / stream closed
//!
//! Route compilation (at startup):
//!     mount(prefix, app)...
//!     → normalize prefixes, last write wins
//!     → sort: longest prefix first, root last
//!     → freeze as immutable PrefixRouter
//! ```
//!
//! # Design Decisions
//! - Mounts compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: registration order never changes the outcome

pub mod matcher;
pub mod router;

pub use matcher::{normalize_prefix, PathPrefixMatcher};
pub use router::{Mount, PrefixRouter, PrefixRouterBuilder, RouteError};

use crate::application::{Inbound, MountPath, SharedApplication};
use crate::error::GatewayError;
use crate::http::request::rewrite_path;

/// A resolved forwarding decision.
#[derive(Clone)]
pub struct Forward {
    pub application: SharedApplication,
    /// Prefix stripped from the path, recorded as [`MountPath`].
    pub mount_path: String,
    /// Path the application sees.
    pub path: String,
}

impl Forward {
    /// Rewrite `inbound` so the application sees itself mounted at root.
    pub fn prepare<I: Inbound>(&self, inbound: &mut I) -> Result<(), GatewayError> {
        rewrite_path(inbound, &self.path)?;
        if self.mount_path != "/" {
            MountPath::push(inbound, &self.mount_path);
        }
        Ok(())
    }
}
