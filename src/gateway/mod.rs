//! Dynamic directory gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request or stream
//!     → directory.rs (base prefix? otherwise fallback untouched)
//!     → already-built mount owns the subpath? → forward
//!     → discovery.rs (URL subpath → eligible file under root)
//!         missing / hidden / outside root → fallback untouched
//!         no trailing `/`                 → 307 to path + `/`
//!     → cache.rs (canonical path → single-flight build via factory.rs)
//!     → Forward: path rewritten to the per-file mount point
//! ```
//!
//! # Design Decisions
//! - The gateway never writes its own 404: misses defer to the fallback
//! - Built applications live for the process lifetime; failures are not cached
//! - Negative lookups are not cached so new files appear without restart

pub mod cache;
pub mod directory;
pub mod discovery;
pub mod factory;

pub use cache::AppCache;
pub use directory::DynamicDirectoryGateway;
pub use discovery::{DiscoveredFile, Discovery, DEFAULT_EXTENSION, DEFAULT_HIDDEN_PREFIX};
pub use factory::{factory_fn, ApplicationFactory, FnFactory};
