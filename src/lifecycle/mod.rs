//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → load mounts → wrap in directory gateway → root app
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C / trigger → stop accepting → drain connections → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then applications, then listeners
//! - Shutdown is a broadcast so any number of tasks can observe it

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_application, StartupError};
