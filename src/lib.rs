//! Multi-application HTTP/WebSocket gateway.
//!
//! Applications are mounted under URL prefixes ([`routing::PrefixRouter`])
//! or discovered on demand from source files in a directory
//! ([`gateway::DynamicDirectoryGateway`]). Both are themselves
//! [`application::Application`]s and nest freely.

pub mod application;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use application::{Application, SharedApplication, StreamSession};
pub use config::GatewayConfig;
pub use error::{BuildError, GatewayError};
pub use gateway::{factory_fn, ApplicationFactory, DynamicDirectoryGateway};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::PrefixRouter;
