//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body limit, trace)
//!     → upgrade: websocket? → websocket.rs (bridge to StreamSession)
//!     → root Application (router / gateway)
//!     → response.rs (gateway-generated redirects)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{rewrite_path, UuidRequestId, X_REQUEST_ID};
pub use response::{temporary_redirect, trailing_slash_location};
pub use server::HttpServer;
