//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for requests that lack one
//! - Rewrite the path a backend sees, keeping the query string intact
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Rewrites operate on [`Inbound`] so requests and streams share them

use axum::http::uri::PathAndQuery;
use axum::http::{HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::application::Inbound;
use crate::error::GatewayError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID generator backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Replace the path of `inbound`'s URI, preserving the query string verbatim.
pub fn rewrite_path<I: Inbound>(inbound: &mut I, path: &str) -> Result<(), GatewayError> {
    let uri = inbound.uri();
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>()?);
    *inbound.uri_mut() = Uri::from_parts(parts)?;
    Ok(())
}
