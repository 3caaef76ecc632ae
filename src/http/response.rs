//! Response construction for gateway-generated responses.
//!
//! The gateway writes only two kinds of responses itself: the trailing-slash
//! redirect and the build-failure error (see [`crate::error::GatewayError`]).
//! Everything else comes from a backend or the fallback.

use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

/// Location for a request that is missing its trailing separator:
/// original path, then `/`, then the original query string unchanged.
pub fn trailing_slash_location(uri: &Uri) -> String {
    match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    }
}

/// 307 Temporary Redirect to `location`.
pub fn temporary_redirect(location: &str) -> Response {
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_without_query() {
        let uri: Uri = "/apps/nested/nested_app".parse().unwrap();
        assert_eq!(trailing_slash_location(&uri), "/apps/nested/nested_app/");
    }

    #[test]
    fn test_location_keeps_query_bytes() {
        let uri: Uri = "/apps/test_app?param=value&b=%2F".parse().unwrap();
        assert_eq!(trailing_slash_location(&uri), "/apps/test_app/?param=value&b=%2F");
    }

    #[test]
    fn test_redirect_response() {
        let res = temporary_redirect("/apps/x/");
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[header::LOCATION], "/apps/x/");
    }
}
