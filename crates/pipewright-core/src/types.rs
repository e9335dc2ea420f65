//! Common types used throughout a handler chain.
//!
//! This module defines the HTTP request and response types chains operate on.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type used in a handler chain.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body. The
/// request-scoped [`RequestContext`](crate::RequestContext) travels in its
/// extensions.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by a finished chain.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building error responses.
pub trait ResponseExt {
    /// Creates an error response with the given status code and message.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON error response.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(message.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response
    }
}
