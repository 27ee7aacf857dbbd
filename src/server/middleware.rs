//! Cross-cutting middleware: security headers, error finalization and panic
//! recovery.

use std::any::Any;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::error::{ApiError, ErrorReport};
use crate::types::iso_timestamp;

/// Headers added to every response unless the handler already set them.
pub const SECURITY_HEADERS: [(&str, &str); 12] = [
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
         form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
         object-src 'none';script-src 'self';script-src-attr 'none';\
         style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Add the hardening headers of [`SECURITY_HEADERS`] to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in SECURITY_HEADERS {
        let name = HeaderName::from_static(name);
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }

    response
}

// =============================================================================
// Error Finalization
// =============================================================================

/// Settings for [`error_middleware`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandling {
    /// Include the error detail as `stack` in envelopes
    pub expose_detail: bool,
}

impl ErrorHandling {
    pub fn new(expose_detail: bool) -> Self {
        Self { expose_detail }
    }
}

/// Terminal error stage of the pipeline.
///
/// Every [`ApiError`] response produced further in (handlers, body
/// extraction, the rate limiter, caught panics) carries an [`ErrorReport`].
/// This stage logs it together with the request line and, in development
/// mode, rewrites the envelope to include the detail.
pub async fn error_middleware(
    State(handling): State<ErrorHandling>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let timestamp = iso_timestamp();
    if report.status.is_server_error() {
        error!(
            status = report.status.as_u16(),
            method = %method,
            url = %uri,
            timestamp = %timestamp,
            detail = %report.detail,
            "Error occurred: {}",
            report.message
        );
    } else if report.status == StatusCode::NOT_FOUND {
        debug!(
            status = report.status.as_u16(),
            method = %method,
            url = %uri,
            "Resource not found: {}",
            report.message
        );
    } else {
        warn!(
            status = report.status.as_u16(),
            method = %method,
            url = %uri,
            timestamp = %timestamp,
            "Client error: {}",
            report.message
        );
    }

    if !handling.expose_detail {
        return response;
    }

    let body = match serde_json::to_vec(&report.envelope(true)) {
        Ok(body) => body,
        Err(err) => {
            error!("Failed to serialize error envelope: {}", err);
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}

/// Convert a handler panic into a 500 envelope.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        String::new()
    };

    ApiError::Internal(message).into_response()
}
