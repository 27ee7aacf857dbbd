use std::error::Error as StdError;

use axum::extract::rejection::{BytesRejection, FormRejection};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::types::{iso_timestamp, BadRequestResponse, ErrorEnvelope};

/// Message returned with every `429 Too Many Requests`.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Errors produced while serving a request.
///
/// Every variant except [`ApiError::BadRequest`] renders the JSON error
/// envelope and is finalized (logged, optionally enriched with detail) by
/// [`error_middleware`](crate::server::middleware::error_middleware).
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing; rendered as `{ error: "Bad Request", message }`
    #[error("{message}")]
    BadRequest { message: String },

    /// Error carrying an explicit HTTP status, which takes precedence
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Request body failed schema validation (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A field has the wrong type (400)
    #[error("Invalid data format: {0}")]
    InvalidData(String),

    /// Request body exceeds the configured limit (413)
    #[error("Request body exceeds the configured limit")]
    PayloadTooLarge,

    /// No route matched (404)
    #[error("Not Found - {path}")]
    NotFound { path: String },

    /// Client exhausted its rate-limit window (429)
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Build a `400 Bad Request` for a missing field.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    /// Build the 404 error for a request that matched no route.
    pub fn not_found(uri: &Uri) -> Self {
        ApiError::NotFound {
            path: uri.to_string(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Status { status, .. } => *status,
            ApiError::Validation(_) | ApiError::InvalidData(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest { message } | ApiError::Status { message, .. } => message.clone(),
            ApiError::Validation(_) => "Validation Error".to_string(),
            ApiError::InvalidData(_) => "Invalid data format".to_string(),
            ApiError::PayloadTooLarge => "File size too large".to_string(),
            ApiError::NotFound { .. } => self.to_string(),
            ApiError::RateLimited { .. } => RATE_LIMIT_MESSAGE.to_string(),
            ApiError::Internal(message) if message.is_empty() => {
                "Internal Server Error".to_string()
            }
            ApiError::Internal(message) => message.clone(),
        }
    }

    /// Debug rendering followed by the source chain.
    fn detail(&self) -> String {
        let mut detail = format!("{:?}", self);
        let mut source = self.source();
        while let Some(err) = source {
            detail.push_str("\n    caused by: ");
            detail.push_str(&err.to_string());
            source = err.source();
        }
        detail
    }
}

/// Error details attached to a response so the error middleware can log it
/// and decide whether to expose the detail.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub detail: String,
}

impl ErrorReport {
    /// Build the envelope body, with detail only when `expose_detail` is set.
    pub fn envelope(&self, expose_detail: bool) -> ErrorEnvelope {
        ErrorEnvelope {
            error: true,
            status: self.status.as_u16(),
            message: self.message.clone(),
            stack: expose_detail.then(|| self.detail.clone()),
            timestamp: iso_timestamp(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::BadRequest { message } = self {
            let body = BadRequestResponse {
                error: "Bad Request".to_string(),
                message,
            };
            return (status, Json(body)).into_response();
        }

        let report = ErrorReport {
            status,
            message: self.public_message(),
            detail: self.detail(),
        };

        let mut response = (status, Json(report.envelope(false))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::Status {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        match rejection {
            FormRejection::FailedToDeserializeFormBody(err) => {
                ApiError::InvalidData(err.body_text())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
            other => ApiError::Status {
                status: other.status(),
                message: other.body_text(),
            },
        }
    }
}

/// Errors returned by [`ApiClient`](crate::client::ApiClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL or endpoint could not be joined into a URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection failure, timeout or undecodable body
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 401
    #[error("Unauthorized")]
    Unauthorized,

    /// The server answered with another non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request could not be built from the given input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
