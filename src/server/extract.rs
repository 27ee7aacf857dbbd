//! Request body extraction.
//!
//! [`Payload`] accepts JSON and URL-encoded form bodies. A request without a
//! recognised body type, an empty JSON body, or a JSON body that is not an
//! object is read as an empty object, so the handler's required-field
//! validation answers instead of a content-type error.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;

/// Body of a request, deserialized from JSON or a URL-encoded form.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

/// Body kinds understood by [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(request: &Request) -> BodyKind {
    let Some(content_type) = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Other;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
    {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

/// Parse a JSON body into the object whose fields a handler reads.
///
/// Blank bodies and non-object documents carry no named fields.
fn json_object(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let value: Value = serde_json::from_slice(bytes).map_err(|e| ApiError::Status {
        status: StatusCode::BAD_REQUEST,
        message: format!("Failed to parse the request body as JSON: {}", e),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => {
            debug!("Ignoring non-object JSON body: {}", other);
            Ok(Map::new())
        }
    }
}

fn from_object<T: DeserializeOwned>(map: Map<String, Value>) -> Result<Payload<T>, ApiError> {
    serde_json::from_value(Value::Object(map))
        .map(Payload)
        .map_err(|e| ApiError::InvalidData(e.to_string()))
}

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&request) {
            BodyKind::Json => {
                let bytes = Bytes::from_request(request, state).await?;
                from_object(json_object(&bytes)?)
            }
            BodyKind::Form => {
                let Form(value) = Form::<T>::from_request(request, state).await?;
                Ok(Payload(value))
            }
            BodyKind::Other => from_object(Map::new()),
        }
    }
}
