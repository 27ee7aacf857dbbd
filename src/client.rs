//! HTTP client for the calculator API.
//!
//! [`ApiClient`] wraps a `reqwest::Client` with a fixed base URL, a request
//! timeout and JSON headers. Outgoing requests pass through a
//! [`RequestInterceptor`]; responses are unwrapped to their JSON payload on
//! success and turned into a [`ClientError`] otherwise.
//!
//! # Example
//!
//! ```no_run
//! use private_calculator::client::ApiClient;
//!
//! # async fn run() -> Result<(), private_calculator::error::ClientError> {
//! let client = ApiClient::new("http://localhost:3001/api")?;
//! let health = client.check_health().await?;
//! println!("{}", health.message);
//!
//! let answer = client.solve_equation("2x + 3 = 7").await?;
//! println!("{}", answer.solution);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};
use url::Url;

use crate::error::ClientError;
use crate::types::{
    ApiHealthResponse, EquationPlaceholder, EquationRequest, Matrix, MatrixPlaceholder,
    MatrixRequest,
};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Interceptors
// =============================================================================

/// Hook applied to every outgoing request, e.g. to attach credentials.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Interceptor that leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl RequestInterceptor for Passthrough {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Interceptor that attaches a bearer token.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl RequestInterceptor for BearerToken {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.0)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client for the calculator API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    interceptor: Arc<dyn RequestInterceptor>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client with the default 10 second timeout.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            interceptor: Arc::new(Passthrough),
        })
    }

    /// Replace the request interceptor.
    pub fn with_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptor = Arc::new(interceptor);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `endpoint` against the base URL.
    ///
    /// Leading slashes are ignored so `/health` stays under the base path.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    // =========================================================================
    // Typed Endpoints
    // =========================================================================

    /// `GET /health` under the API base.
    pub async fn check_health(&self) -> Result<ApiHealthResponse, ClientError> {
        self.get("/health").await
    }

    /// `POST /calculator/solve`
    pub async fn solve_equation(&self, equation: &str) -> Result<EquationPlaceholder, ClientError> {
        self.post("/calculator/solve", &EquationRequest::new(equation))
            .await
    }

    /// `POST /matrix/operations`
    pub async fn perform_matrix_operation(
        &self,
        matrix: &[Vec<f64>],
        operation: &str,
    ) -> Result<MatrixPlaceholder, ClientError> {
        let request = MatrixRequest::new(to_wire_matrix(matrix)?, operation);
        self.post("/matrix/operations", &request).await
    }

    // =========================================================================
    // Generic Requests
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let url = self.endpoint_url(endpoint)?;
        self.send(self.http.get(url)).await
    }

    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint)?;
        self.send(self.http.post(url).json(body)).await
    }

    pub async fn put<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint)?;
        self.send(self.http.put(url).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let url = self.endpoint_url(endpoint)?;
        self.send(self.http.delete(url)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = self.interceptor.intercept(request);

        let response = request.send().await.map_err(|e| {
            error!("API Error: {}", e);
            ClientError::from(e)
        })?;

        unwrap_response(response).await
    }
}

/// Return the JSON payload of a successful response, or the matching error.
async fn unwrap_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    debug!(status = status.as_u16(), url = %response.url(), "API response");

    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            error!("API Error: undecodable response: {}", e);
            ClientError::from(e)
        });
    }

    let body = response.text().await.unwrap_or_default();
    error!(status = status.as_u16(), "API Error: {}", body);

    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    Err(ClientError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract `message` from a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Ensure the base path ends with `/` so relative joins append to it.
fn normalize_base_url(base_url: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Convert a float matrix into its wire form, writing whole numbers as
/// integers.
fn to_wire_matrix(matrix: &[Vec<f64>]) -> Result<Matrix, ClientError> {
    matrix
        .iter()
        .map(|row| row.iter().map(|&value| to_wire_number(value)).collect())
        .collect()
}

fn to_wire_number(value: f64) -> Result<serde_json::Number, ClientError> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return Ok(serde_json::Number::from(value as i64));
    }
    serde_json::Number::from_f64(value)
        .ok_or_else(|| ClientError::InvalidInput(format!("{} is not a finite number", value)))
}
