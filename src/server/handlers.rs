//! HTTP request handlers for the calculator API.
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /` - Service banner and endpoint listing
//! - `GET /api/health` - API health check
//! - `GET /api/` - Welcome message
//! - `GET /api/docs` - API documentation
//! - `POST /api/calculator/solve` - Equation solving (placeholder)
//! - `POST /api/matrix/operations` - Matrix operations (placeholder)

use axum::{
    extract::{OriginalUri, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::types::{
    iso_timestamp, ApiEndpoints, ApiHealthResponse, EquationPlaceholder, EquationRequest, Matrix,
    MatrixPlaceholder, MatrixRequest, NotFoundResponse, RootEndpoints, RootResponse,
    HealthCheckResponse, WelcomeResponse, AVAILABLE_ROUTES, SERVICE_NAME, SERVICE_VERSION,
    STATUS_OK,
};

use super::extract::Payload;

// =============================================================================
// Application State
// =============================================================================

/// Shared state passed to handlers via Axum's State extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppState {
    /// Trust `X-Forwarded-Proto` / `X-Forwarded-Host` when deriving URLs
    pub trust_proxy: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Base URL of the API as seen by the client, e.g. `http://localhost:3001/api`.
    pub fn api_base_url(&self, headers: &HeaderMap) -> String {
        let forwarded = |name: &str| {
            if self.trust_proxy {
                forwarded_header(headers, name)
            } else {
                None
            }
        };

        let protocol = forwarded("x-forwarded-proto").unwrap_or("http");
        let host = forwarded("x-forwarded-host")
            .or_else(|| headers.get("host").and_then(|v| v.to_str().ok()))
            .unwrap_or("localhost");

        format!("{}://{}/api", protocol, host)
    }
}

/// First value of a comma-separated proxy header.
fn forwarded_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Validated Requests
// =============================================================================

/// An equation request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveEquation {
    pub equation: String,
}

impl TryFrom<EquationRequest> for SolveEquation {
    type Error = ApiError;

    fn try_from(request: EquationRequest) -> Result<Self, Self::Error> {
        match request.equation {
            Some(equation) if !equation.is_empty() => Ok(Self { equation }),
            _ => Err(ApiError::bad_request("Equation is required")),
        }
    }
}

/// A matrix request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOperation {
    pub matrix: Matrix,
    pub operation: String,
}

impl TryFrom<MatrixRequest> for MatrixOperation {
    type Error = ApiError;

    fn try_from(request: MatrixRequest) -> Result<Self, Self::Error> {
        match (request.matrix, request.operation) {
            (Some(matrix), Some(operation)) if !operation.is_empty() => {
                Ok(Self { matrix, operation })
            }
            _ => Err(ApiError::bad_request("Matrix and operation are required")),
        }
    }
}

// =============================================================================
// Service Endpoints
// =============================================================================

/// Handle liveness checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "OK",
///   "timestamp": "2024-01-01T00:00:00.000Z",
///   "service": "PrivateCalculatorV2 API",
///   "version": "1.0.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: STATUS_OK.to_string(),
        timestamp: iso_timestamp(),
        service: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
    })
}

/// `GET /`
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
        endpoints: RootEndpoints {
            health: "/health".to_string(),
            api: "/api".to_string(),
            docs: "/api/docs".to_string(),
        },
    })
}

/// Catch-all for requests that matched no route.
///
/// # Response
///
/// `404 Not Found` with JSON body:
/// ```json
/// {
///   "error": "Not Found",
///   "message": "Route /nope not found",
///   "availableRoutes": ["/", "/health", "/api"]
/// }
/// ```
pub async fn not_found_handler(
    OriginalUri(uri): OriginalUri,
) -> (StatusCode, Json<NotFoundResponse>) {
    debug!("No route for {}", uri);

    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not Found".to_string(),
            message: format!("Route {} not found", uri),
            available_routes: AVAILABLE_ROUTES.iter().map(|r| r.to_string()).collect(),
        }),
    )
}

// =============================================================================
// API Endpoints
// =============================================================================

/// `GET /api/health`
pub async fn api_health_handler() -> Json<ApiHealthResponse> {
    Json(ApiHealthResponse {
        status: STATUS_OK.to_string(),
        message: "API is running".to_string(),
        timestamp: iso_timestamp(),
        endpoints: ApiEndpoints {
            calculator: "/api/calculator".to_string(),
            matrix: "/api/matrix".to_string(),
        },
    })
}

/// `GET /api/`
pub async fn welcome_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome to {}", SERVICE_NAME),
        version: SERVICE_VERSION.to_string(),
        description: "Mathematical calculator API with equation solving and matrix operations"
            .to_string(),
        documentation: "/api/docs".to_string(),
        available_endpoints: vec![
            "GET /api/health - API health check".to_string(),
            "POST /api/calculator/solve - Solve equations (coming soon)".to_string(),
            "POST /api/matrix/operations - Matrix operations (coming soon)".to_string(),
        ],
    })
}

/// Handle equation solving requests.
///
/// # Endpoint
///
/// `POST /api/calculator/solve`
///
/// # Request Body
///
/// `{ "equation": "2x + 3 = 7" }` as JSON or URL-encoded form.
///
/// # Response
///
/// - `200 OK`: fixed placeholder echoing the equation
/// - `400 Bad Request`: `equation` missing or empty
pub async fn solve_equation_handler(
    Payload(request): Payload<EquationRequest>,
) -> Result<Json<EquationPlaceholder>, ApiError> {
    let SolveEquation { equation } = SolveEquation::try_from(request)?;
    debug!(equation = %equation, "Equation received");

    Ok(Json(EquationPlaceholder::echo(equation)))
}

/// Handle matrix operation requests.
///
/// # Endpoint
///
/// `POST /api/matrix/operations`
///
/// # Request Body
///
/// `{ "matrix": [[2, 3], [1, -1]], "operation": "solve" }`
///
/// # Response
///
/// - `200 OK`: fixed placeholder echoing matrix and operation
/// - `400 Bad Request`: `matrix` or `operation` missing
pub async fn matrix_operations_handler(
    Payload(request): Payload<MatrixRequest>,
) -> Result<Json<MatrixPlaceholder>, ApiError> {
    let MatrixOperation { matrix, operation } = MatrixOperation::try_from(request)?;
    debug!(
        operation = %operation,
        rows = matrix.len(),
        "Matrix operation received"
    );

    Ok(Json(MatrixPlaceholder::echo(matrix, operation)))
}

/// Handle documentation requests.
///
/// `baseUrl` is derived from the request's protocol and host.
pub async fn docs_handler(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "title": format!("{} Documentation", SERVICE_NAME),
        "version": SERVICE_VERSION,
        "baseUrl": state.api_base_url(&headers),
        "endpoints": {
            "GET /": "API welcome message",
            "GET /health": "API health check",
            "POST /calculator/solve": {
                "description": "Solve mathematical equations",
                "parameters": {
                    "equation": "string - Mathematical equation to solve"
                },
                "example": {
                    "equation": "2x + 3 = 7"
                }
            },
            "POST /matrix/operations": {
                "description": "Perform matrix operations",
                "parameters": {
                    "matrix": "array - Matrix data",
                    "operation": "string - Operation type (solve, determinant, inverse)"
                },
                "example": {
                    "matrix": [[2, 3], [1, -1]],
                    "operation": "solve"
                }
            }
        }
    }))
}

// =============================================================================
// Tests
// =============================================================================
