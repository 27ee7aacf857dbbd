//! Wire types shared by the HTTP server and the API client.
//!
//! All bodies use camelCase field names on the wire. Request types keep every
//! field optional so that a missing field reaches validation (and produces a
//! `400 Bad Request`) instead of failing deserialization.

use serde::{Deserialize, Serialize};

/// Service name reported by the health endpoints.
pub const SERVICE_NAME: &str = "PrivateCalculatorV2 API";

/// Service version reported by every informational endpoint.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Status string reported by healthy endpoints.
pub const STATUS_OK: &str = "OK";

/// Result text returned by the placeholder endpoints.
pub const FEATURE_IN_DEVELOPMENT: &str = "Feature in development";

/// Message returned by the equation placeholder.
pub const EQUATION_PLACEHOLDER_MESSAGE: &str = "Calculator endpoint - coming soon!";

/// Message returned by the matrix placeholder.
pub const MATRIX_PLACEHOLDER_MESSAGE: &str = "Matrix operations endpoint - coming soon!";

/// Steps listed by the equation placeholder.
pub const EQUATION_PLACEHOLDER_STEPS: [&str; 3] = [
    "Step 1: Parse equation",
    "Step 2: Solve equation",
    "Step 3: Return solution",
];

/// Routes listed in every 404 response.
pub const AVAILABLE_ROUTES: [&str; 3] = ["/", "/health", "/api"];

/// A matrix as received on the wire.
///
/// Entries keep their original JSON representation so an echo of `2` stays
/// `2` rather than becoming `2.0`.
pub type Matrix = Vec<Vec<serde_json::Number>>;

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /api/calculator/solve`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationRequest {
    /// Equation text, e.g. `2x + 3 = 7`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<String>,
}

impl EquationRequest {
    pub fn new(equation: impl Into<String>) -> Self {
        Self {
            equation: Some(equation.into()),
        }
    }
}

/// Body of `POST /api/matrix/operations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixRequest {
    /// Matrix rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,

    /// Operation name (solve, determinant, inverse, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl MatrixRequest {
    pub fn new(matrix: Matrix, operation: impl Into<String>) -> Self {
        Self {
            matrix: Some(matrix),
            operation: Some(operation.into()),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Placeholder answer of the equation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquationPlaceholder {
    pub message: String,
    pub received_equation: String,
    pub solution: String,
    pub steps: Vec<String>,
}

impl EquationPlaceholder {
    /// Build the fixed placeholder echoing `equation`.
    pub fn echo(equation: impl Into<String>) -> Self {
        Self {
            message: EQUATION_PLACEHOLDER_MESSAGE.to_string(),
            received_equation: equation.into(),
            solution: FEATURE_IN_DEVELOPMENT.to_string(),
            steps: EQUATION_PLACEHOLDER_STEPS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Placeholder answer of the matrix endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixPlaceholder {
    pub message: String,
    pub received_matrix: Matrix,
    pub operation: String,
    pub result: String,
}

impl MatrixPlaceholder {
    /// Build the fixed placeholder echoing `matrix` and `operation`.
    pub fn echo(matrix: Matrix, operation: impl Into<String>) -> Self {
        Self {
            message: MATRIX_PLACEHOLDER_MESSAGE.to_string(),
            received_matrix: matrix,
            operation: operation.into(),
            result: FEATURE_IN_DEVELOPMENT.to_string(),
        }
    }
}

/// Liveness response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
    pub service: String,
    pub version: String,
}

/// Endpoint groups advertised by `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    pub calculator: String,
    pub matrix: String,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiHealthResponse {
    pub status: String,
    pub message: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
    pub endpoints: ApiEndpoints,
}

/// Top-level endpoints advertised by `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootEndpoints {
    pub health: String,
    pub api: String,
    pub docs: String,
}

/// Response of `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub endpoints: RootEndpoints,
}

/// Response of `GET /api/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
    pub description: String,
    pub documentation: String,
    pub available_endpoints: Vec<String>,
}

/// Body of a route-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadRequestResponse {
    /// Always `"Bad Request"`
    pub error: String,
    pub message: String,
}

/// Body of the catch-all 404.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    /// Always `"Not Found"`
    pub error: String,
    pub message: String,
    pub available_routes: Vec<String>,
}

/// JSON envelope produced by the error middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `true`
    pub error: bool,
    pub status: u16,
    pub message: String,

    /// Error detail, only present in development mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// ISO-8601 timestamp
    pub timestamp: String,
}

/// Current time formatted like `2024-01-01T00:00:00.000Z`.
pub fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
