//! # PrivateCalculatorV2
//!
//! A calculator service skeleton: an HTTP API with placeholder endpoints for
//! equation solving and matrix operations, plus a terminal client that drives
//! the same API through page models.
//!
//! No solver exists yet. The solve and matrix endpoints validate their input
//! and answer with a fixed "coming soon" payload echoing it.
//!
//! ## Features
//!
//! - **Request pipeline**: security headers, CORS, per-client rate limiting,
//!   body limits, JSON and form bodies
//! - **Uniform errors**: every failure becomes a JSON envelope; panics are
//!   caught and reported as 500s
//! - **API client**: reqwest wrapper with timeouts and request interceptors
//! - **Page models**: home and calculator pages rendered as terminal text
//!
//! ## Architecture
//!
//! - [`server`] - Axum router, handlers and middleware
//! - [`client`] - HTTP client for the API
//! - [`pages`] - Home and calculator page state
//! - [`types`] - Wire types shared by server and client
//! - [`error`] - Error types
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use private_calculator::{create_router, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let router = create_router(RouterConfig::new("http://localhost:8080"));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod pages;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use client::{ApiClient, BearerToken, Passthrough, RequestInterceptor, DEFAULT_API_URL};
pub use config::{ClientArgs, Cli, Command, MatrixArgs, ServeConfig, SolveArgs};
pub use error::{ApiError, ClientError, ErrorReport, RATE_LIMIT_MESSAGE};
pub use pages::{ApiStatus, CalculationResult, CalculatorPage, HomePage};
pub use server::{
    create_router, create_router_with_limiter, AppState, CleanupService, RateLimitConfig,
    RateLimitError, RateLimiter, RouterConfig,
};
pub use types::{
    ApiHealthResponse, EquationPlaceholder, EquationRequest, ErrorEnvelope, HealthCheckResponse,
    Matrix, MatrixPlaceholder, MatrixRequest,
};
