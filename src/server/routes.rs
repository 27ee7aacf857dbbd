//! Router configuration for the calculator API.
//!
//! This module defines the HTTP routes and assembles the middleware pipeline.
//!
//! # Route Structure
//!
//! ```text
//! /                          - Service banner
//! /health                    - Liveness check
//! /api/                      - Welcome message           (rate limited)
//! /api/health                - API health check          (rate limited)
//! /api/docs                  - Documentation             (rate limited)
//! /api/calculator/solve      - Equation placeholder      (rate limited)
//! /api/matrix/operations     - Matrix placeholder        (rate limited)
//! *                          - 404 fallback
//! ```
//!
//! Every path except `/` also answers with a trailing slash.
//!
//! # Pipeline
//!
//! Requests pass, in order, through tracing, security headers, CORS, the
//! error stage, the `/api` rate limiter, panic recovery and body limits before
//! reaching a route. The error stage sits outside the limiter so that 429s and
//! caught panics are finalized like any handler error.
//!
//! # Example
//!
//! ```ignore
//! use private_calculator::server::{create_router, RouterConfig};
//!
//! let router = create_router(RouterConfig::new("http://localhost:8080"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use http::header::HeaderValue;
use http::Method;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    api_health_handler, docs_handler, health_handler, matrix_operations_handler,
    not_found_handler, root_handler, solve_equation_handler, welcome_handler, AppState,
};
use super::middleware::{error_middleware, panic_response, security_headers, ErrorHandling};
use super::rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimitState, RateLimiter};

/// Default allowed CORS origin.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:8080";

/// Default maximum request body size (10MB).
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Path prefix of the API router and the rate limiter.
pub const API_PREFIX: &str = "/api";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origin allowed to make credentialed cross-origin requests
    pub frontend_url: String,

    /// Per-client request limits for `/api`
    pub rate_limit: RateLimitConfig,

    /// Maximum accepted request body size in bytes
    pub body_limit: usize,

    /// Include error detail in error envelopes (development mode)
    pub expose_error_detail: bool,

    /// Derive client identity and URLs from proxy headers
    pub trust_proxy: bool,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration allowing `frontend_url`.
    ///
    /// By default:
    /// - 100 requests per client per 15 minutes on `/api`
    /// - 10MB body limit
    /// - Error detail hidden
    /// - Proxy headers ignored
    /// - Tracing enabled
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
            rate_limit: RateLimitConfig::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            expose_error_detail: false,
            trust_proxy: false,
            enable_tracing: true,
        }
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit = RateLimitConfig {
            max_requests,
            window,
        };
        self
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Expose error detail as `stack` in envelopes.
    pub fn with_error_detail(mut self, expose: bool) -> Self {
        self.expose_error_detail = expose;
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTEND_URL)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router with a fresh limiter built from
/// `config.rate_limit`.
pub fn create_router(config: RouterConfig) -> Router {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    create_router_with_limiter(config, limiter)
}

/// Create the main application router around an existing limiter.
///
/// Lets callers share the limiter with a
/// [`CleanupService`](super::rate_limit::CleanupService) or inspect it in
/// tests. `config.rate_limit` is ignored.
pub fn create_router_with_limiter(config: RouterConfig, limiter: Arc<RateLimiter>) -> Router {
    let app_state = AppState::new().with_trust_proxy(config.trust_proxy);

    let rate_limit =
        RateLimitState::new(limiter, API_PREFIX).with_trust_proxy(config.trust_proxy);

    let router = with_trailing_slash(api_routes(), "/health", get(health_handler))
        .route("/", get(root_handler))
        .fallback(not_found_handler)
        .method_not_allowed_fallback(not_found_handler)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            ErrorHandling::new(config.expose_error_detail),
            error_middleware,
        ))
        .layer(build_cors_layer(&config))
        .layer(middleware::from_fn(security_headers));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Routes under `/api`. Both `/api` and `/api/` reach the welcome handler.
fn api_routes() -> Router<AppState> {
    let routes: [(&str, MethodRouter<AppState>); 4] = [
        ("/health", get(api_health_handler)),
        ("/docs", get(docs_handler)),
        ("/calculator/solve", post(solve_equation_handler)),
        ("/matrix/operations", post(matrix_operations_handler)),
    ];

    routes.into_iter().fold(
        with_trailing_slash(Router::new(), API_PREFIX, get(welcome_handler)),
        |router, (path, handler)| {
            with_trailing_slash(router, &format!("{API_PREFIX}{path}"), handler)
        },
    )
}

/// Register `handler` at `path` and at `path/`.
fn with_trailing_slash(
    router: Router<AppState>,
    path: &str,
    handler: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, handler.clone())
        .route(&format!("{path}/"), handler)
}

/// Build the CORS layer: one allowed origin, credentials enabled.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    match HeaderValue::from_str(&config.frontend_url) {
        Ok(origin) => cors.allow_origin(AllowOrigin::exact(origin)),
        Err(e) => {
            // Without a valid origin no cross-origin request is allowed
            warn!("Invalid frontend URL '{}': {}", config.frontend_url, e);
            cors
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
