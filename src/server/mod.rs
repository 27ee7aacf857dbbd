//! HTTP server layer for the calculator API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           HTTP Layer                             │
//! │   security headers → CORS → errors → rate limit → body → routes  │
//! │                                                                  │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌───────────────┐  │
//! │  │  handlers  │ │ middleware │ │ rate_limit │ │    routes     │  │
//! │  │ (requests) │ │ (headers,  │ │ (per-client│ │ (router       │  │
//! │  │            │ │  errors)   │ │  windows)  │ │  assembly)    │  │
//! │  └────────────┘ └────────────┘ └────────────┘ └───────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;

pub use extract::Payload;
pub use handlers::{
    api_health_handler, docs_handler, health_handler, matrix_operations_handler,
    not_found_handler, root_handler, solve_equation_handler, welcome_handler, AppState,
    MatrixOperation, SolveEquation,
};
pub use middleware::{error_middleware, panic_response, security_headers, ErrorHandling};
pub use rate_limit::{
    client_identifier, rate_limit_middleware, CleanupService, RateLimitConfig, RateLimitError,
    RateLimitState, RateLimitStatus, RateLimiter,
};
pub use routes::{
    create_router, create_router_with_limiter, RouterConfig, API_PREFIX, DEFAULT_BODY_LIMIT,
    DEFAULT_FRONTEND_URL,
};
