//! Command-line and environment configuration.
//!
//! The binary has one server subcommand and three client subcommands:
//!
//! - `serve` - run the HTTP API
//! - `status` - probe a running API from the home page
//! - `solve <EQUATION>` - submit an equation from the calculator page
//! - `matrix [--matrix JSON] [--operation OP]` - submit a matrix operation
//!
//! # Environment Variables
//!
//! Server:
//!
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Port (default: 3001)
//! - `FRONTEND_URL` - Allowed CORS origin (default: http://localhost:8080)
//! - `NODE_ENV` - `development` exposes error detail in responses
//! - `RATE_LIMIT_MAX` - Requests per client per window (default: 100)
//! - `RATE_LIMIT_WINDOW_SECS` - Window length (default: 900)
//! - `BODY_LIMIT` - Maximum request body in bytes (default: 10MB)
//! - `TRUST_PROXY` - Honour X-Forwarded-* headers (default: false)
//!
//! Client:
//!
//! - `VITE_API_URL` - API base URL (default: http://localhost:3001/api)

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::client::{ApiClient, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::ClientError;
use crate::pages::{DEFAULT_OPERATION, SAMPLE_MATRIX};
use crate::server::rate_limit::{DEFAULT_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_WINDOW_SECS};
use crate::server::{RouterConfig, DEFAULT_BODY_LIMIT, DEFAULT_FRONTEND_URL};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default runtime environment.
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Environment name that exposes error detail.
pub const DEVELOPMENT: &str = "development";

/// Matrix rows as given on the command line.
///
/// An alias keeps clap from reading the `Vec` as a repeated argument.
pub type MatrixRows = Vec<Vec<f64>>;

// =============================================================================
// CLI Arguments
// =============================================================================

/// PrivateCalculatorV2 - calculator API server and terminal client.
#[derive(Parser, Debug, Clone)]
#[command(name = "private-calculator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API server.
    Serve(ServeConfig),

    /// Check whether the API is reachable.
    Status(ClientArgs),

    /// Submit an equation to the solver.
    Solve(SolveArgs),

    /// Submit a matrix operation.
    Matrix(MatrixArgs),
}

/// Configuration of the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Runtime environment; `development` adds error detail to responses.
    #[arg(long, default_value = DEFAULT_ENVIRONMENT, env = "NODE_ENV")]
    pub environment: String,

    // =========================================================================
    // Request Pipeline
    // =========================================================================
    /// Origin allowed to make cross-origin requests.
    #[arg(long, default_value = DEFAULT_FRONTEND_URL, env = "FRONTEND_URL")]
    pub frontend_url: String,

    /// Maximum `/api` requests per client within one window.
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_MAX, env = "RATE_LIMIT_MAX")]
    pub rate_limit_max: u32,

    /// Rate limit window in seconds.
    #[arg(long, default_value_t = DEFAULT_RATE_LIMIT_WINDOW_SECS, env = "RATE_LIMIT_WINDOW_SECS")]
    pub rate_limit_window: u64,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT, env = "BODY_LIMIT")]
    pub body_limit: usize,

    /// Trust X-Forwarded-* headers for client identity and URLs.
    ///
    /// Only enable behind a reverse proxy that sets these headers.
    #[arg(long, default_value_t = false, env = "TRUST_PROXY")]
    pub trust_proxy: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate_limit_max == 0 {
            return Err("rate_limit_max must be greater than 0".to_string());
        }
        if self.rate_limit_window == 0 {
            return Err("rate_limit_window must be greater than 0".to_string());
        }
        if self.body_limit == 0 {
            return Err("body_limit must be greater than 0".to_string());
        }

        let origin = Url::parse(&self.frontend_url)
            .map_err(|e| format!("Invalid frontend URL '{}': {}", self.frontend_url, e))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(format!(
                "Frontend URL must use http or https, got '{}'",
                origin.scheme()
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case(DEVELOPMENT)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window)
    }

    /// Allowed origin as browsers send it, without a trailing slash.
    pub fn cors_origin(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "private_calculator=debug,tower_http=debug"
        } else {
            "private_calculator=info,tower_http=info"
        }
    }

    /// Build the router configuration.
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig::new(self.cors_origin())
            .with_rate_limit(self.rate_limit_max, self.rate_limit_window())
            .with_body_limit(self.body_limit)
            .with_error_detail(self.is_development())
            .with_trust_proxy(self.trust_proxy)
            .with_tracing(!self.no_tracing)
    }
}

/// Options shared by the client subcommands.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the API.
    #[arg(long, default_value = DEFAULT_API_URL, env = "VITE_API_URL")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ClientArgs {
    /// Default log filter when `RUST_LOG` is unset. Failures are always shown.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "private_calculator=debug"
        } else {
            "private_calculator=error"
        }
    }

    pub fn client(&self) -> Result<ApiClient, ClientError> {
        ApiClient::with_timeout(&self.api_url, Duration::from_secs(self.timeout))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Equation to solve, e.g. "2x + 3 = 7".
    pub equation: String,
}

#[derive(Args, Debug, Clone)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Matrix as JSON rows, e.g. "[[2,3],[1,-1]]".
    ///
    /// Defaults to the sample matrix.
    #[arg(long, value_parser = parse_matrix)]
    pub matrix: Option<MatrixRows>,

    /// Operation to perform.
    #[arg(long, default_value = DEFAULT_OPERATION)]
    pub operation: String,
}

impl MatrixArgs {
    pub fn matrix_or_sample(&self) -> MatrixRows {
        self.matrix
            .clone()
            .unwrap_or_else(|| SAMPLE_MATRIX.iter().map(|row| row.to_vec()).collect())
    }
}

/// Parse a matrix given as JSON rows.
pub fn parse_matrix(s: &str) -> Result<MatrixRows, String> {
    serde_json::from_str(s).map_err(|e| format!("expected JSON rows of numbers: {}", e))
}

// =============================================================================
// Tests
// =============================================================================
