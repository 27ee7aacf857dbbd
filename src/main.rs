//! PrivateCalculatorV2 - calculator API server and terminal client.
//!
//! `serve` starts the HTTP API; `status`, `solve` and `matrix` drive the page
//! models against a running server.

use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use private_calculator::{
    config::{ClientArgs, Cli, Command, MatrixArgs, ServeConfig, SolveArgs},
    pages::{layout, ApiStatus, CalculatorPage, HomePage},
    server::{create_router_with_limiter, CleanupService, RateLimiter},
    ApiClient,
};

/// Upper bound on how often expired rate-limit windows are purged.
const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Status(args) => run_status(args).await,
        Command::Solve(args) => run_solve(args).await,
        Command::Matrix(args) => run_matrix(args).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.log_filter(), false);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!("  Environment: {}", config.environment);
    info!("  Frontend URL: {}", config.cors_origin());
    info!(
        "  Rate limit: {} requests / {}s per client",
        config.rate_limit_max, config.rate_limit_window
    );
    info!("  Body limit: {} bytes", config.body_limit);
    if config.is_development() {
        warn!("  Error detail is exposed in responses (development mode)");
    }
    if config.trust_proxy {
        info!("  Trusting X-Forwarded-* headers");
    }

    let router_config = config.router_config();
    let limiter = Arc::new(RateLimiter::new(router_config.rate_limit.clone()));

    let mut cleanup = CleanupService::new(
        Arc::clone(&limiter),
        config.rate_limit_window().min(MAX_CLEANUP_INTERVAL),
    );
    cleanup.start();

    let router = create_router_with_limiter(router_config, limiter);

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/api/docs", addr);
    info!("    curl -X POST http://{}/api/calculator/solve \\", addr);
    info!("         -H 'Content-Type: application/json' \\");
    info!("         -d '{{\"equation\":\"2x + 3 = 7\"}}'");
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let served = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    cleanup.stop();

    if let Err(e) = served {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("╔═╗┬─┐┬┬  ┬┌─┐┌┬┐┌─┐  ╔═╗┌─┐┬  ┌─┐┬ ┬┬  ┌─┐┌┬┐┌─┐┬─┐");
    info!("╠═╝├┬┘│└┐┌┘├─┤ │ ├┤   ║  ├─┤│  │  │ ││  ├─┤ │ │ │├┬┘");
    info!("╩  ┴└─┴ └┘ ┴ ┴ ┴ └─┘  ╚═╝┴ ┴┴─┘└─┘└─┘┴─┘┴ ┴ ┴ └─┘┴└─");
    info!("");
    info!("                      API v{}", version);
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

/// Initialize the tracing/logging subsystem.
///
/// Client commands log to stderr so the rendered page stays alone on stdout.
fn init_logging(default_filter: &str, stderr: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if stderr {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

// =============================================================================
// Client Commands
// =============================================================================

fn build_client(args: &ClientArgs) -> Option<ApiClient> {
    init_logging(args.log_filter(), true);

    match args.client() {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Error: {}", e);
            None
        }
    }
}

async fn run_status(args: ClientArgs) -> ExitCode {
    let Some(client) = build_client(&args) else {
        return ExitCode::FAILURE;
    };

    let mut page = HomePage::new();
    let status = page.check_api_health(&client).await;
    println!("{}", layout(&page.render()));

    if status == ApiStatus::Online {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_solve(args: SolveArgs) -> ExitCode {
    let Some(client) = build_client(&args.client) else {
        return ExitCode::FAILURE;
    };

    let mut page = CalculatorPage::new().with_equation(args.equation);
    page.solve_equation(&client).await;
    finish_calculator(&page)
}

async fn run_matrix(args: MatrixArgs) -> ExitCode {
    let Some(client) = build_client(&args.client) else {
        return ExitCode::FAILURE;
    };

    let matrix = args.matrix_or_sample();
    let mut page = CalculatorPage::new().with_matrix(matrix, args.operation);
    page.perform_matrix_operation(&client).await;
    finish_calculator(&page)
}

fn finish_calculator(page: &CalculatorPage) -> ExitCode {
    println!("{}", layout(&page.render()));

    if page.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
