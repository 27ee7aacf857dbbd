//! Per-client request rate limiting.
//!
//! Each client identity gets a fixed window that opens on its first request.
//! Requests are counted inside the window; once the count exceeds the limit,
//! requests are answered with `429 Too Many Requests` until the window
//! expires. Responses carry the standard `RateLimit-*` headers.
//!
//! The limiter is an ordinary value shared through `Arc`, so tests and
//! deployments can inject their own window and threshold.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// Default window length (15 minutes).
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

/// Default number of requests allowed per window.
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

/// Identity used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window
    pub max_requests: u32,

    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX,
            window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded: {} requests in window, limit is {}", .0.used, .0.limit)]
    LimitExceeded(RateLimitStatus),
}

/// Usage of a client's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,

    /// Time until the window closes
    pub reset_after: Duration,
}

impl RateLimitStatus {
    /// Seconds until reset, rounded up so clients never retry early.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

// =============================================================================
// Rate Limiter
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// In-memory fixed-window limiter keyed by client identity.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request for `identifier` and report whether it is allowed.
    pub async fn check_and_increment(
        &self,
        identifier: &str,
    ) -> Result<RateLimitStatus, RateLimitError> {
        self.check_and_increment_at(identifier, Instant::now()).await
    }

    async fn check_and_increment_at(
        &self,
        identifier: &str,
        now: Instant,
    ) -> Result<RateLimitStatus, RateLimitError> {
        let mut windows = self.windows.lock().await;

        let window = windows
            .entry(identifier.to_string())
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.duration_since(window.started) >= self.config.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        window.count = window.count.saturating_add(1);

        let status = RateLimitStatus {
            limit: self.config.max_requests,
            used: window.count,
            remaining: self.config.max_requests.saturating_sub(window.count),
            reset_after: self
                .config
                .window
                .saturating_sub(now.duration_since(window.started)),
        };

        debug!(
            "Rate limit check for '{}': {}/{} requests in current window",
            identifier, status.used, status.limit
        );

        if status.used > status.limit {
            return Err(RateLimitError::LimitExceeded(status));
        }

        Ok(status)
    }

    /// Requests counted in the current window of `identifier`, if any.
    pub async fn current_usage(&self, identifier: &str) -> Option<u32> {
        let windows = self.windows.lock().await;
        windows
            .get(identifier)
            .filter(|w| w.started.elapsed() < self.config.window)
            .map(|w| w.count)
    }

    /// Forget the current window of `identifier`.
    pub async fn reset_limit(&self, identifier: &str) {
        self.windows.lock().await.remove(identifier);
        debug!("Reset rate limit for identifier '{}'", identifier);
    }

    /// Drop every expired window and return how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now()).await
    }

    async fn cleanup_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now.duration_since(w.started) < self.config.window);
        before - windows.len()
    }

    pub fn max_requests(&self) -> u32 {
        self.config.max_requests
    }

    pub fn window(&self) -> Duration {
        self.config.window
    }
}

// =============================================================================
// Cleanup Task
// =============================================================================

/// Background task that periodically purges expired windows.
pub struct CleanupService {
    rate_limiter: Arc<RateLimiter>,
    cleanup_interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl CleanupService {
    pub fn new(rate_limiter: Arc<RateLimiter>, cleanup_interval: Duration) -> Self {
        Self {
            rate_limiter,
            cleanup_interval,
            handle: None,
        }
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Cleanup service is already running");
            return;
        }

        let rate_limiter = Arc::clone(&self.rate_limiter);
        let interval_duration = self.cleanup_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(interval_duration);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = rate_limiter.cleanup_expired().await;
                if removed > 0 {
                    debug!("Cleaned up {} expired rate limit windows", removed);
                }
            }
        });

        self.handle = Some(handle);
        info!(
            "Rate limit cleanup running every {}s",
            interval_duration.as_secs()
        );
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Rate limit cleanup stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CleanupService {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// State for [`rate_limit_middleware`].
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,

    /// Path prefix the limiter applies to (e.g. `/api`)
    pub scope: String,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`
    pub trust_proxy: bool,
}

impl RateLimitState {
    pub fn new(limiter: Arc<RateLimiter>, scope: impl Into<String>) -> Self {
        Self {
            limiter,
            scope: scope.into(),
            trust_proxy: false,
        }
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Whether `path` falls under the limiter's scope.
    pub fn in_scope(&self, path: &str) -> bool {
        let scope = self.scope.trim_end_matches('/');
        if scope.is_empty() {
            return true;
        }
        match path.strip_prefix(scope) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Count requests under the configured scope and reject the excess with 429.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.in_scope(request.uri().path()) {
        return next.run(request).await;
    }

    let identifier = client_identifier(&request, state.trust_proxy);

    match state.limiter.check_and_increment(&identifier).await {
        Ok(status) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(&mut response, &status, state.limiter.window());
            response
        }
        Err(RateLimitError::LimitExceeded(status)) => {
            debug!(
                "Rate limit exceeded for '{}': {}/{} requests",
                identifier, status.used, status.limit
            );

            let retry_after = status.reset_secs();
            let mut response = ApiError::RateLimited { retry_after }.into_response();
            add_rate_limit_headers(&mut response, &status, state.limiter.window());
            response
                .headers_mut()
                .insert(http::header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// Resolve the identity a request is counted against.
///
/// Proxy headers are only consulted when `trust_proxy` is set; otherwise the
/// peer address from `ConnectInfo` is used.
pub fn client_identifier(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(first_ip) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return first_ip.to_string();
        }

        if let Some(real_ip) = request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
        {
            return real_ip.trim().to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn add_rate_limit_headers(response: &mut Response, status: &RateLimitStatus, window: Duration) {
    let headers = response.headers_mut();
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(status.reset_secs()));

    let policy = format!("{};w={}", status.limit, window.as_secs());
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(RATELIMIT_POLICY, value);
    }
}
