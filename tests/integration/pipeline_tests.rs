//! Middleware pipeline tests: security headers, CORS, rate limiting, body
//! limits, panic recovery and development-mode error detail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::{middleware, routing, Router};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use private_calculator::server::{error_middleware, panic_response, ErrorHandling};
use private_calculator::{create_router, create_router_with_limiter, RateLimiter};

use super::test_utils::{body_json, get, post_json, test_config, test_router};

// =============================================================================
// Security Headers
// =============================================================================

#[tokio::test]
async fn test_security_headers_on_every_response() {
    for uri in ["/health", "/api/health", "/missing"] {
        let response = test_router().oneshot(get(uri)).await.unwrap();
        let headers = response.headers();

        assert_eq!(headers["x-content-type-options"], "nosniff", "{}", uri);
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN", "{}", uri);
        assert_eq!(headers["x-xss-protection"], "0", "{}", uri);
        assert!(headers.contains_key("content-security-policy"), "{}", uri);
        assert!(headers.contains_key("strict-transport-security"), "{}", uri);
    }
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:8080")
        .body(Body::empty())
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:8080"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_rejects_other_origin() {
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_cors_preflight() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/calculator/solve")
        .header(header::ORIGIN, "http://localhost:8080")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-custom")
        .body(Body::empty())
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("PATCH"));
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "content-type,x-custom"
    );
}

// =============================================================================
// Rate Limiting
// =============================================================================

#[tokio::test]
async fn test_101st_api_request_is_rate_limited() {
    let router = test_router();

    for i in 1..=100 {
        let response = router.clone().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {}", i);
    }

    let response = router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(response.headers()["ratelimit-remaining"], "0");

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(json["status"], 429);
    assert_eq!(
        json["message"],
        "Too many requests from this IP, please try again later."
    );
}

#[tokio::test]
async fn test_rate_limit_headers() {
    let router = create_router(test_config().with_rate_limit(10, Duration::from_secs(60)));

    let response = router.oneshot(get("/api")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["ratelimit-limit"], "10");
    assert_eq!(headers["ratelimit-remaining"], "9");
    assert_eq!(headers["ratelimit-policy"], "10;w=60");
    assert!(headers.contains_key("ratelimit-reset"));
}

#[tokio::test]
async fn test_rate_limit_only_applies_to_api() {
    let router = create_router(test_config().with_rate_limit(1, Duration::from_secs(60)));

    for _ in 0..5 {
        let response = router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("ratelimit-limit"));
    }

    let response = router.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

/// Counts WARN events seen by the thread's subscriber.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn test_rate_limited_request_warns_once() {
    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let router = create_router(test_config().with_rate_limit(1, Duration::from_secs(60)));

    let response = router.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(warnings.load(Ordering::SeqCst), 0);

    let response = router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(warnings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rate_limit_is_per_client_behind_proxy() {
    let limiter = Arc::new(RateLimiter::new(
        test_config()
            .with_rate_limit(2, Duration::from_secs(60))
            .rate_limit,
    ));
    let router = create_router_with_limiter(
        test_config().with_trust_proxy(true),
        Arc::clone(&limiter),
    );

    let from = |ip: &str| {
        Request::builder()
            .uri("/api/health")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = router.clone().oneshot(from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = router.clone().oneshot(from("10.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = router.oneshot(from("10.0.0.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(limiter.current_usage("10.0.0.1").await, Some(3));
    assert_eq!(limiter.current_usage("10.0.0.2").await, Some(1));
}

// =============================================================================
// Body Limits
// =============================================================================

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let router = create_router(test_config().with_body_limit(64));
    let equation = "x".repeat(200);
    let body = format!(r#"{{"equation":"{}"}}"#, equation);

    let response = router
        .oneshot(post_json("/api/calculator/solve", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(json["status"], 413);
    assert_eq!(json["message"], "File size too large");
}

// =============================================================================
// Panic Recovery
// =============================================================================

async fn exploding() -> &'static str {
    panic!("calculator exploded")
}

fn panicking_router(expose_detail: bool) -> Router {
    Router::new()
        .route("/boom", routing::get(exploding))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            ErrorHandling::new(expose_detail),
            error_middleware,
        ))
}

#[tokio::test]
async fn test_panic_is_finalized_by_error_stage() {
    let response = panicking_router(true).oneshot(get("/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(json["status"], 500);
    assert_eq!(json["message"], "calculator exploded");
    let stack = json["stack"].as_str().unwrap();
    assert!(stack.contains("Internal"));
}

#[tokio::test]
async fn test_panic_hides_stack_in_production() {
    let response = panicking_router(false).oneshot(get("/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["message"], "calculator exploded");
    assert!(json.get("stack").is_none());
}

// =============================================================================
// Error Detail
// =============================================================================

#[tokio::test]
async fn test_development_mode_exposes_stack() {
    let router = create_router(test_config().with_error_detail(true));

    let response = router
        .oneshot(post_json("/api/calculator/solve", r#"{"equation":[1]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid data format");
    let stack = json["stack"].as_str().unwrap();
    assert!(stack.contains("InvalidData"));
}

#[tokio::test]
async fn test_production_mode_hides_stack() {
    let response = test_router()
        .oneshot(post_json("/api/calculator/solve", r#"{"equation":[1]}"#))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["message"], "Invalid data format");
    assert!(json.get("stack").is_none());
}

#[tokio::test]
async fn test_route_validation_is_not_enveloped_in_development() {
    let router = create_router(test_config().with_error_detail(true));

    let response = router
        .oneshot(post_json("/api/calculator/solve", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Bad Request");
    assert!(json.get("stack").is_none());
}
