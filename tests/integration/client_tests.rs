//! API client and page model tests against a live server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use reqwest::RequestBuilder;

use private_calculator::pages::{
    ApiStatus, CalculationResult, CalculatorPage, HomePage, EMPTY_EQUATION_MESSAGE,
};
use private_calculator::{ApiClient, ClientError, RequestInterceptor};

use super::test_utils::TestServer;

// =============================================================================
// ApiClient
// =============================================================================

#[tokio::test]
async fn test_check_health() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let health = client.check_health().await.unwrap();
    assert_eq!(health.status, "OK");
    assert_eq!(health.message, "API is running");
}

#[tokio::test]
async fn test_solve_equation() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let answer = client.solve_equation("2x + 3 = 7").await.unwrap();
    assert_eq!(answer.received_equation, "2x + 3 = 7");
    assert_eq!(answer.solution, "Feature in development");
    assert_eq!(answer.steps.len(), 3);
}

#[tokio::test]
async fn test_perform_matrix_operation() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let answer = client
        .perform_matrix_operation(&[vec![2.0, 3.0], vec![1.0, -1.0]], "solve")
        .await
        .unwrap();
    assert_eq!(answer.operation, "solve");
    assert_eq!(
        serde_json::to_string(&answer.received_matrix).unwrap(),
        "[[2,3],[1,-1]]"
    );
}

#[tokio::test]
async fn test_validation_error_carries_server_message() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let err = client
        .post::<_, serde_json::Value>("/calculator/solve", &serde_json::json!({}))
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Equation is required");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_endpoint_is_not_found() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let err = client
        .get::<serde_json::Value>("/missing")
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Route /api/missing not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_dedicated_error() {
    let router = Router::new().route(
        "/api/health",
        get(|| async { (StatusCode::UNAUTHORIZED, "denied") }),
    );
    let server = TestServer::start(router).await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let err = client.check_health().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
}

#[tokio::test]
async fn test_timeout() {
    let router = Router::new().route(
        "/api/health",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let server = TestServer::start(router).await;
    let client = ApiClient::with_timeout(&server.api_url(), Duration::from_millis(200)).unwrap();

    let err = client.check_health().await.unwrap_err();
    match err {
        ClientError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {:?}", other),
    }
}

struct CountingInterceptor(Arc<AtomicUsize>);

impl RequestInterceptor for CountingInterceptor {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        self.0.fetch_add(1, Ordering::SeqCst);
        request.header("x-request-source", "tests")
    }
}

#[tokio::test]
async fn test_interceptor_sees_every_request() {
    let server = TestServer::calculator().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let client = ApiClient::new(&server.api_url())
        .unwrap()
        .with_interceptor(CountingInterceptor(Arc::clone(&calls)));

    client.check_health().await.unwrap();
    client.solve_equation("x = 1").await.unwrap();
    let _ = client.get::<serde_json::Value>("/missing").await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_home_page_online() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let mut page = HomePage::new();
    assert_eq!(page.check_api_health(&client).await, ApiStatus::Online);
    assert!(page.render().contains("API Online"));
}

#[tokio::test]
async fn test_calculator_page_solve() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let mut page = CalculatorPage::new().with_equation("2x + 3 = 7");
    page.solve_equation(&client).await;

    assert!(page.error().is_none());
    assert!(!page.is_loading());
    match page.result() {
        Some(CalculationResult::Equation(answer)) => {
            assert_eq!(answer.received_equation, "2x + 3 = 7");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(page.render().contains("Feature in development"));
}

#[tokio::test]
async fn test_calculator_page_sample_matrix() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let mut page = CalculatorPage::new();
    page.perform_matrix_operation(&client).await;

    match page.result() {
        Some(CalculationResult::Matrix(answer)) => {
            assert_eq!(answer.operation, "solve");
            assert_eq!(answer.received_matrix.len(), 2);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_calculator_page_keeps_result_after_failure() {
    let server = TestServer::calculator().await;
    let client = ApiClient::new(&server.api_url()).unwrap();

    let mut page = CalculatorPage::new().with_equation("x = 1");
    page.solve_equation(&client).await;
    assert!(page.result().is_some());

    // An empty operation is rejected by the server
    page.operation = String::new();
    page.perform_matrix_operation(&client).await;
    assert!(page.error().is_some());
    assert!(matches!(
        page.result(),
        Some(CalculationResult::Equation(_))
    ));

    page.equation = " ".to_string();
    page.solve_equation(&client).await;
    assert_eq!(page.error(), Some(EMPTY_EQUATION_MESSAGE));
}
