//! Integration tests for `/api/debug`, `/api/test`, `/health` and CORS.

mod common;

use crate::common::TestHarness;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use flipeasy_server::kernel::{ProviderStatus, TestDependencies};
use flipeasy_server::server::build_app;
use gemini_client::GeminiError;
use test_context::test_context;
use tower::ServiceExt;

// =============================================================================
// /api/debug
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn debug_reports_missing_credentials_without_calling_provider(ctx: &TestHarness) {
    // A vision client is present but the status says nothing is configured
    let deps = TestDependencies::new()
        .with_vision_ai(ctx.vision.clone())
        .with_provider_status(ProviderStatus {
            model: "gemini-test".to_string(),
            location: "us-central1".to_string(),
            ..Default::default()
        })
        .into_server_deps();
    let app = build_app(deps, ctx.options.clone());

    let (status, body) = TestHarness::get(app, "/api/debug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_configured");
    assert_eq!(body["credentials_exist"], false);
    assert_eq!(body["project_id_exists"], false);
    assert!(body.get("provider_response").is_none());
    assert_eq!(ctx.vision.ping_count(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn debug_without_any_provider(ctx: &TestHarness) {
    let (status, body) = TestHarness::get(ctx.unconfigured_app(), "/api/debug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_configured");
    assert_eq!(body["credentials_exist"], false);
    assert_eq!(body["api_key_exists"], false);
    assert_eq!(body["client_email"], serde_json::Value::Null);
    assert_eq!(body["error"], "GOOGLE_APPLICATION_CREDENTIALS_JSON is not set");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn debug_pings_configured_provider(ctx: &TestHarness) {
    let (status, body) = TestHarness::get(ctx.app(), "/api/debug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["credentials_exist"], true);
    assert_eq!(body["credentials_valid"], true);
    assert_eq!(
        body["client_email"],
        "lister@flipeasy-test.iam.gserviceaccount.com"
    );
    assert_eq!(body["provider_response"], "OK");
    assert_eq!(body["model"], "gemini-test");
    assert_eq!(ctx.vision.ping_count(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn debug_reports_provider_failure(ctx: &TestHarness) {
    ctx.vision.clone().with_ping_error(GeminiError::Api {
        status: 403,
        body: "permission denied on project".into(),
    });

    let (status, body) = TestHarness::get(ctx.app(), "/api/debug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("403"));
    assert!(body.get("provider_response").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn debug_reports_malformed_credentials(ctx: &TestHarness) {
    let deps = TestDependencies::new()
        .with_provider_status(ProviderStatus {
            credentials_exist: true,
            credentials_valid: false,
            project_id_exists: true,
            credentials_error: Some("missing field `private_key`".to_string()),
            model: "gemini-test".to_string(),
            location: "us-central1".to_string(),
            ..Default::default()
        })
        .into_server_deps();
    let app = build_app(deps, ctx.options.clone());

    let (status, body) = TestHarness::get(app, "/api/debug").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["credentials_valid"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("missing field `private_key`"));
    assert!(body.get("credentials_error").is_none());
}

// =============================================================================
// /api/test
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn api_key_test_succeeds(ctx: &TestHarness) {
    let (status, body) = TestHarness::get(ctx.app(), "/api/test").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "success": true, "response": "OK" }));
    assert_eq!(ctx.text.prompts(), vec!["Reply with the single word: OK"]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn api_key_test_without_key(ctx: &TestHarness) {
    let (status, body) = TestHarness::get(ctx.unconfigured_app(), "/api/test").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server configuration error");
    assert_eq!(body["details"], "GEMINI_API_KEY is not set");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn api_key_test_upstream_failure(ctx: &TestHarness) {
    ctx.text
        .clone()
        .with_error(GeminiError::Network("connection reset".into()));

    let (status, body) = TestHarness::get(ctx.app(), "/api/test").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI model request failed");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .starts_with("upstream request failed: "));
}

// =============================================================================
// /health and CORS
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn health_needs_no_provider(ctx: &TestHarness) {
    let (status, body) = TestHarness::get(ctx.unconfigured_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cors_echoes_allowed_origin(ctx: &mut TestHarness) {
    ctx.options.allowed_origins = vec!["https://flipeasy.app".to_string()];

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://flipeasy.app")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://flipeasy.app"
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cors_ignores_unlisted_origin(ctx: &mut TestHarness) {
    ctx.options.allowed_origins = vec!["https://flipeasy.app".to_string()];

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://elsewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = ctx.app().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
