//! Test harness: the real router over mock AI providers, driven in-process.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use flipeasy_server::kernel::{MockTextAI, MockVisionAI, ProviderStatus, TestDependencies};
use flipeasy_server::server::{build_app, AppOptions};
use serde_json::Value;
use test_context::AsyncTestContext;
use tower::ServiceExt;

/// Mocks are shared handles; queue replies on them before sending requests.
pub struct TestHarness {
    pub vision: MockVisionAI,
    pub text: MockTextAI,
    pub options: AppOptions,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            vision: MockVisionAI::new(),
            text: MockTextAI::new(),
            options: AppOptions::default(),
        }
    }
}

impl TestHarness {
    /// Router with both provider paths configured.
    pub fn app(&self) -> Router {
        let deps = TestDependencies::new()
            .with_vision_ai(self.vision.clone())
            .with_text_ai(self.text.clone())
            .into_server_deps();
        build_app(deps, self.options.clone())
    }

    /// Router for an environment with no provider credentials at all.
    pub fn unconfigured_app(&self) -> Router {
        let deps = TestDependencies::new()
            .with_provider_status(ProviderStatus {
                model: "gemini-test".to_string(),
                location: "us-central1".to_string(),
                ..Default::default()
            })
            .into_server_deps();
        build_app(deps, self.options.clone())
    }

    /// Send one request and decode the JSON response body.
    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        Self::send(app, request).await
    }
}
