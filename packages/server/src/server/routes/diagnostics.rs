//! Provider diagnostics: `/api/debug` (service-account path) and `/api/test`
//! (API-key path).

use axum::{extract::Extension, Json};
use gemini_client::truncate_to_char_boundary;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::ApiError;
use crate::domains::listings::prompt::PING_PROMPT;
use crate::kernel::ProviderStatus;
use crate::server::app::AxumAppState;

const PREVIEW_BYTES: usize = 200;
const ERROR_BYTES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugStatus {
    Ok,
    Error,
    NotConfigured,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub status: DebugStatus,
    #[serde(flatten)]
    pub provider: ProviderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DebugResponse {
    fn new(status: DebugStatus, provider: ProviderStatus) -> Self {
        Self {
            status,
            provider,
            provider_response: None,
            error: None,
        }
    }
}

/// `GET /api/debug` - always 200. Skips the upstream call when the
/// service-account path is not fully configured.
pub async fn debug_handler(Extension(state): Extension<AxumAppState>) -> Json<DebugResponse> {
    let provider = state.deps.provider_status.clone();

    let ai = match state.deps.require_vision_ai() {
        Ok(ai) if provider.vision_configured() => ai,
        _ => {
            let status = if provider.credentials_exist && !provider.credentials_valid {
                DebugStatus::Error
            } else {
                DebugStatus::NotConfigured
            };
            let mut response = DebugResponse::new(status, provider);
            response.error = Some(response.provider.missing_reason());
            return Json(response);
        }
    };

    match ai.ping().await {
        Ok(reply) => {
            info!(response_length = reply.len(), "Provider ping succeeded");
            let mut response = DebugResponse::new(DebugStatus::Ok, provider);
            response.provider_response =
                Some(truncate_to_char_boundary(reply.trim(), PREVIEW_BYTES).to_string());
            Json(response)
        }
        Err(e) => {
            warn!(error = %e, "Provider ping failed");
            let mut response = DebugResponse::new(DebugStatus::Error, provider);
            response.error = Some(truncate_to_char_boundary(&e.to_string(), ERROR_BYTES).to_string());
            Json(response)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderTestResponse {
    pub success: bool,
    pub response: String,
}

/// `GET /api/test` - one trivial prompt over the API-key path.
pub async fn provider_test_handler(
    Extension(state): Extension<AxumAppState>,
) -> Result<Json<ProviderTestResponse>, ApiError> {
    let ai = state.deps.require_text_ai()?;
    let reply = ai.complete(PING_PROMPT).await?;

    info!(response_length = reply.len(), "API key test call succeeded");

    Ok(Json(ProviderTestResponse {
        success: true,
        response: reply.trim().to_string(),
    }))
}
