//! Server dependencies (using traits for testability)
//!
//! `ServerDeps` is built once from `Config`. Missing or malformed provider
//! credentials leave the matching client unset; handlers report that as a
//! configuration error instead of failing startup.

use std::sync::Arc;

use async_trait::async_trait;
use gemini_client::{
    GeminiClient, GeminiError, GenerateContentRequest, GenerationConfig, Part, ServiceAccountAuth,
    ServiceAccountKey,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::common::ApiError;
use crate::config::Config;
use crate::domains::listings::prompt::{MAX_OUTPUT_TOKENS, PING_PROMPT, TEMPERATURE};
use crate::domains::listings::ImageUpload;
use crate::kernel::{BaseTextAI, BaseVisionAI};

// =============================================================================
// Gemini adapters (implement the Base* traits)
// =============================================================================

/// Vertex AI (service account) implementation of `BaseVisionAI`
pub struct GeminiVisionAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiVisionAdapter {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseVisionAI for GeminiVisionAdapter {
    async fn describe_image(&self, image: &ImageUpload, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest::user(vec![
            Part::inline_data(image.mime_type.clone(), &image.bytes),
            Part::text(prompt),
        ])
        .generation_config(
            GenerationConfig::default()
                .temperature(TEMPERATURE)
                .max_output_tokens(MAX_OUTPUT_TOKENS),
        );

        self.client.generate_text(&self.model, &request).await
    }

    async fn ping(&self) -> Result<String, GeminiError> {
        self.client
            .generate_text(&self.model, &GenerateContentRequest::text(PING_PROMPT))
            .await
    }
}

/// API-key implementation of `BaseTextAI`
pub struct GeminiTextAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiTextAdapter {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseTextAI for GeminiTextAdapter {
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest::text(prompt)
            .generation_config(GenerationConfig::default().temperature(0.0).max_output_tokens(64));

        self.client.generate_text(&self.model, &request).await
    }
}

// =============================================================================
// Provider status
// =============================================================================

/// What is configured. Presence flags only; never secret values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderStatus {
    pub credentials_exist: bool,
    pub credentials_valid: bool,
    pub project_id_exists: bool,
    pub api_key_exists: bool,
    /// Service account email (an identifier, not a secret)
    pub client_email: Option<String>,
    #[serde(skip)]
    pub credentials_error: Option<String>,
    pub model: String,
    pub location: String,
}

impl ProviderStatus {
    /// Whether the service-account path has everything it needs.
    pub fn vision_configured(&self) -> bool {
        self.credentials_exist && self.credentials_valid && self.project_id_exists
    }

    /// Operator-facing reason the vision model is unavailable.
    pub fn missing_reason(&self) -> String {
        if !self.credentials_exist {
            "GOOGLE_APPLICATION_CREDENTIALS_JSON is not set".to_string()
        } else if let Some(err) = &self.credentials_error {
            format!("Service account credentials are invalid: {}", err)
        } else if !self.project_id_exists {
            "GOOGLE_CLOUD_PROJECT is not set".to_string()
        } else {
            "Vision model is not configured".to_string()
        }
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    /// Service-account path used by `/api/analyze` and `/api/debug`
    pub vision_ai: Option<Arc<dyn BaseVisionAI>>,
    /// API-key path used by `/api/test`
    pub text_ai: Option<Arc<dyn BaseTextAI>>,
    pub provider_status: ProviderStatus,
}

impl ServerDeps {
    pub fn new(
        vision_ai: Option<Arc<dyn BaseVisionAI>>,
        text_ai: Option<Arc<dyn BaseTextAI>>,
        provider_status: ProviderStatus,
    ) -> Self {
        Self {
            vision_ai,
            text_ai,
            provider_status,
        }
    }

    /// Build real Gemini clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut status = ProviderStatus {
            credentials_exist: config.google_credentials_json.is_some(),
            project_id_exists: config.google_cloud_project.is_some(),
            api_key_exists: config.gemini_api_key.is_some(),
            model: config.gemini_model.clone(),
            location: config.vertex_location.clone(),
            ..Default::default()
        };

        let auth = match config.google_credentials_json.as_deref() {
            Some(json) => match ServiceAccountKey::from_json(json).and_then(ServiceAccountAuth::new) {
                Ok(auth) => {
                    status.credentials_valid = true;
                    status.client_email = Some(auth.client_email().to_string());
                    Some(auth)
                }
                Err(e) => {
                    warn!(error = %e, "Service account credentials could not be loaded");
                    status.credentials_error = Some(e.to_string());
                    None
                }
            },
            None => None,
        };

        let vision_ai: Option<Arc<dyn BaseVisionAI>> =
            match (auth, config.google_cloud_project.as_deref()) {
                (Some(auth), Some(project_id)) => {
                    info!(
                        client_email = ?status.client_email,
                        location = %config.vertex_location,
                        model = %config.gemini_model,
                        "Vertex AI vision client configured"
                    );
                    let client = GeminiClient::vertex(auth, project_id, &config.vertex_location);
                    Some(Arc::new(GeminiVisionAdapter::new(client, &config.gemini_model))
                        as Arc<dyn BaseVisionAI>)
                }
                _ => {
                    warn!(
                        reason = %status.missing_reason(),
                        "Vision model unavailable; /api/analyze will return configuration errors"
                    );
                    None
                }
            };

        let text_ai: Option<Arc<dyn BaseTextAI>> = config.gemini_api_key.as_deref().map(|key| {
            Arc::new(GeminiTextAdapter::new(
                GeminiClient::from_api_key(key),
                &config.gemini_model,
            )) as Arc<dyn BaseTextAI>
        });

        Self::new(vision_ai, text_ai, status)
    }

    pub fn require_vision_ai(&self) -> Result<Arc<dyn BaseVisionAI>, ApiError> {
        self.vision_ai
            .clone()
            .ok_or_else(|| ApiError::Config(self.provider_status.missing_reason()))
    }

    pub fn require_text_ai(&self) -> Result<Arc<dyn BaseTextAI>, ApiError> {
        self.text_ai
            .clone()
            .ok_or_else(|| ApiError::Config("GEMINI_API_KEY is not set".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

    fn config() -> Config {
        Config {
            port: 8080,
            google_credentials_json: None,
            google_cloud_project: None,
            gemini_api_key: None,
            vertex_location: "us-central1".into(),
            gemini_model: "gemini-2.0-flash".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: vec![],
        }
    }

    #[test]
    fn test_missing_credentials_leave_vision_unset() {
        let deps = ServerDeps::from_config(&config());

        assert!(deps.vision_ai.is_none());
        assert!(!deps.provider_status.credentials_exist);
        assert!(matches!(deps.require_vision_ai(), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_malformed_credentials_are_reported_without_contents() {
        let deps = ServerDeps::from_config(&Config {
            google_credentials_json: Some("{\"private_key\": \"hunter2\"".into()),
            google_cloud_project: Some("flipeasy".into()),
            ..config()
        });

        assert!(deps.vision_ai.is_none());
        assert!(deps.provider_status.credentials_exist);
        assert!(!deps.provider_status.credentials_valid);

        let reason = deps.provider_status.missing_reason();
        assert!(reason.starts_with("Service account credentials are invalid"));
        assert!(!reason.contains("hunter2"));
    }

    #[test]
    fn test_api_key_enables_text_path() {
        let deps = ServerDeps::from_config(&Config {
            gemini_api_key: Some("AIza-test".into()),
            ..config()
        });

        assert!(deps.text_ai.is_some());
        assert!(deps.provider_status.api_key_exists);
    }
}
