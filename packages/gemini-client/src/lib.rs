//! Pure Gemini REST client
//!
//! A minimal client for the `generateContent` API with no domain-specific logic.
//! Two ways to authenticate:
//!
//! - **Vertex AI**: a service-account key (OAuth2 JWT bearer grant) plus a
//!   project id and region.
//! - **API key**: the Generative Language endpoint with an `x-goog-api-key`.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, GenerateContentRequest, GenerationConfig, Part};
//!
//! let client = GeminiClient::from_api_key(std::env::var("GEMINI_API_KEY")?);
//!
//! let text = client
//!     .generate_text(
//!         "gemini-2.0-flash",
//!         &GenerateContentRequest::user(vec![
//!             Part::inline_data("image/jpeg", &jpeg_bytes),
//!             Part::text("What is in this photo?"),
//!         ])
//!         .generation_config(GenerationConfig::default().temperature(0.3)),
//!     )
//!     .await?;
//! ```

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{AccessToken, ServiceAccountAuth, ServiceAccountKey, CLOUD_PLATFORM_SCOPE};
pub use error::{GeminiError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const GENERATIVE_LANGUAGE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upstream calls with images can be slow; cap them well above typical latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
enum Endpoint {
    Vertex {
        auth: ServiceAccountAuth,
        project_id: String,
        location: String,
    },
    ApiKey {
        api_key: String,
    },
}

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    endpoint: Endpoint,
    base_url: String,
}

impl GeminiClient {
    /// Create a Vertex AI client authenticated with a service account.
    pub fn vertex(
        auth: ServiceAccountAuth,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            http_client: build_http_client(),
            base_url: format!("https://{}-aiplatform.googleapis.com/v1", location),
            endpoint: Endpoint::Vertex {
                auth,
                project_id: project_id.into(),
                location,
            },
        }
    }

    /// Create a Vertex AI client from a service-account JSON blob.
    pub fn vertex_from_json(
        credentials_json: &str,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self> {
        let key = ServiceAccountKey::from_json(credentials_json)?;
        let auth = ServiceAccountAuth::new(key)?;
        Ok(Self::vertex(auth, project_id, location))
    }

    /// Create a Generative Language client authenticated with an API key.
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        Self {
            http_client: build_http_client(),
            base_url: GENERATIVE_LANGUAGE_BASE_URL.to_string(),
            endpoint: Endpoint::ApiKey {
                api_key: api_key.into(),
            },
        }
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::from_api_key(api_key))
    }

    /// Set a custom base URL (for proxies, emulators, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Service account email, when using Vertex AI.
    pub fn client_email(&self) -> Option<&str> {
        match &self.endpoint {
            Endpoint::Vertex { auth, .. } => Some(auth.client_email()),
            Endpoint::ApiKey { .. } => None,
        }
    }

    /// Full `generateContent` URL for a model.
    pub fn model_url(&self, model: &str) -> String {
        match &self.endpoint {
            Endpoint::Vertex {
                project_id,
                location,
                ..
            } => format!(
                "{}/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                self.base_url, project_id, location, model
            ),
            Endpoint::ApiKey { .. } => {
                format!("{}/models/{}:generateContent", self.base_url, model)
            }
        }
    }

    /// Call `generateContent`.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let start = std::time::Instant::now();
        let url = self.model_url(model);

        let builder = match &self.endpoint {
            Endpoint::Vertex { auth, .. } => {
                let token = auth.access_token(&self.http_client).await?;
                self.http_client.post(&url).bearer_auth(token)
            }
            Endpoint::ApiKey { api_key } => {
                self.http_client.post(&url).header("x-goog-api-key", api_key)
            }
        };

        let response = builder.json(request).send().await.map_err(|e| {
            warn!(error = %e, model = %model, "Gemini request failed");
            GeminiError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis(),
            candidates = body.candidates.len(),
            "Gemini generateContent"
        );

        Ok(body)
    }

    /// Call `generateContent` and return the first candidate's text.
    pub async fn generate_text(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String> {
        let response = self.generate_content(model, request).await?;

        response.text().ok_or_else(|| match response.block_reason() {
            Some(reason) => GeminiError::Parse(format!("Prompt blocked: {}", reason)),
            None => GeminiError::Parse("No text in Gemini response".into()),
        })
    }
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}
