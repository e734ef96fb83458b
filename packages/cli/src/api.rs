//! HTTP client for the FlipEasy server.

use std::time::Duration;

use listing_types::ListingAnalysis;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::image_prep::PreparedImage;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the server: {0}")]
    Network(String),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// `{ "error": ..., "details": ... }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyTest {
    pub success: bool,
    pub response: String,
}

#[derive(Clone)]
pub struct ListingApiClient {
    http: Client,
    base_url: String,
}

impl ListingApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/analyze`
    pub async fn analyze(
        &self,
        image: &PreparedImage,
        description: &str,
    ) -> Result<ListingAnalysis, ClientError> {
        let image_part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| ClientError::Decode(format!("invalid MIME type: {}", e)))?;

        let form = Form::new()
            .part("image", image_part)
            .text("description", description.to_string());

        tracing::debug!(
            bytes = image.bytes.len(),
            description_length = description.len(),
            "Submitting photo"
        );

        let response = self
            .http
            .post(self.url("/api/analyze"))
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;

        decode(response).await
    }

    /// `GET /api/debug` (free-form diagnostics JSON)
    pub async fn debug(&self) -> Result<Value, ClientError> {
        self.get("/api/debug").await
    }

    /// `GET /api/test`
    pub async fn test_api_key(&self) -> Result<ApiKeyTest, ClientError> {
        self.get("/api/test").await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<Value, ClientError> {
        self.get("/health").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(network_error)?;

        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn network_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Network("request timed out".to_string())
    } else {
        ClientError::Network(err.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;

    if !status.is_success() {
        return Err(ClientError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// `error: details` from a JSON error body, else the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => format!("{}: {}", error, details),
        Ok(ErrorBody { error, .. }) => error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_with_details() {
        let body = r#"{"error":"AI model request failed","details":"upstream status 503: busy"}"#;
        assert_eq!(
            error_message(body),
            "AI model request failed: upstream status 503: busy"
        );
    }

    #[test]
    fn test_error_message_without_details() {
        assert_eq!(
            error_message(r#"{"error":"No image provided"}"#),
            "No image provided"
        );
    }

    #[test]
    fn test_error_message_plain_body() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "no response body");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ListingApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8080/health");
    }
}
