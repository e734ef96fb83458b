use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gemini_client::{truncate_to_char_boundary, GeminiError};
use serde::Serialize;
use thiserror::Error;

/// Upstream bodies are clipped before they reach a client.
const UPSTREAM_BODY_LIMIT: usize = 500;

/// Errors returned by the HTTP API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No image provided")]
    NoImage,

    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    #[error("Image too large: {0}")]
    ImageTooLarge(String),

    /// Missing or unusable provider credentials. Needs an operator.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model endpoint (or its token exchange) failed.
    #[error("Upstream error: {body}")]
    Upstream { status: Option<u16>, body: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{ "error": ..., "details": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoImage | ApiError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            ApiError::ImageTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Config(_) | ApiError::Upstream { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            ApiError::NoImage => ("No image provided", None),
            ApiError::InvalidForm(msg) => ("Invalid form data", Some(msg.clone())),
            ApiError::ImageTooLarge(msg) => ("Image too large", Some(msg.clone())),
            ApiError::Config(msg) => ("Server configuration error", Some(msg.clone())),
            ApiError::Upstream { status, body } => {
                let body = truncate_to_char_boundary(body, UPSTREAM_BODY_LIMIT);
                let details = match status {
                    Some(status) => format!("upstream status {}: {}", status, body),
                    None => format!("upstream request failed: {}", body),
                };
                ("AI model request failed", Some(details))
            }
            ApiError::Internal(_) => ("Internal server error", None),
        };

        ErrorBody {
            error: error.to_string(),
            details,
        }
    }
}

impl From<GeminiError> for ApiError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Config(msg) => ApiError::Config(msg),
            GeminiError::Api { status, body } => ApiError::Upstream {
                status: Some(status),
                body,
            },
            other => ApiError::Upstream {
                status: None,
                body: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::info!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}
