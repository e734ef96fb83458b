use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;

/// Default upload cap for `/api/analyze` (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables
///
/// Provider credentials are optional: the server starts without them and
/// reports their absence through `/api/debug`.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// Service-account key JSON blob
    pub google_credentials_json: Option<String>,
    pub google_cloud_project: Option<String>,
    /// Key for the secondary Generative Language path (`/api/test`)
    pub gemini_api_key: Option<String>,
    pub vertex_location: String,
    pub gemini_model: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            google_credentials_json: optional_env("GOOGLE_APPLICATION_CREDENTIALS_JSON"),
            google_cloud_project: optional_env("GOOGLE_CLOUD_PROJECT"),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            vertex_location: optional_env("VERTEX_LOCATION")
                .unwrap_or_else(|| "us-central1".to_string()),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            max_upload_bytes: match optional_env("MAX_UPLOAD_BYTES") {
                Some(raw) => raw
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a valid number")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            allowed_origins: optional_env("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
        })
    }
}

/// Empty values count as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field(
                "google_credentials_json",
                &self.google_credentials_json.as_ref().map(|_| "<set>"),
            )
            .field("google_cloud_project", &self.google_cloud_project)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("vertex_location", &self.vertex_location)
            .field("gemini_model", &self.gemini_model)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_skips_empty() {
        assert_eq!(
            parse_origins(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config {
            port: 8080,
            google_credentials_json: Some("{\"private_key\": \"secret\"}".into()),
            google_cloud_project: Some("proj".into()),
            gemini_api_key: Some("AIza-secret".into()),
            vertex_location: "us-central1".into(),
            gemini_model: "gemini-2.0-flash".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: vec![],
        };

        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("proj"));
    }
}
