//! Service-account OAuth2 (JWT bearer grant).
//!
//! Signs an RS256 assertion with the service account's private key and
//! exchanges it at the key's `token_uri` for a short-lived access token.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{GeminiError, Result};

/// Scope for Vertex AI and other Google Cloud platform APIs.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertions are valid for one hour, the maximum Google accepts.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Cached tokens are replaced this long before they expire.
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The JSON key file downloaded for a service account.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GeminiError::Config(format!("Invalid service account JSON: {}", e)))
    }
}

// Never print the private key.
impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// JWT claims for the bearer grant.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn new(token: &AccessToken, fetched_at: DateTime<Utc>) -> Self {
        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Self {
            access_token: token.access_token.clone(),
            expires_at: fetched_at + Duration::seconds(lifetime as i64),
        }
    }

    fn usable_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Exchanges signed assertions for access tokens and caches them until
/// shortly before expiry. Clones share the cache.
#[derive(Clone)]
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    /// Create an authenticator for the cloud-platform scope.
    ///
    /// Fails if the private key is not a valid RSA PEM.
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| GeminiError::Auth(format!("Invalid service account private key: {}", e)))?;

        Ok(Self {
            key,
            encoding_key,
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            cached: Arc::new(Mutex::new(None)),
        })
    }

    /// Override the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Service account email (safe to display).
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Build the claims for an assertion issued at `now`.
    pub fn claims(&self, now: DateTime<Utc>) -> AssertionClaims {
        AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        }
    }

    /// Sign an assertion issued at `now`.
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &self.claims(now), &self.encoding_key)
            .map_err(|e| GeminiError::Auth(format!("Failed to sign assertion: {}", e)))
    }

    /// Bearer token for the next request: the cached one while it is still
    /// valid, otherwise a freshly exchanged one.
    pub async fn access_token(&self, http_client: &Client) -> Result<String> {
        // Held across the exchange so concurrent callers share one refresh
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.usable_at(Utc::now())) {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch_token(http_client).await?;
        let entry = CachedToken::new(&token, Utc::now());
        let access_token = entry.access_token.clone();
        *cached = Some(entry);

        Ok(access_token)
    }

    /// Fetch a fresh access token, bypassing the cache.
    pub async fn fetch_token(&self, http_client: &Client) -> Result<AccessToken> {
        let assertion = self.signed_assertion(Utc::now())?;

        let response = http_client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Token request failed");
                GeminiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Token exchange rejected");
            return Err(GeminiError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, error_text
            )));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(format!("Invalid token response: {}", e)))?;

        debug!(
            client_email = %self.key.client_email,
            expires_in = ?token.expires_in,
            "Access token fetched"
        );

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_JSON: &str = r#"{
        "type": "service_account",
        "project_id": "flipeasy-dev",
        "private_key_id": "abc123",
        "private_key": "not a pem",
        "client_email": "lister@flipeasy-dev.iam.gserviceaccount.com"
    }"#;

    #[test]
    fn test_parse_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        assert_eq!(key.client_email, "lister@flipeasy-dev.iam.gserviceaccount.com");
        assert_eq!(key.project_id.as_deref(), Some("flipeasy-dev"));
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_parse_key_missing_fields() {
        let err = ServiceAccountKey::from_json(r#"{"type": "service_account"}"#).unwrap_err();
        assert!(matches!(err, GeminiError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let printed = format!("{:?}", key);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("not a pem"));
    }

    #[test]
    fn test_cached_token_refreshes_before_expiry() {
        let fetched_at = Utc::now();
        let token = AccessToken {
            access_token: "ya29.test".to_string(),
            expires_in: Some(3599),
            token_type: Some("Bearer".to_string()),
        };
        let cached = CachedToken::new(&token, fetched_at);

        assert!(cached.usable_at(fetched_at));
        assert!(cached.usable_at(fetched_at + Duration::seconds(3500)));
        assert!(!cached.usable_at(fetched_at + Duration::seconds(3540)));
    }

    #[test]
    fn test_cached_token_defaults_to_one_hour() {
        let fetched_at = Utc::now();
        let token = AccessToken {
            access_token: "ya29.test".to_string(),
            expires_in: None,
            token_type: None,
        };

        let cached = CachedToken::new(&token, fetched_at);
        assert_eq!(cached.expires_at, fetched_at + Duration::seconds(3600));
    }

    #[test]
    fn test_invalid_pem_is_auth_error() {
        let key = ServiceAccountKey::from_json(KEY_JSON).unwrap();
        let err = ServiceAccountAuth::new(key).err().unwrap();
        assert!(matches!(err, GeminiError::Auth(_)));
    }
}
