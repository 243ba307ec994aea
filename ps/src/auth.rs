//! Service-account authentication for the Sheets API
//!
//! Signs an RS256 JWT with the service account's private key and exchanges it
//! at the token endpoint for a short-lived OAuth2 access token. Tokens are
//! cached until shortly before they expire.

use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::StoreError;

/// OAuth2 scopes needed to read, append and add worksheets
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file that matter for signing
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse an inline JSON key
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        debug!(len = json.len(), "ServiceAccountKey::from_json: called");
        serde_json::from_str(json).map_err(|e| StoreError::Credentials(format!("Invalid service account JSON: {}", e)))
    }

    /// Read and parse a key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "ServiceAccountKey::from_file: called");
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Credentials(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Hands out access tokens for a service account, refreshing as needed
pub struct TokenProvider {
    key: ServiceAccountKey,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, http: Client) -> Self {
        debug!(client_email = %key.client_email, "TokenProvider::new: called");
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Service account e-mail (the identity the sheet must be shared with)
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Get a valid access token, exchanging a fresh JWT if the cache is stale
    pub async fn access_token(&self) -> Result<String, StoreError> {
        let now = Utc::now().timestamp();
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && token.expires_at - EXPIRY_MARGIN_SECS > now
        {
            debug!("access_token: using cached token");
            return Ok(token.value.clone());
        }

        debug!("access_token: cache empty or stale, exchanging JWT");
        let token = self.exchange(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn sign_assertion(&self, now: i64) -> Result<String, StoreError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("Invalid private key: {}", e)))?;

        jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|e| StoreError::Credentials(format!("Failed to sign JWT: {}", e)))
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken, StoreError> {
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "exchange: token endpoint rejected assertion");
            let message = match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}: {}", status.as_u16(), text),
            };
            return Err(StoreError::Auth(message));
        }

        let text = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| StoreError::InvalidResponse(format!("Malformed token response: {}", e)))?;
        let expires_in = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        info!(client_email = %self.key.client_email, expires_in, "Obtained Sheets access token");

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_key_from_json_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "bot@example.iam.gserviceaccount.com", "private_key": "pem", "type": "service_account"}"#,
        )
        .unwrap();
        assert_eq!(key.client_email, "bot@example.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(key.private_key_id.is_none());
    }

    #[test]
    fn test_key_from_json_rejects_missing_fields() {
        let result = ServiceAccountKey::from_json(r#"{"client_email": "bot@example.com"}"#);
        assert!(matches!(result, Err(StoreError::Credentials(_))));
    }

    #[test]
    fn test_key_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"client_email": "a@b.test", "private_key": "pem", "token_uri": "http://127.0.0.1:1/token"}}"#
        )
        .unwrap();

        let key = ServiceAccountKey::from_file(file.path()).unwrap();
        assert_eq!(key.token_uri, "http://127.0.0.1:1/token");
    }

    #[test]
    fn test_key_from_missing_file() {
        let result = ServiceAccountKey::from_file("/nonexistent/service_account.json");
        assert!(matches!(result, Err(StoreError::Credentials(_))));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key = ServiceAccountKey::from_json(r#"{"client_email": "a@b.test", "private_key": "SECRET"}"#).unwrap();
        assert!(!format!("{:?}", key).contains("SECRET"));
    }

    #[tokio::test]
    async fn test_invalid_private_key_is_credentials_error() {
        let key = ServiceAccountKey::from_json(r#"{"client_email": "a@b.test", "private_key": "not a pem"}"#).unwrap();
        let provider = TokenProvider::new(key, Client::new());
        let result = provider.access_token().await;
        assert!(matches!(result, Err(StoreError::Credentials(_))));
    }
}
