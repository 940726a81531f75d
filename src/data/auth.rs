//! Service-account authentication for the spreadsheet API.
//!
//! A self-signed RS256 JWT assertion is exchanged at the key's token endpoint
//! for a short-lived bearer token (OAuth 2.0 JWT bearer grant).

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::fetcher::FetchError;

/// Read-only access to the sheet, plus the drive scope the sheet is shared through.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a service-account JSON key that the token exchange needs.
/// Other fields of the key file are accepted and ignored.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// PEM-encoded RSA private key.
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
            .field("private_key", &"***REDACTED***")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    /// Sign the JWT assertion presented to the token endpoint.
    pub fn assertion(&self, issued_at: u64) -> Result<String, FetchError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let claims = Claims {
            iss: &self.client_email,
            scope: SCOPES.join(" "),
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| FetchError::Auth(format!("invalid service-account private key: {e}")))?;

        encode(&header, &claims, &key)
            .map_err(|e| FetchError::Auth(format!("signing JWT assertion: {e}")))
    }

    /// Exchange a fresh assertion for a bearer token.
    pub fn access_token(&self, client: &Client) -> Result<String, FetchError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let assertion = self.assertion(now)?;

        log::debug!("Requesting access token for {}", self.client_email);
        let resp = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(match status.as_u16() {
                400 | 401 | 403 => FetchError::Auth(format!("token request rejected ({status}): {body}")),
                code => FetchError::Status { status: code, body },
            });
        }

        resp.json::<TokenResponse>()
            .map(|t| t.access_token)
            .map_err(|e| FetchError::Malformed(format!("token response: {e}")))
    }
}
