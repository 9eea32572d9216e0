//! Basic-Auth gate in front of the quiz pipeline.

use crate::config::BasicAuthSecrets;
use crate::ingress::HeaderBag;
use crate::types::*;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;

const BASIC_PREFIX: &str = "Basic ";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Parses an `Authorization` header value of the form `Basic base64(user:pass)`.
    pub fn from_header(value: &str) -> Result<Self> {
        let encoded = match value.strip_prefix(BASIC_PREFIX) {
            Some(e) => e.trim(),
            None => return Err(QuizError::AuthMissing.into()),
        };

        let decoded = BASE64
            .decode(encoded)
            .map_err(|e| QuizError::AuthMalformed(format!("invalid base64: {}", e)))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| QuizError::AuthMalformed("credentials are not valid UTF-8".into()))?;

        // Only the first colon separates; passwords may contain more.
        let (username, password) = match decoded.split_once(':') {
            Some(pair) => pair,
            None => {
                return Err(QuizError::AuthMalformed("missing ':' separator".into()).into());
            }
        };

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Checks the inbound `Authorization` header against the configured secrets and
/// returns the authenticated username.
pub fn authenticate(headers: &HeaderBag, secrets: &BasicAuthSecrets) -> Result<String> {
    let (expected_user, expected_pass) = match (&secrets.username, &secrets.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => {
            tracing::error!("Basic auth is enabled but BASIC_AUTH_USERNAME/BASIC_AUTH_PASSWORD are not set");
            return Err(QuizError::Config("Authentication configuration error".into()).into());
        }
    };

    let header = match headers.get("Authorization") {
        Some(h) => h,
        None => return Err(QuizError::AuthMissing.into()),
    };

    let credentials = Credentials::from_header(header)?;

    if credentials.username != *expected_user || credentials.password != *expected_pass {
        tracing::warn!(user = %credentials.username, "Rejected Basic auth credentials");
        return Err(QuizError::AuthInvalid.into());
    }

    Ok(credentials.username)
}
