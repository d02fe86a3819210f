use crate::config::ConfigError;
use crate::error::{AccountError, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    /// Claims expiring `ttl` from now. Fails when the expiry does not fit
    /// in a unix timestamp.
    pub fn new(subject: String, ttl: Duration) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| {
                AccountError::TokenIssue(format!("token lifetime of {:?} is out of range", ttl))
            })?;

        Ok(Self {
            sub: subject,
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
        })
    }
}

/// Issues HS256 bearer tokens signed with the process-wide JWT secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> std::result::Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::new("JWT secret must not be empty", "JWT_SECRET"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    pub fn issue_token(&self, subject: &str) -> Result<String> {
        let claims = Claims::new(subject.to_string(), self.ttl).map_err(|e| {
            tracing::error!(error = %e, "failed to build token claims");
            e
        })?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            AccountError::TokenIssue(e.to_string())
        })
    }

    /// Check signature and expiry and return the embedded claims
    pub fn verify_token(
        &self,
        token: &str,
    ) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}
