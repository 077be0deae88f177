//! services/api/src/adapters/jwt.rs
//!
//! HS256 JSON Web Tokens behind the `TokenIssuer` port.

use std::time::Duration;

use chrono::Utc;
use course_enrollment_core::domain::TokenClaims;
use course_enrollment_core::ports::{PortError, PortResult, TokenIssuer};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject (user ID).
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// Signs and validates access tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, subject_id: &str, email: &str) -> PortResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> PortResult<TokenClaims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| {
                debug!("Rejected token: {}", e);
                PortError::Unauthorized
            },
        )?;

        Ok(TokenClaims {
            subject_id: data.claims.sub,
            email: data.claims.email,
            expires_at: data.claims.exp,
        })
    }
}
