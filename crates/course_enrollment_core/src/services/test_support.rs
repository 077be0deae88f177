//! Deterministic stand-ins for the credential ports.

use crate::domain::TokenClaims;
use crate::ports::{PasswordHasher, PortError, PortResult, TokenIssuer};

/// Prefixes instead of hashing.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}

/// Tokens of the form `token:<subject>:<email>`.
pub struct FakeTokens;

impl TokenIssuer for FakeTokens {
    fn issue(&self, subject_id: &str, email: &str) -> PortResult<String> {
        Ok(format!("token:{}:{}", subject_id, email))
    }

    fn verify(&self, token: &str) -> PortResult<TokenClaims> {
        let mut parts = token.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("token"), Some(subject), Some(email)) => Ok(TokenClaims {
                subject_id: subject.to_string(),
                email: email.to_string(),
                expires_at: i64::MAX,
            }),
            _ => Err(PortError::Unauthorized),
        }
    }
}
