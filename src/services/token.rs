//! Bearer token issuance and validation (HS256 JWT carrying the user id
//! and an expiry).

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_minutes: i64,
}

impl TokenService {
    #[must_use]
    pub const fn new(secret: String, ttl_minutes: i64) -> Self {
        Self {
            secret,
            ttl_minutes,
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.ttl_minutes * 60,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Decode and validate a token, returning the embedded user id.
    /// Expired or tampered tokens fail here; whether the user still exists
    /// and is active is checked by the caller.
    pub fn verify(&self, token: &str) -> Result<i32> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid token")?;

        data.claims
            .sub
            .parse::<i32>()
            .context("Token subject is not a user id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_round_trip() {
        let service = TokenService::new("test-secret".into(), 60);
        let token = service.issue(42).unwrap();
        assert_eq!(service.verify(&token).unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenService::new("secret-a".into(), 60);
        let verifier = TokenService::new("secret-b".into(), 60);
        let token = issuer.issue(1).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new("test-secret".into(), -10);
        let token = service.issue(1).unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let service = TokenService::new("test-secret".into(), 60);
        assert!(service.verify("not-a-token").is_err());
    }
}
