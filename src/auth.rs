//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the owner's id and email. Every deadline
//! route takes an [`AuthUser`], which is only produced from a token that
//! verifies and has not expired.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: &str, email: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let iat = now.timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| AppError::Config(format!("token lifetime {:?} is out of range", self.ttl)))?;
        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            warn!("failed to sign token: {}", e);
            AppError::InternalServerError
        })
    }

    /// Checks signature and expiry against the wall clock.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("rejected bearer token: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

/// The caller a request runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::Unauthorized("Malformed authorization header".to_string()))?;

        let claims = state.jwt.verify(token)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", Duration::from_secs(3600))
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys();
        let token = keys.issue("user-7", "seven@example.com", Utc::now()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user-7");
        assert_eq!(claims.email, "seven@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let token = keys
            .issue("user-7", "seven@example.com", Utc::now() - TimeDelta::hours(3))
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = JwtKeys::new("another-secret", Duration::from_secs(3600));
        let token = other.issue("user-7", "seven@example.com", Utc::now()).unwrap();
        assert!(keys().verify(&token).is_err());
        assert!(keys().verify("not-a-jwt").is_err());
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_wrapped_expiry() {
        let keys = JwtKeys::new("test-secret", Duration::from_secs(u64::MAX));
        let result = keys.issue("user-7", "seven@example.com", Utc::now());
        assert!(matches!(result, Err(AppError::Config(_))));

        let keys = JwtKeys::new("test-secret", Duration::from_secs(i64::MAX as u64));
        assert!(keys.issue("user-7", "seven@example.com", Utc::now()).is_err());
    }

    #[test]
    fn claims_use_camel_case_user_id() {
        let claims = Claims {
            user_id: "u".to_string(),
            email: "e".to_string(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "u");
    }

    #[test]
    fn bearer_scheme_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }
}
