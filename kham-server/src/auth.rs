//! Password hashing, bearer tokens and the authenticated-user extractor.
//!
//! Tokens are opaque UUIDs held in memory with an expiry; a restart signs
//! everyone out. Passwords are stored as Argon2id PHC strings.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{DateTime, Duration, Utc};

use crate::error::ApiError;
use crate::AppState;

/// Hash a password for storage.
///
/// # Errors
///
/// Returns the hasher's error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Check a password against a stored hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[derive(Debug, Clone)]
struct IssuedToken {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// Issues and validates bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    tokens: Arc<RwLock<HashMap<String, IssuedToken>>>,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer whose tokens live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a new token for a user.
    #[must_use]
    pub fn issue(&self, user_id: &str) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let issued = IssuedToken {
            user_id: user_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), issued);
        token
    }

    /// The user a live token belongs to. Expired tokens are forgotten.
    #[must_use]
    pub fn validate(&self, token: &str) -> Option<String> {
        let issued = self
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()?;
        if issued.expires_at > Utc::now() {
            return Some(issued.user_id);
        }
        self.revoke(token);
        None
    }

    /// Forget a token.
    pub fn revoke(&self, token: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
    }

    /// Drop every expired token and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let before = tokens.len();
        tokens.retain(|_, issued| issued.expires_at > now);
        before - tokens.len()
    }

    /// Number of tokens held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no tokens are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The caller of a protected route, resolved from `Authorization: Bearer <token>`.
///
/// A missing token is rejected with 401, an unknown or expired one with 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Account id.
    pub user_id: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::MissingToken)?;
        let user_id = state.tokens.validate(token).ok_or_else(|| {
            tracing::debug!("Rejected bearer token");
            ApiError::InvalidToken
        })?;
        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_issue_and_validate() {
        let issuer = TokenIssuer::new(Duration::days(7));
        let token = issuer.issue("u1");
        assert_eq!(issuer.validate(&token), Some("u1".to_string()));
        assert_eq!(issuer.validate("nonsense"), None);
        assert_ne!(issuer.issue("u1"), token);
        assert_eq!(issuer.len(), 2);
    }

    #[test]
    fn test_expired_token_rejected_and_forgotten() {
        let issuer = TokenIssuer::new(Duration::seconds(-1));
        let token = issuer.issue("u1");
        assert_eq!(issuer.validate(&token), None);
        assert!(issuer.is_empty());
    }

    #[test]
    fn test_revoke_and_purge() {
        let live = TokenIssuer::new(Duration::days(1));
        let token = live.issue("u1");
        live.revoke(&token);
        assert_eq!(live.validate(&token), None);

        let stale = TokenIssuer::new(Duration::seconds(-1));
        let _ = stale.issue("a");
        let _ = stale.issue("b");
        assert_eq!(stale.purge_expired(), 2);
        assert!(stale.is_empty());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let parts = |value: Option<&str>| {
            let mut builder = Request::builder();
            if let Some(v) = value {
                builder = builder.header(header::AUTHORIZATION, v);
            }
            builder.body(()).expect("request").into_parts().0
        };

        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
