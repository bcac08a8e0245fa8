//! JWT token utilities for authentication and authorization.
//!
//! Provides token creation, validation and claims management for the
//! stateless auth layer. Access and refresh tokens share a codec but carry a
//! distinct kind claim and must never be accepted in each other's place.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::database::models::User;
use crate::errors::ServiceError;

/// Token verification failure. `Expired` is kept distinct so callers can
/// report it separately from tampered or malformed tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
}

impl From<TokenError> for ServiceError {
    fn from(error: TokenError) -> Self {
        ServiceError::unauthorized(error.to_string())
    }
}

/// Kind claim distinguishing short-lived access tokens from long-lived
/// refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure carried by every issued token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: String,
    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("ADMIN")
    }
}

/// Strips the `"Bearer "` scheme from an Authorization header value.
/// Returns `None` when the header is absent or uses another scheme.
pub fn resolve_bearer(header: Option<&str>) -> Option<&str> {
    header.and_then(|value| value.strip_prefix("Bearer "))
}

/// JWT codec for creating and validating tokens. Built once at startup from
/// configuration and shared through the application state.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_validity: Duration,
    refresh_validity: Duration,
}

impl JwtCodec {
    pub fn new(secret: &str, access_validity_seconds: i64, refresh_validity_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Expiry is exact; no clock-skew allowance.
        validation.leeway = 0;

        JwtCodec {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_validity: Duration::seconds(access_validity_seconds),
            refresh_validity: Duration::seconds(refresh_validity_seconds),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_validity_seconds,
            config.refresh_token_validity_seconds,
        )
    }

    pub fn access_validity_seconds(&self) -> i64 {
        self.access_validity.num_seconds()
    }

    /// Generate a short-lived access token for the given user
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        self.issue(user, TokenKind::Access, self.access_validity)
    }

    /// Generate a long-lived refresh token for the given user
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        self.issue(user, TokenKind::Refresh, self.refresh_validity)
    }

    fn issue(&self, user: &User, kind: TokenKind, validity: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now + validity;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.to_string(),
            kind,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(format!("token generation failed: {e}")))
    }

    /// Validate and decode a token. Signature, structure and expiry are all
    /// checked; any failure resolves to a typed error, never a default.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                if matches!(
                    e.kind(),
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature
                ) {
                    TokenError::Expired
                } else {
                    TokenError::Invalid(e.to_string())
                }
            })
    }

    // Best-effort claim readers for diagnostics. Authorization decisions must
    // go through `verify` so failures propagate.

    pub fn token_kind_of(&self, token: &str) -> Option<TokenKind> {
        self.verify(token).ok().map(|claims| claims.kind)
    }

    pub fn username_of(&self, token: &str) -> Option<String> {
        self.verify(token).ok().map(|claims| claims.username)
    }

    pub fn expiration_of(&self, token: &str) -> Option<DateTime<Utc>> {
        let claims = self.verify(token).ok()?;
        Utc.timestamp_opt(claims.exp as i64, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserRole;

    fn test_user() -> User {
        User {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn codec() -> JwtCodec {
        JwtCodec::new("unit-test-secret-key-that-is-long-enough", 3600, 604800)
    }

    #[test]
    fn access_token_round_trip() {
        let codec = codec();
        let token = codec.issue_access_token(&test_user()).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(!claims.is_admin());
    }

    #[test]
    fn refresh_token_carries_refresh_kind() {
        let codec = codec();
        let token = codec.issue_refresh_token(&test_user()).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(codec.token_kind_of(&token), Some(TokenKind::Refresh));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = JwtCodec::new("unit-test-secret-key-that-is-long-enough", -10, -10);
        let token = codec.issue_access_token(&test_user()).unwrap();

        match codec.verify(&token) {
            Err(TokenError::Expired) => {}
            other => panic!("expected Expired, got {other:?}"),
        }
    }

    #[test]
    fn tampered_token_is_rejected() {
        let codec = codec();
        let token = codec.issue_access_token(&test_user()).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(codec.verify(&tampered), Err(TokenError::Invalid(_))));

        let other_codec = JwtCodec::new("a-completely-different-signing-secret", 3600, 604800);
        assert!(matches!(other_codec.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn best_effort_readers_return_none_on_garbage() {
        let codec = codec();
        assert_eq!(codec.token_kind_of("not-a-token"), None);
        assert_eq!(codec.username_of("not-a-token"), None);
        assert_eq!(codec.expiration_of("not-a-token"), None);
    }

    #[test]
    fn expiration_is_readable_from_valid_token() {
        let codec = codec();
        let token = codec.issue_access_token(&test_user()).unwrap();

        let expiration = codec.expiration_of(&token).unwrap();
        assert!(expiration > Utc::now());
    }

    #[test]
    fn resolve_bearer_strips_scheme() {
        assert_eq!(resolve_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(resolve_bearer(Some("Basic abc")), None);
        assert_eq!(resolve_bearer(Some("bearer abc")), None);
        assert_eq!(resolve_bearer(None), None);
    }
}
