//! Core business logic for the authentication system.

use std::sync::Arc;

use crate::api::user::models::UserResponse;
use crate::auth::models::*;
use crate::errors::{ServiceError, ServiceResult};
use crate::services::user_service::UserService;
use crate::utils::jwt::{JwtCodec, TokenKind};
use sqlx::SqlitePool;
use tracing::info;

/// Authentication service for registration, login and token rotation
pub struct AuthService<'a> {
    jwt: Arc<JwtCodec>,
    user_service: UserService<'a>,
}

impl<'a> AuthService<'a> {
    pub fn new(pool: &'a SqlitePool, jwt: Arc<JwtCodec>) -> Self {
        AuthService {
            jwt,
            user_service: UserService::new(pool),
        }
    }

    /// Registers a new user account with the USER role.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<UserResponse> {
        let user = self.user_service.register(request).await?;
        Ok(UserResponse::from(user))
    }

    /// Authenticates a user and issues an access/refresh token pair.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        crate::api::common::validate_payload(&request)?;

        let user = self
            .user_service
            .authenticate(&request.username, &request.password)
            .await?;

        let access_token = self.jwt.issue_access_token(&user)?;
        let refresh_token = self.jwt.issue_refresh_token(&user)?;

        info!("User logged in - id: {}, username: {}", user.id, user.username);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_validity_seconds(),
            user: UserResponse::from(user),
        })
    }

    /// Rotates the token pair from a valid refresh token. The presented
    /// token must carry the REFRESH kind and resolve to a live user.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<AuthResponse> {
        let claims = self.jwt.verify(refresh_token)?;

        if claims.kind != TokenKind::Refresh {
            return Err(ServiceError::unauthorized("Refresh token is required"));
        }

        let user = self.user_service.get_user_required(claims.user_id()?).await?;

        if !user.is_active {
            return Err(ServiceError::forbidden("User account is deactivated"));
        }

        let access_token = self.jwt.issue_access_token(&user)?;
        let refresh_token = self.jwt.issue_refresh_token(&user)?;

        info!("Rotated token pair - user id: {}", user.id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_validity_seconds(),
            user: UserResponse::from(user),
        })
    }

    /// Current-user lookup for the `me` endpoint.
    pub async fn current_user(&self, user_id: i64) -> ServiceResult<UserResponse> {
        let user = self.user_service.get_user_required(user_id).await?;
        Ok(UserResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn codec() -> Arc<JwtCodec> {
        Arc::new(JwtCodec::new(
            "auth-service-test-secret-key-long-enough",
            3600,
            604800,
        ))
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
        }
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            username: "alice".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_matching_claims() {
        let pool = test_pool().await;
        let jwt = codec();
        let service = AuthService::new(&pool, jwt.clone());

        let registered = service.register(register_request()).await.unwrap();
        assert_eq!(registered.role, "USER");

        let auth = service.login(login_request("secret1")).await.unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);

        let claims = jwt.verify(&auth.access_token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.user_id().unwrap(), registered.id);

        let refresh_claims = jwt.verify(&auth.refresh_token).unwrap();
        assert_eq!(refresh_claims.kind, TokenKind::Refresh);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, codec());

        service.register(register_request()).await.unwrap();

        let err = service.login(login_request("wrong")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, codec());

        service.register(register_request()).await.unwrap();
        let auth = service.login(login_request("secret1")).await.unwrap();

        let err = service.refresh(&auth.access_token).await.unwrap_err();
        match err {
            ServiceError::Unauthorized { message } => {
                assert_eq!(message, "Refresh token is required")
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_rotates_the_pair() {
        let pool = test_pool().await;
        let jwt = codec();
        let service = AuthService::new(&pool, jwt.clone());

        service.register(register_request()).await.unwrap();
        let auth = service.login(login_request("secret1")).await.unwrap();

        let rotated = service.refresh(&auth.refresh_token).await.unwrap();
        assert_eq!(
            jwt.verify(&rotated.access_token).unwrap().kind,
            TokenKind::Access
        );
        assert_eq!(
            jwt.verify(&rotated.refresh_token).unwrap().kind,
            TokenKind::Refresh
        );
        assert_eq!(rotated.user.username, "alice");
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_tokens() {
        let pool = test_pool().await;
        let service = AuthService::new(&pool, codec());

        let err = service.refresh("not-a-token").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }
}
