//! Middleware for protecting authenticated routes and handling authorization.
//!
//! The gate is an explicit chain of stages, each a function returning a
//! tagged `Gate` value: authenticate (token present, valid, ACCESS kind),
//! check_role (ADMIN for mutations) and check_liveness (the identity still
//! resolves to an active account). Public routes simply carry none of these
//! layers.

use crate::AppState;
use crate::api::common::ApiResponse;
use crate::database::models::UserRole;
use crate::services::user_service::UserService;
use crate::utils::jwt::{JwtCodec, TokenError, TokenKind, resolve_bearer};
use axum::{
    Json,
    extract::Request,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use tracing::{debug, error, warn};

/// Identity attached to the request once authentication succeeds.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}

/// Outcome of a single gate stage.
#[derive(Debug)]
pub enum Gate {
    Continue(AuthIdentity),
    Reject { status: StatusCode, message: String },
}

fn reject(status: StatusCode, message: impl Into<String>) -> Gate {
    Gate::Reject {
        status,
        message: message.into(),
    }
}

/// First stage: resolve the bearer token, verify it and require the ACCESS
/// kind. Produces the request identity on success.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtCodec) -> Gate {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let Some(token) = resolve_bearer(header) else {
        return reject(
            StatusCode::UNAUTHORIZED,
            "Authentication token is required",
        );
    };

    let claims = match jwt.verify(token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            warn!("Rejected expired token");
            return reject(StatusCode::UNAUTHORIZED, "Token has expired");
        }
        Err(TokenError::Invalid(reason)) => {
            warn!("Rejected invalid token: {}", reason);
            return reject(StatusCode::UNAUTHORIZED, "Invalid token");
        }
    };

    if claims.kind != TokenKind::Access {
        debug!("Rejected token of kind {:?}", jwt.token_kind_of(token));
        return reject(StatusCode::UNAUTHORIZED, "Access token is required");
    }

    let Ok(user_id) = claims.user_id() else {
        return reject(StatusCode::UNAUTHORIZED, "Invalid token");
    };

    let Ok(role) = claims.role.parse::<UserRole>() else {
        return reject(StatusCode::UNAUTHORIZED, "Invalid token");
    };

    Gate::Continue(AuthIdentity {
        user_id,
        username: claims.username,
        role,
    })
}

/// Second stage: the authenticated identity must hold the required role.
pub fn check_role(identity: &AuthIdentity, required: UserRole) -> Gate {
    if identity.role == required {
        Gate::Continue(identity.clone())
    } else {
        reject(StatusCode::FORBIDDEN, "Admin privileges are required")
    }
}

/// Third stage: the identity must still resolve to an active account.
/// Compensates for the lack of token revocation in a stateless design.
pub async fn check_liveness(identity: &AuthIdentity, pool: &SqlitePool) -> Gate {
    match UserService::new(pool).is_live(identity.user_id).await {
        Ok(true) => Gate::Continue(identity.clone()),
        Ok(false) => {
            warn!(
                "Rejected request for inactive or deleted user - id: {}",
                identity.user_id
            );
            reject(StatusCode::FORBIDDEN, "Access denied")
        }
        Err(e) => {
            error!("Liveness check failed: {}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// JWT authentication middleware; attaches the identity to the request
/// extensions for downstream stages and handlers.
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let Some(state) = request.extensions().get::<AppState>().cloned() else {
        return gate_rejection(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        );
    };

    match authenticate(request.headers(), &state.jwt) {
        Gate::Continue(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Gate::Reject { status, message } => gate_rejection(status, message),
    }
}

/// Admin role authorization middleware; must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let Some(identity) = request.extensions().get::<AuthIdentity>() else {
        return gate_rejection(
            StatusCode::UNAUTHORIZED,
            "Authentication is required".to_string(),
        );
    };

    match check_role(identity, UserRole::Admin) {
        Gate::Continue(_) => next.run(request).await,
        Gate::Reject { status, message } => gate_rejection(status, message),
    }
}

/// Identity liveness middleware; must run after `require_auth`.
pub async fn require_live_user(request: Request, next: Next) -> Response {
    let Some(state) = request.extensions().get::<AppState>().cloned() else {
        return gate_rejection(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        );
    };

    let Some(identity) = request.extensions().get::<AuthIdentity>().cloned() else {
        return gate_rejection(
            StatusCode::UNAUTHORIZED,
            "Authentication is required".to_string(),
        );
    };

    match check_liveness(&identity, &state.pool).await {
        Gate::Continue(_) => next.run(request).await,
        Gate::Reject { status, message } => gate_rejection(status, message),
    }
}

fn gate_rejection(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponse::error(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::User;
    use crate::database::test_pool;
    use crate::repositories::user_repository::UserRepository;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn codec() -> JwtCodec {
        JwtCodec::new("middleware-test-secret-key-long-enough", 3600, 604800)
    }

    fn test_user(role: UserRole) -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let gate = authenticate(&HeaderMap::new(), &codec());
        match gate {
            Gate::Reject { status, .. } => assert_eq!(status, StatusCode::UNAUTHORIZED),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        assert!(matches!(
            authenticate(&headers, &codec()),
            Gate::Reject { .. }
        ));
    }

    #[test]
    fn valid_access_token_continues_with_identity() {
        let codec = codec();
        let token = codec.issue_access_token(&test_user(UserRole::User)).unwrap();

        match authenticate(&bearer_headers(&token), &codec) {
            Gate::Continue(identity) => {
                assert_eq!(identity.user_id, 7);
                assert_eq!(identity.username, "alice");
                assert_eq!(identity.role, UserRole::User);
            }
            other => panic!("expected continue, got {other:?}"),
        }
    }

    #[test]
    fn refresh_token_never_passes_the_access_gate() {
        let codec = codec();
        let token = codec
            .issue_refresh_token(&test_user(UserRole::Admin))
            .unwrap();

        match authenticate(&bearer_headers(&token), &codec) {
            Gate::Reject { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Access token is required");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn expired_token_is_rejected_with_expiry_message() {
        let expired_codec =
            JwtCodec::new("middleware-test-secret-key-long-enough", -10, -10);
        let token = expired_codec
            .issue_access_token(&test_user(UserRole::User))
            .unwrap();

        match authenticate(&bearer_headers(&token), &codec()) {
            Gate::Reject { message, .. } => assert_eq!(message, "Token has expired"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn role_gate_requires_admin() {
        let user = AuthIdentity {
            user_id: 1,
            username: "alice".to_string(),
            role: UserRole::User,
        };

        match check_role(&user, UserRole::Admin) {
            Gate::Reject { status, .. } => assert_eq!(status, StatusCode::FORBIDDEN),
            other => panic!("expected rejection, got {other:?}"),
        }

        let admin = AuthIdentity {
            role: UserRole::Admin,
            ..user
        };
        assert!(matches!(
            check_role(&admin, UserRole::Admin),
            Gate::Continue(_)
        ));
    }

    #[tokio::test]
    async fn liveness_gate_rejects_deactivated_and_unknown_users() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let user = repo
            .create_user(crate::database::models::CreateUser {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap();

        let identity = AuthIdentity {
            user_id: user.id,
            username: user.username.clone(),
            role: UserRole::User,
        };

        assert!(matches!(
            check_liveness(&identity, &pool).await,
            Gate::Continue(_)
        ));

        repo.set_active(user.id, false).await.unwrap();
        assert!(matches!(
            check_liveness(&identity, &pool).await,
            Gate::Reject { status, .. } if status == StatusCode::FORBIDDEN
        ));

        let ghost = AuthIdentity {
            user_id: 9999,
            username: "ghost".to_string(),
            role: UserRole::Admin,
        };
        assert!(matches!(
            check_liveness(&ghost, &pool).await,
            Gate::Reject { status, .. } if status == StatusCode::FORBIDDEN
        ));
    }
}
