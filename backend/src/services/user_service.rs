//! User business logic service.
//!
//! Handles registration, credential verification and self-service profile
//! updates.

use crate::api::common::validate_payload;
use crate::api::user::models::UpdateUserRequest;
use crate::auth::models::RegisterRequest;
use crate::database::models::{CreateUser, User, UserRole};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use tracing::info;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Registers a new user with the USER role.
    ///
    /// # Errors
    /// Returns `ServiceError` for validation failures and duplicate
    /// username or email.
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<User> {
        validate_payload(&request)?;

        let repo = UserRepository::new(self.pool);

        if repo.username_exists(&request.username).await? {
            return Err(ServiceError::already_exists("User", &request.username));
        }

        if repo.email_exists(&request.email).await? {
            return Err(ServiceError::already_exists("Email", &request.email));
        }

        let password_hash = Self::hash_password(&request.password)?;

        let user = repo
            .create_user(CreateUser {
                username: request.username,
                email: request.email,
                password_hash,
                role: UserRole::User,
            })
            .await?;

        info!("Registered new user - id: {}, username: {}", user.id, user.username);

        Ok(user)
    }

    /// Verifies a username/password pair against the stored credentials.
    ///
    /// # Errors
    /// `Unauthorized` for unknown users or a password mismatch, `Forbidden`
    /// for deactivated accounts.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);

        let user = repo
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("User not found"))?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(ServiceError::unauthorized("Password does not match"));
        }

        if !user.is_active {
            return Err(ServiceError::forbidden("User account is deactivated"));
        }

        Ok(user)
    }

    /// Retrieves a user by ID with existence verification.
    pub async fn get_user_required(&self, id: i64) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))?;
        Ok(user)
    }

    /// Applies a self-service profile update (email and/or password).
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> ServiceResult<User> {
        validate_payload(&request)?;

        let repo = UserRepository::new(self.pool);
        let user = self.get_user_required(user_id).await?;

        if let Some(email) = request.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            if email != user.email && repo.email_exists_excluding(email, user_id).await? {
                return Err(ServiceError::already_exists("Email", email));
            }
            repo.update_email(user_id, email).await?;
        }

        if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
            let password_hash = Self::hash_password(password)?;
            repo.update_password(user_id, &password_hash).await?;
        }

        let updated = self.get_user_required(user_id).await?;

        info!("Updated profile - id: {}, username: {}", updated.id, updated.username);

        Ok(updated)
    }

    pub async fn exists_by_username(&self, username: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        Ok(repo.username_exists(username).await?)
    }

    pub async fn exists_by_email(&self, email: &str) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        Ok(repo.email_exists(email).await?)
    }

    /// Whether the identity still resolves to an active account. Backs the
    /// per-request liveness gate.
    pub async fn is_live(&self, user_id: i64) -> ServiceResult<bool> {
        let repo = UserRepository::new(self.pool);
        let user = repo.get_user_by_id(user_id).await?;
        Ok(user.map(|u| u.is_active).unwrap_or(false))
    }

    fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {e}")))
    }

    fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
        verify(password, hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn register_assigns_user_role() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let user = service
            .register(register_request("alice", "a@x.com"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "secret1");
    }

    #[tokio::test]
    async fn duplicate_username_and_email_conflict() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        service
            .register(register_request("alice", "a@x.com"))
            .await
            .unwrap();

        let err = service
            .register(register_request("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let err = service
            .register(register_request("bob", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        service
            .register(register_request("alice", "a@x.com"))
            .await
            .unwrap();

        let user = service.authenticate("alice", "secret1").await.unwrap();
        assert_eq!(user.username, "alice");

        let err = service.authenticate("alice", "wrong").await.unwrap_err();
        match err {
            ServiceError::Unauthorized { message } => {
                assert_eq!(message, "Password does not match")
            }
            other => panic!("expected Unauthorized, got {other:?}"),
        }

        let err = service.authenticate("nobody", "secret1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn deactivated_account_cannot_authenticate() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let user = service
            .register(register_request("alice", "a@x.com"))
            .await
            .unwrap();

        UserRepository::new(&pool)
            .set_active(user.id, false)
            .await
            .unwrap();

        let err = service.authenticate("alice", "secret1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));
        assert!(!service.is_live(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn profile_update_checks_email_uniqueness() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        let alice = service
            .register(register_request("alice", "a@x.com"))
            .await
            .unwrap();
        service
            .register(register_request("bob", "b@x.com"))
            .await
            .unwrap();

        let err = service
            .update_profile(
                alice.id,
                UpdateUserRequest {
                    email: Some("b@x.com".to_string()),
                    password: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists { .. }));

        let updated = service
            .update_profile(
                alice.id,
                UpdateUserRequest {
                    email: Some("new@x.com".to_string()),
                    password: Some("newsecret".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "new@x.com");

        // New password works, old one does not
        assert!(service.authenticate("alice", "newsecret").await.is_ok());
        assert!(service.authenticate("alice", "secret1").await.is_err());
    }

    #[tokio::test]
    async fn availability_checks() {
        let pool = test_pool().await;
        let service = UserService::new(&pool);

        service
            .register(register_request("alice", "a@x.com"))
            .await
            .unwrap();

        assert!(service.exists_by_username("alice").await.unwrap());
        assert!(!service.exists_by_username("bob").await.unwrap());
        assert!(service.exists_by_email("a@x.com").await.unwrap());
        assert!(!service.exists_by_email("b@x.com").await.unwrap());
    }
}
