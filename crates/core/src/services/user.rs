//! User service: registration, login and session tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator, Page, Paginator, SharedClock};
use yatube_db::{entities::user, repositories::UserRepository};

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("compile username regex"));

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    clock: SharedClock,
    paginator: Paginator,
}

/// Input for signing up.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        length(min = 1, max = 150, message = "Не более 150 символов."),
        regex(
            path = *USERNAME_REGEX,
            message = "Только буквы, цифры и символы @/./+/-/_."
        )
    )]
    pub username: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Пароль должен содержать от 8 до 128 символов."
    ))]
    pub password: String,

    #[validate(length(max = 150, message = "Не более 150 символов."))]
    pub name: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, clock: SharedClock, paginator: Paginator) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            clock,
            paginator,
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A user with that username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            name: Set(input.name.filter(|n| !n.trim().is_empty())),
            password: Set(password_hash),
            token: Set(Some(self.id_gen.generate_token())),
            is_admin: Set(false),
            created_at: Set(self.clock.now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Log in: check the password and return the session token.
    ///
    /// An account without a token (after logout) gets a fresh one.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(user::Model, String)> {
        let user = self.authenticate(username, password).await?;

        if let Some(token) = user.token.clone() {
            return Ok((user, token));
        }

        let token = self.id_gen.generate_token();
        let user = self
            .user_repo
            .set_token(&user.id, Some(token.clone()))
            .await?;
        Ok((user, token))
    }

    /// Replace the session token, invalidating every existing session.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let token = self.id_gen.generate_token();
        self.user_repo
            .set_token(user_id, Some(token.clone()))
            .await?;
        tracing::debug!(user_id = %user_id, "Rotated session token");
        Ok(token)
    }

    /// List users for the admin surface.
    pub async fn search(
        &self,
        query: Option<&str>,
        page: Option<&str>,
    ) -> AppResult<Page<user::Model>> {
        let count = self.user_repo.count_search(query).await?;
        let meta = self.paginator.page_meta(count, page);
        let users = self
            .user_repo
            .search(query, meta.per_page, meta.offset())
            .await?;
        Ok(Page::new(users, meta))
    }

    /// Delete an account with everything it authored.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(id).await?;
        self.user_repo.delete(&user.id).await?;
        tracing::info!(user_id = %user.id, "Deleted user");
        Ok(())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use yatube_common::SystemClock;

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            name: None,
            password: hash_password(password).unwrap(),
            token: Some("test_token".to_string()),
            is_admin: false,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> UserService {
        UserService::new(
            UserRepository::new(Arc::new(db.into_connection())),
            Arc::new(SystemClock),
            Paginator::default(),
        )
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "not-a-hash").is_err());
    }

    #[test]
    fn test_register_input_validation() {
        let valid = RegisterInput {
            username: "leo.tolstoy".to_string(),
            password: "long enough".to_string(),
            name: None,
        };
        assert!(valid.validate().is_ok());

        let bad_chars = RegisterInput {
            username: "leo tolstoy".to_string(),
            ..valid.clone()
        };
        assert!(bad_chars.validate().is_err());

        let short_password = RegisterInput {
            password: "short".to_string(),
            ..valid
        };
        assert!(short_password.validate().is_err());
    }

    #[tokio::test]
    async fn test_register_username_taken() {
        let existing = create_test_user("u1", "leo", "password123");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let result = service
            .register(RegisterInput {
                username: "leo".to_string(),
                password: "password123".to_string(),
                name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_creates_user() {
        let created = create_test_user("u1", "leo", "password123");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created]]),
        );

        let user = service
            .register(RegisterInput {
                username: "leo".to_string(),
                password: "password123".to_string(),
                name: Some("Лев".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "leo");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = create_test_user("u1", "leo", "password123");
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]));

        let result = service.authenticate("leo", "nope").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_reuses_token() {
        let user = create_test_user("u1", "leo", "password123");
        let service =
            service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]));

        let (user, token) = service.login("leo", "password123").await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(token, "test_token");
    }

    #[tokio::test]
    async fn test_login_issues_token_after_logout() {
        let mut user = create_test_user("u1", "leo", "password123");
        user.token = None;
        let mut with_token = user.clone();
        with_token.token = Some("fresh".to_string());

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[with_token]]),
        );

        let (_, token) = service.login("leo", "password123").await.unwrap();
        assert_eq!(token.len(), 32);
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.authenticate_by_token("stale").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
