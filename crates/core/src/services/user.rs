//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use opencourse_common::{AppError, AppResult, IdGenerator};
use opencourse_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for registration, sessions and profile management.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(email)]
    #[validate(length(max = 256))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Input for logging in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for updating the caller's profile.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    /// Self-service role switch, restricted to Student and Instructor.
    pub role: Option<UserRole>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user with the Student role.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        // Check if the email is taken. The unique index remains the
        // authority under concurrent registrations.
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();

        let model = user::ActiveModel {
            id: Set(user_id),
            email: Set(input.email.clone()),
            email_lower: Set(input.email.to_lowercase()),
            name: Set(input.name),
            role: Set(UserRole::Student),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, "registered new user");

        Ok(user)
    }

    /// Authenticate by email and password, minting a fresh session token.
    ///
    /// The returned model carries the new token.
    pub async fn login(&self, input: LoginInput) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        let user_id = user.id.clone();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let user = self.user_repo.update(active).await?;
        tracing::info!(user_id = %user_id, "user logged in");

        Ok(user)
    }

    /// Invalidate the user's session token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.token = Set(None);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;
        tracing::info!(user_id = %user_id, "user logged out");

        Ok(())
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Update the user's profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.clone().into();

        if let Some(role) = input.role {
            if role != user.role {
                // Admin is never self-assignable nor self-removable.
                let allowed = !user.role.is_admin()
                    && matches!(role, UserRole::Student | UserRole::Instructor);
                if !allowed {
                    return Err(AppError::Forbidden(
                        "Role can only be switched between Student and Instructor".to_string(),
                    ));
                }
                active.role = Set(role);
            }
        }

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
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
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str, email: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            email_lower: email.to_lowercase(),
            name: "Test User".to_string(),
            bio: None,
            avatar_url: None,
            role,
            password_hash: hash_password("password123").unwrap(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> UserService {
        UserService::new(UserRepository::new(db))
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    // Service tests
    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let existing = create_test_user("u1", "taken@example.com", UserRole::Student);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service
            .register(RegisterInput {
                email: "taken@example.com".to_string(),
                password: "password123".to_string(),
                name: "Dup".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_creates_student() {
        let created = create_test_user("u1", "new@example.com", UserRole::Student);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let user = service
            .register(RegisterInput {
                email: "new@example.com".to_string(),
                password: "password123".to_string(),
                name: "New User".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Student);
        assert_eq!(user.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_unauthorized() {
        let user = create_test_user("u1", "a@example.com", UserRole::Student);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service
            .login(LoginInput {
                email: "a@example.com".to_string(),
                password: "not-the-password".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_unauthorized() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service
            .login(LoginInput {
                email: "ghost@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_mints_token() {
        let user = create_test_user("u1", "a@example.com", UserRole::Student);
        let mut updated = user.clone();
        updated.token = Some("fresh_token".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[updated]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let user = service
            .login(LoginInput {
                email: "a@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await
            .unwrap();

        assert!(user.token.is_some());
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service.authenticate_by_token("invalid").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_update_profile_allows_instructor_switch() {
        let user = create_test_user("u1", "a@example.com", UserRole::Student);
        let mut updated = user.clone();
        updated.role = UserRole::Instructor;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[updated]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let user = service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    name: None,
                    bio: None,
                    avatar_url: None,
                    role: Some(UserRole::Instructor),
                },
            )
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Instructor);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_admin_grab() {
        let user = create_test_user("u1", "a@example.com", UserRole::Student);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    name: None,
                    bio: None,
                    avatar_url: None,
                    role: Some(UserRole::Admin),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_profile_admin_cannot_demote_self() {
        let admin = create_test_user("u1", "admin@example.com", UserRole::Admin);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin]])
                .into_connection(),
        );
        let service = create_test_service(db);

        let result = service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    name: None,
                    bio: None,
                    avatar_url: None,
                    role: Some(UserRole::Student),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_register_input_validation() {
        let service = create_test_service(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ));

        // Invalid email
        let result = service
            .register(RegisterInput {
                email: "not-an-email".to_string(),
                password: "password123".to_string(),
                name: "A".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Password too short
        let result = service
            .register(RegisterInput {
                email: "ok@example.com".to_string(),
                password: "short".to_string(),
                name: "A".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
