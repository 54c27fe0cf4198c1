//! Registration and account lookups.

use std::sync::Arc;

use tracing::info;

use agora_auth::password::{PasswordHasher, PasswordValidator};
use agora_core::error::AppError;
use agora_database::repositories::user::UserRepository;
use agora_entity::user::{CreateUser, User, UserTier};

/// Account registration and lookup.
#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<UserRepository>,
    password_hasher: Arc<PasswordHasher>,
    password_validator: Arc<PasswordValidator>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish()
    }
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        password_hasher: Arc<PasswordHasher>,
        password_validator: Arc<PasswordValidator>,
    ) -> Self {
        Self {
            user_repo,
            password_hasher,
            password_validator,
        }
    }

    /// Registers a new member account with a policy-checked password.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<User, AppError> {
        self.password_validator.validate(password)?;
        let password_hash = self.password_hasher.hash_password(password)?;

        let user = self
            .user_repo
            .create(&CreateUser {
                email: email.to_string(),
                password_hash: Some(password_hash),
                oauth_id: None,
                display_name: display_name.map(String::from),
                avatar_url: None,
                tier: UserTier::Member,
                email_verified: false,
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Loads a user by ID.
    pub async fn find_by_id(&self, id: uuid::Uuid) -> Result<Option<User>, AppError> {
        self.user_repo.find_by_id(id).await
    }
}
