//! Credential resolution into a canonical user identity.

use std::sync::Arc;

use tracing::{info, warn};

use agora_auth::password::PasswordHasher;
use agora_auth::token::hash_token;
use agora_auth::totp;
use agora_core::error::AppError;
use agora_database::repositories::user::UserRepository;
use agora_entity::user::{CreateUser, User, UserTier};

use super::oauth::ExternalProfile;

/// Verifies a presented credential and returns the canonical user identity.
#[derive(Clone)]
pub struct IdentityResolver {
    /// User persistence.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    password_hasher: Arc<PasswordHasher>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish()
    }
}

impl IdentityResolver {
    /// Creates a new identity resolver.
    pub fn new(user_repo: Arc<UserRepository>, password_hasher: Arc<PasswordHasher>) -> Self {
        Self {
            user_repo,
            password_hasher,
        }
    }

    /// Resolves an email/password pair, enforcing the second factor when
    /// the account has one enrolled.
    ///
    /// The failure is identical for an unknown email, a deactivated
    /// account, a federated account without a password, and a wrong
    /// password: nothing in the response distinguishes which applied.
    pub async fn resolve_password(
        &self,
        email: &str,
        password: &str,
        second_factor: Option<&str>,
    ) -> Result<User, AppError> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            return Err(AppError::invalid_credential());
        };

        let Some(stored_hash) = user.password_hash.as_deref() else {
            // Federated account: password login is permanently unavailable.
            return Err(AppError::invalid_credential());
        };

        if !self.password_hasher.verify_password(password, stored_hash)? {
            return Err(AppError::invalid_credential());
        }

        if !user.is_active {
            return Err(AppError::invalid_credential());
        }

        self.enforce_second_factor(&user, second_factor).await?;

        info!(user_id = %user.id, "Password credential resolved");
        Ok(user)
    }

    /// Resolves an external-identity callback profile.
    ///
    /// Resolution order: by external ID first (returning account), then by
    /// email (existing local account gets **linked** — external ID
    /// attached, email marked verified — instead of duplicated), else a
    /// new federated account is created with no password. The link step is
    /// idempotent: repeated callbacks with the same external ID take the
    /// first branch and change nothing.
    pub async fn resolve_external(
        &self,
        profile: &ExternalProfile,
        second_factor: Option<&str>,
    ) -> Result<User, AppError> {
        if let Some(user) = self.user_repo.find_by_oauth_id(&profile.subject).await? {
            if !user.is_active {
                return Err(AppError::account_disabled());
            }
            self.enforce_second_factor(&user, second_factor).await?;
            let user = self.refresh_profile(user, profile).await?;
            return Ok(user);
        }

        if let Some(existing) = self.user_repo.find_by_email(&profile.email).await? {
            if !existing.is_active {
                return Err(AppError::account_disabled());
            }
            let linked = self
                .user_repo
                .link_oauth_id(existing.id, &profile.subject)
                .await?;
            info!(
                user_id = %linked.id,
                provider = %profile.provider,
                "External identity linked to existing account"
            );
            self.enforce_second_factor(&linked, second_factor).await?;
            let linked = self.refresh_profile(linked, profile).await?;
            return Ok(linked);
        }

        let created = self
            .user_repo
            .create(&CreateUser {
                email: profile.email.clone(),
                password_hash: None,
                oauth_id: Some(profile.subject.clone()),
                display_name: profile.display_name.clone(),
                avatar_url: profile.avatar_url.clone(),
                tier: UserTier::Member,
                email_verified: true,
            })
            .await?;

        info!(
            user_id = %created.id,
            provider = %profile.provider,
            "New federated account created"
        );
        Ok(created)
    }

    /// Second-factor gate shared by both credential methods.
    ///
    /// No code yet is the soft, retryable state; a wrong code is the hard
    /// one. An unused backup code is accepted in place of a TOTP code and
    /// consumed.
    async fn enforce_second_factor(
        &self,
        user: &User,
        second_factor: Option<&str>,
    ) -> Result<(), AppError> {
        if !user.totp_enabled {
            return Ok(());
        }

        let Some(code) = second_factor else {
            return Err(AppError::second_factor_required());
        };

        let Some(secret) = user.totp_secret.as_deref() else {
            warn!(user_id = %user.id, "Second factor enabled without a stored secret");
            return Err(AppError::second_factor_invalid());
        };

        if totp::verify_code(secret, code, &user.email)? {
            return Ok(());
        }

        if self.consume_backup_code(user, code).await? {
            info!(user_id = %user.id, "Backup code consumed as second factor");
            return Ok(());
        }

        Err(AppError::second_factor_invalid())
    }

    /// Tries a presented code against the stored backup code digests,
    /// removing it on match so it can never be used twice.
    async fn consume_backup_code(&self, user: &User, code: &str) -> Result<bool, AppError> {
        let Some(serde_json::Value::Array(digests)) = user.backup_codes.as_ref() else {
            return Ok(false);
        };

        let presented = hash_token(&code.trim().to_uppercase());
        let mut remaining = Vec::with_capacity(digests.len());
        let mut matched = false;
        for digest in digests {
            if !matched && digest.as_str() == Some(presented.as_str()) {
                matched = true;
                continue;
            }
            remaining.push(digest.clone());
        }

        if matched {
            self.user_repo
                .set_backup_codes(user.id, &serde_json::Value::Array(remaining))
                .await?;
        }

        Ok(matched)
    }

    /// Refreshes profile fields carried by the external provider.
    async fn refresh_profile(
        &self,
        user: User,
        profile: &ExternalProfile,
    ) -> Result<User, AppError> {
        if profile.avatar_url.is_some() && profile.avatar_url != user.avatar_url {
            self.user_repo
                .update_avatar(user.id, profile.avatar_url.as_deref())
                .await?;
            return self
                .user_repo
                .find_by_id(user.id)
                .await?
                .ok_or_else(|| AppError::internal("User vanished during profile refresh"));
        }
        Ok(user)
    }
}
