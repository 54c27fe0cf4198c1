//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use agora_auth::jwt::{JwtDecoder, JwtEncoder};
use agora_auth::password::{PasswordHasher, PasswordValidator};
use agora_auth::refresh::RefreshManager;
use agora_auth::session::SessionManager;
use agora_core::config::AppConfig;
use agora_database::repositories::{
    RefreshTokenRepository, ResetCodeRepository, SessionRepository, UserRepository,
};
use agora_service::identity::{
    CodeDelivery, IdentityResolver, OAuthProviderRegistry, PasswordResetService,
};
use agora_service::twofactor::TwoFactorService;
use agora_service::user::UserService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db_pool: PgPool,

    // ── Credential primitives ────────────────────────────────
    /// JWT token encoder
    pub jwt_encoder: Arc<JwtEncoder>,
    /// JWT token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Password hasher (Argon2)
    pub password_hasher: Arc<PasswordHasher>,
    /// Password policy validator
    pub password_validator: Arc<PasswordValidator>,

    // ── Lifecycle managers ───────────────────────────────────
    /// Session lifecycle manager
    pub session_manager: Arc<SessionManager>,
    /// Rotation credential lifecycle manager
    pub refresh_manager: Arc<RefreshManager>,

    // ── Repositories ─────────────────────────────────────────
    /// User repository
    pub user_repo: Arc<UserRepository>,

    // ── Services ─────────────────────────────────────────────
    /// Identity resolver
    pub identity_resolver: Arc<IdentityResolver>,
    /// Password reset service
    pub reset_service: Arc<PasswordResetService>,
    /// Second-factor enrollment service
    pub twofactor_service: Arc<TwoFactorService>,
    /// Registration and account lookup service
    pub user_service: Arc<UserService>,
    /// External identity providers
    pub oauth_providers: Arc<OAuthProviderRegistry>,
}

impl AppState {
    /// Wires the full dependency graph from a configuration and a pool.
    ///
    /// The reset-code delivery seam is injected so the binary can wire a
    /// real sender while tests capture issued codes.
    pub fn build(config: AppConfig, db_pool: PgPool, delivery: Arc<dyn CodeDelivery>) -> Self {
        let user_repo = Arc::new(UserRepository::new(db_pool.clone()));
        let session_repo = Arc::new(SessionRepository::new(db_pool.clone()));
        let refresh_repo = Arc::new(RefreshTokenRepository::new(db_pool.clone()));
        let reset_repo = Arc::new(ResetCodeRepository::new(db_pool.clone()));

        let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        let password_hasher = Arc::new(PasswordHasher::new());
        let password_validator = Arc::new(PasswordValidator::new(&config.auth));

        let refresh_manager = Arc::new(RefreshManager::new(
            Arc::clone(&refresh_repo),
            Arc::clone(&session_repo),
            Arc::clone(&user_repo),
            Arc::clone(&jwt_encoder),
            Arc::clone(&jwt_decoder),
            config.session.clone(),
        ));
        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&session_repo),
            Arc::clone(&refresh_manager),
            Arc::clone(&jwt_encoder),
            config.session.clone(),
        ));

        let identity_resolver = Arc::new(IdentityResolver::new(
            Arc::clone(&user_repo),
            Arc::clone(&password_hasher),
        ));
        let reset_service = Arc::new(PasswordResetService::new(
            reset_repo,
            Arc::clone(&user_repo),
            Arc::clone(&password_hasher),
            Arc::clone(&password_validator),
            delivery,
            &config.auth,
        ));
        let twofactor_service = Arc::new(TwoFactorService::new(
            Arc::clone(&user_repo),
            Arc::clone(&password_hasher),
            &config.auth,
        ));
        let user_service = Arc::new(UserService::new(
            Arc::clone(&user_repo),
            Arc::clone(&password_hasher),
            Arc::clone(&password_validator),
        ));
        let oauth_providers = Arc::new(OAuthProviderRegistry::new(&config.oauth));

        Self {
            config: Arc::new(config),
            db_pool,
            jwt_encoder,
            jwt_decoder,
            password_hasher,
            password_validator,
            session_manager,
            refresh_manager,
            user_repo,
            identity_resolver,
            reset_service,
            twofactor_service,
            user_service,
            oauth_providers,
        }
    }
}
