//! Route definitions for the Agora identity API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(session_routes())
        .merge(admin_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints: registration, credentials, reset, second factor.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/auth/oauth/{provider}/authorize",
            get(handlers::oauth::authorize),
        )
        .route(
            "/auth/oauth/{provider}/callback",
            post(handlers::oauth::callback),
        )
        .route(
            "/auth/password-reset/request",
            post(handlers::password_reset::request_code),
        )
        .route(
            "/auth/password-reset/verify",
            post(handlers::password_reset::verify_code),
        )
        .route(
            "/auth/password-reset/commit",
            post(handlers::password_reset::commit_reset),
        )
        .route("/auth/2fa/setup", post(handlers::twofactor::setup))
        .route("/auth/2fa/confirm", post(handlers::twofactor::confirm))
        .route("/auth/2fa/disable", post(handlers::twofactor::disable))
        .route("/auth/2fa/status", get(handlers::twofactor::status))
}

/// Session listing and revocation.
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::session::list_sessions))
        .route("/sessions", delete(handlers::session::revoke_all_sessions))
        .route("/sessions/{id}", delete(handlers::session::revoke_session))
}

/// Admin-gated account and session controls.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/users/{id}/active",
            put(handlers::admin::set_user_active),
        )
        .route(
            "/admin/users/{id}/sessions",
            delete(handlers::admin::revoke_user_sessions),
        )
}

/// Liveness.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build the CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.config.server.cors.allowed_origins;

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}
