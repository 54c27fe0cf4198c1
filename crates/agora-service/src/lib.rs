//! # agora-service
//!
//! Orchestration services for the Agora identity core — credential
//! resolution, external identity linking, password reset, second-factor
//! enrollment, and registration.

pub mod context;
pub mod identity;
pub mod twofactor;
pub mod user;

pub use context::RequestContext;
pub use identity::{IdentityResolver, PasswordResetService};
pub use twofactor::TwoFactorService;
pub use user::UserService;
