//! # agora-auth
//!
//! Credential cryptography and lifecycle management for the Agora
//! identity core.
//!
//! ## Modules
//!
//! - `jwt` — signed short-lived and rotation credential encoding/decoding
//! - `password` — Argon2id password hashing and policy enforcement
//! - `totp` — time-based one-time codes and recovery codes
//! - `token` — opaque token generation, hashing, constant-time comparison
//! - `fingerprint` — device fingerprint derivation from request metadata
//! - `session` — session lifecycle (create, validate, revoke, sweep)
//! - `refresh` — rotation credential lifecycle and reuse detection

pub mod fingerprint;
pub mod jwt;
pub mod password;
pub mod refresh;
pub mod session;
pub mod token;
pub mod totp;

pub use fingerprint::DeviceMeta;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordValidator};
pub use refresh::RefreshManager;
pub use session::{SessionManager, SessionSweeper};
