//! Request extractors.

pub mod auth;

pub use auth::{AuthUser, FastAuthUser, MaybeAuthUser, device_meta_from_headers};
