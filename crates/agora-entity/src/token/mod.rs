//! Rotation credential domain entities.

pub mod model;

pub use model::{CreateRefreshToken, RefreshToken};
