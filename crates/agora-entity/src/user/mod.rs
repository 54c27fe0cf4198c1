//! User domain entities.

pub mod model;
pub mod tier;

pub use model::{CreateUser, User};
pub use tier::UserTier;
