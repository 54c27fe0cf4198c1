//! Password reset code domain entities.

pub mod model;

pub use model::PasswordResetCode;
