//! Second-factor enrollment.

pub mod service;

pub use service::{TwoFactorService, TwoFactorSetup, TwoFactorStatus};
