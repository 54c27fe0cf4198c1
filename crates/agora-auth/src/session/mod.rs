//! Session lifecycle management.

pub mod manager;
pub mod sweeper;

pub use manager::{LoginGrant, SessionManager};
pub use sweeper::SessionSweeper;
