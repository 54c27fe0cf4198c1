//! # agora-api
//!
//! HTTP API layer for the Agora identity core. Routes, middleware,
//! handlers, DTOs, cookie plumbing, and the authentication gate.

pub mod cookies;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
