//! Integration tests for the Agora identity service.
//!
//! These tests exercise the full router against a live PostgreSQL
//! instance and are ignored by default. Point `AGORA_TEST_DATABASE_URL`
//! at a disposable database and run with `cargo test -- --ignored`.

mod helpers;

mod auth;
mod refresh;
mod reset;
mod sessions;
mod twofactor;
