//! HTTP middleware and route guards.

pub mod logging;
pub mod tier;
