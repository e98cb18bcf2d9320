// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the user service.

pub mod auth;

pub use auth::require_session;
