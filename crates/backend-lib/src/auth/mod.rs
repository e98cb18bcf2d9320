// ============================
// backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
pub mod strength;
mod token_generator;

pub use password::{generate_hash, verify_password, HashError, HashParams};
pub use session::{
    AuthError, RejectReason, Session, SessionError, SessionManager, VersionOracle, AUTH_HEADER,
};
pub use strength::{PasswordRequirements, StrengthReport, MIN_PASSWORD_LENGTH};
