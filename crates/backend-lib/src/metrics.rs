// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const TOKEN_ISSUED: &str = "auth.token.issued";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const USER_REGISTERED: &str = "user.registered";
pub const USER_UPDATED: &str = "user.updated";
pub const LOGIN_FAILED: &str = "user.login_failed";
pub const PASSWORD_CHANGE_REJECTED: &str = "user.password_change_rejected";
