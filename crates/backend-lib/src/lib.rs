// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the user service: versioned session tokens,
//! argon2id credentials, password policy and the HTTP surface built on them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod users;
pub mod validation;

use std::sync::Arc;

use crate::auth::SessionManager;
use crate::config::Settings;
use crate::storage::{MemoryStore, UserStore};
use crate::users::UserManager;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// User writes and password checks; also the version oracle
    pub users: Arc<UserManager>,
    /// Token issuing and checking
    pub sessions: Arc<SessionManager>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the user manager into the session manager as its version oracle
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Self {
        let users = Arc::new(UserManager::new(
            store,
            settings.hashing.clone(),
            settings.hash_workers,
        ));
        let sessions = Arc::new(SessionManager::new(
            settings.auth.jwt_secret.as_bytes(),
            settings.auth.token_ttl_days,
            users.clone(),
        ));

        Self {
            users,
            sessions,
            settings: Arc::new(settings),
        }
    }

    /// State backed by a fresh [`MemoryStore`]
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(Arc::new(MemoryStore::new()), settings)
    }
}
