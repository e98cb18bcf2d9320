// ============================
// backend-lib/src/users/mod.rs
// ============================
//! User accounts: the row type and the manager that owns every write to it.

mod manager;

pub use manager::UserManager;

use thiserror::Error;
use usersvc_common::{UserId, UserView, Version};

use crate::auth::HashError;
use crate::storage::StorageError;

/// A stored user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Incremented on every write; tokens embed it at issue time
    pub version: Version,
    /// argon2id PHC string
    pub pass_hash: String,
}

impl User {
    /// The publicly visible fields
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// User management errors
#[derive(Error, Debug)]
pub enum UserError {
    #[error("user already exists")]
    AlreadyExists,

    #[error("user not found")]
    NotFound,

    #[error("passwords don't match")]
    PasswordMismatch,

    #[error(transparent)]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for UserError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(_) => UserError::AlreadyExists,
            other => UserError::Storage(other),
        }
    }
}
