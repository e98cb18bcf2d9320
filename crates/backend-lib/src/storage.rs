// ============================
// backend-lib/src/storage.rs
// ============================
//! Storage abstraction with an in-memory implementation.
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use usersvc_common::{UserId, UserUpdate};

use crate::users::User;

/// Storage failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("email already registered: {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// A user row before an id has been assigned
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub pass_hash: String,
}

/// A mutation of an existing row. Applying one always bumps the version.
#[derive(Debug, Clone)]
pub enum UserChange {
    /// Non-empty fields replace the stored ones
    Profile(UserUpdate),
    /// Replace the credential
    Password(String),
}

/// Trait for storage backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user at version 0
    async fn insert(&self, user: NewUser) -> Result<User, StorageError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// All users ordered by id
    async fn list(&self) -> Result<Vec<User>, StorageError>;

    /// Apply `change` and increment the version by exactly one, as a single
    /// step per row. Returns `None` if the user does not exist.
    async fn apply(&self, id: UserId, change: UserChange) -> Result<Option<User>, StorageError>;
}

/// In-memory implementation of the `UserStore` trait
#[derive(Debug)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    emails: DashMap<String, UserId>,
    next_id: AtomicU32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, StorageError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StorageError::Duplicate(user.email)),
            Entry::Vacant(slot) => {
                let row = User {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    email: user.email,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    version: 0,
                    pass_hash: user.pass_hash,
                };
                self.users.insert(row.id, row.clone());
                slot.insert(row.id);
                Ok(row)
            },
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(&id).map(|row| row.value().clone()))
    }

    async fn list(&self) -> Result<Vec<User>, StorageError> {
        let mut users: Vec<User> = self.users.iter().map(|row| row.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn apply(&self, id: UserId, change: UserChange) -> Result<Option<User>, StorageError> {
        // the shard write lock is held until `row` drops
        let Some(mut row) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        match change {
            UserChange::Profile(update) => {
                if !update.first_name.is_empty() {
                    row.first_name = update.first_name;
                }
                if !update.last_name.is_empty() {
                    row.last_name = update.last_name;
                }
            },
            UserChange::Password(pass_hash) => row.pass_hash = pass_hash,
        }
        row.version += 1;
        Ok(Some(row.value().clone()))
    }
}
