// ============================
// backend-lib/src/users/manager.rs
// ============================
//! Registration, login checks and profile writes.
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::{error, info, warn};
use tokio::sync::Semaphore;
use usersvc_common::{UserId, UserIn, UserUpdate, Version};
use zeroize::Zeroizing;

use super::{User, UserError};
use crate::auth::{generate_hash, verify_password, HashError, HashParams, VersionOracle};
use crate::metrics::{LOGIN_FAILED, PASSWORD_CHANGE_REJECTED, USER_REGISTERED, USER_UPDATED};
use crate::storage::{NewUser, UserChange, UserStore};

/// Owns every write to a user row, and with it the version counter
pub struct UserManager {
    store: Arc<dyn UserStore>,
    hash_params: HashParams,
    /// One permit per argon2 job allowed to run at a time
    hash_slots: Arc<Semaphore>,
}

impl UserManager {
    /// `hash_workers` caps how many hash or verify jobs run at once; at least one
    pub fn new(store: Arc<dyn UserStore>, hash_params: HashParams, hash_workers: usize) -> Self {
        Self {
            store,
            hash_params,
            hash_slots: Arc::new(Semaphore::new(hash_workers.max(1))),
        }
    }

    /// Register a new user at version 0
    pub async fn create(&self, input: UserIn) -> Result<User, UserError> {
        if let Some(existing) = self.store.get_by_email(&input.email).await? {
            info!(user_id = existing.id, "user already exists");
            return Err(UserError::AlreadyExists);
        }

        let pass_hash = self.hash(input.password).await.map_err(|e| {
            error!(error = %e, "password hashing failed");
            e
        })?;

        let user = self
            .store
            .insert(NewUser {
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                pass_hash,
            })
            .await?;

        counter!(USER_REGISTERED).increment(1);
        info!(user_id = user.id, email = %user.email, "user created");
        Ok(user)
    }

    /// Look a user up by email and check the password
    pub async fn check_password_by_email(
        &self,
        email: &str,
        password: String,
    ) -> Result<User, UserError> {
        let Some(user) = self.store.get_by_email(email).await? else {
            counter!(LOGIN_FAILED, "cause" => "unknown_user").increment(1);
            return Err(UserError::NotFound);
        };
        self.ensure_password(&user, password).await.inspect_err(|e| {
            if matches!(e, UserError::PasswordMismatch) {
                counter!(LOGIN_FAILED, "cause" => "password").increment(1);
            }
        })?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list().await?)
    }

    /// Update profile fields; bumps the version, revoking older tokens
    pub async fn partial_update(&self, id: UserId, update: UserUpdate) -> Result<User, UserError> {
        let user = self
            .store
            .apply(id, UserChange::Profile(update))
            .await?
            .ok_or(UserError::NotFound)?;

        counter!(USER_UPDATED, "field" => "profile").increment(1);
        info!(user_id = id, version = user.version, "user profile updated");
        Ok(user)
    }

    /// Replace the password after checking the current one; bumps the version
    pub async fn change_password(
        &self,
        id: UserId,
        current: String,
        new: String,
    ) -> Result<User, UserError> {
        let user = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound)?;
        self.ensure_password(&user, current).await.inspect_err(|e| {
            if matches!(e, UserError::PasswordMismatch) {
                counter!(PASSWORD_CHANGE_REJECTED).increment(1);
            }
        })?;

        let pass_hash = self.hash(new).await?;
        let user = self
            .store
            .apply(id, UserChange::Password(pass_hash))
            .await?
            .ok_or(UserError::NotFound)?;

        counter!(USER_UPDATED, "field" => "password").increment(1);
        info!(user_id = id, version = user.version, "user password changed");
        Ok(user)
    }

    async fn ensure_password(&self, user: &User, password: String) -> Result<(), UserError> {
        let password = Zeroizing::new(password);
        let credential = user.pass_hash.clone();
        let verified = self
            .run_hashing(move || verify_password(&password, &credential))
            .await?;

        match verified {
            Ok(true) => Ok(()),
            Ok(false) => Err(UserError::PasswordMismatch),
            Err(HashError::Malformed) => {
                warn!(user_id = user.id, "stored credential is malformed");
                Err(UserError::PasswordMismatch)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn hash(&self, password: String) -> Result<String, UserError> {
        let password = Zeroizing::new(password);
        let params = self.hash_params.clone();
        let hash = self
            .run_hashing(move || generate_hash(&password, &params))
            .await??;
        Ok(hash)
    }

    /// Run an argon2 job on the blocking pool once a hashing slot is free.
    ///
    /// The permit moves into the job, so a slot stays taken until the job
    /// finishes even if the waiting request is dropped.
    async fn run_hashing<T, F>(&self, job: F) -> Result<T, HashError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .hash_slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HashError::Hashing(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| HashError::Hashing(e.to_string()))
    }
}

#[async_trait]
impl VersionOracle for UserManager {
    async fn user_version(&self, user_id: UserId) -> anyhow::Result<Option<Version>> {
        let user = self.store.get_by_id(user_id).await?;
        Ok(user.map(|u| u.version))
    }
}
