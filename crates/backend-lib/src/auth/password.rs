// ============================
// backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Credentials are argon2id PHC strings:
//! `$argon2id$v=19$m=<KiB>,t=<iterations>,p=<lanes>$<salt>$<digest>`.
//! Salt and digest lengths are recovered from the encoded fields, so a stored
//! credential is all that is needed to verify it, and raising the cost
//! parameters only affects hashes produced afterwards.
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest salt argon2 accepts, in bytes
pub const MIN_SALT_LENGTH: usize = 8;
/// Largest salt that fits a PHC salt field, in bytes
pub const MAX_SALT_LENGTH: usize = 48;
pub const MIN_KEY_LENGTH: usize = 16;
/// Largest digest that fits a PHC output field, in bytes
pub const MAX_KEY_LENGTH: usize = 64;

/// Hashing failures
#[derive(Error, Debug)]
pub enum HashError {
    /// The stored credential could not be parsed
    #[error("credential is malformed")]
    Malformed,

    /// Parameters were rejected or the computation failed
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Tunable argon2id cost parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Random salt size in bytes
    pub salt_length: usize,
    /// Digest size in bytes
    pub key_length: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024, // 64 MiB
            iterations: 3,
            parallelism: 1,
            salt_length: 16,
            key_length: 32,
        }
    }
}

impl HashParams {
    /// Check the parameters against the ranges argon2 and the PHC format support
    pub fn validate(&self) -> Result<(), HashError> {
        if !(MIN_SALT_LENGTH..=MAX_SALT_LENGTH).contains(&self.salt_length) {
            return Err(HashError::Hashing(format!(
                "salt length must be between {MIN_SALT_LENGTH} and {MAX_SALT_LENGTH} bytes"
            )));
        }
        if !(MIN_KEY_LENGTH..=MAX_KEY_LENGTH).contains(&self.key_length) {
            return Err(HashError::Hashing(format!(
                "key length must be between {MIN_KEY_LENGTH} and {MAX_KEY_LENGTH} bytes"
            )));
        }
        self.argon2().map(|_| ())
    }

    fn argon2(&self) -> Result<Argon2<'static>, HashError> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(self.key_length),
        )
        .map_err(|e| HashError::Hashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[cfg(test)]
impl HashParams {
    /// Cheapest valid cost, so tests do not spend 64 MiB per hash
    pub(crate) fn testing() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            ..Self::default()
        }
    }
}

/// Hash a password with a fresh random salt
pub fn generate_hash(plain: &str, params: &HashParams) -> Result<String, HashError> {
    params.validate()?;

    let mut salt = vec![0u8; params.salt_length];
    rand::rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| HashError::Hashing(e.to_string()))?;

    let hash = params
        .argon2()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| HashError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored credential.
///
/// Returns `Ok(false)` on a wrong password and `Err(HashError::Malformed)` when
/// the credential cannot be used at all; callers treat both as "not valid".
pub fn verify_password(plain: &str, credential: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(credential).map_err(|_| HashError::Malformed)?;
    if parsed.hash.is_none() {
        return Err(HashError::Malformed);
    }

    // Parameters come from the credential itself. The digest comparison is
    // done on `password_hash::Output`, whose equality is constant-time.
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(_) => Err(HashError::Malformed),
    }
}
