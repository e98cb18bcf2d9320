// ============================
// backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::{HashParams, PasswordRequirements};

/// Prefix of environment overrides, e.g. `USERSVC_AUTH__JWT_SECRET`
pub const ENV_PREFIX: &str = "USERSVC_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Session token settings
    pub auth: AuthSettings,
    /// argon2id cost parameters for new credentials
    pub hashing: HashParams,
    /// Hash and verify jobs allowed to run at once; each holds `hashing.memory_kib`
    pub hash_workers: usize,
    /// Password requirements checked at registration
    pub password_requirements: PasswordRequirements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Session token settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC signing secret
    pub jwt_secret: String,
    /// Token lifetime in days
    pub token_ttl_days: u32,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            auth: AuthSettings::default(),
            hashing: HashParams::default(),
            hash_workers: default_hash_workers(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_days: 90,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings: defaults, then the TOML file at `path` if it exists,
    /// then `USERSVC_` environment variables (nested keys split on `__`)
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("cannot load settings from {}", path.as_ref().display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must be set");
        }
        if self.auth.token_ttl_days == 0 {
            bail!("auth.token_ttl_days must be at least 1");
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            bail!("invalid log_level {:?}, expected one of {LOG_LEVELS:?}", self.log_level);
        }
        if self.hash_workers == 0 {
            bail!("hash_workers must be at least 1");
        }
        if self.password_requirements.min_length == 0 {
            bail!("password_requirements.min_length must be at least 1");
        }
        self.hashing
            .validate()
            .context("invalid hashing parameters")?;
        Ok(())
    }
}

/// One hashing slot per available core
fn default_hash_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod config_tests;
