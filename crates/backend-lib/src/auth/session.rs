// ============================
// backend-lib/src/auth/session.rs
// ============================
//! Session token issuing and checking.
//!
//! Tokens are HS256 JWTs that embed the user's version counter at issue time.
//! Nothing is stored server-side: a token stays valid only while the
//! [`VersionOracle`] still reports that same version, so one write to the user
//! row revokes every token issued before it.
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use usersvc_common::{UserId, Version};

use super::token_generator::generate_token_id;
use crate::metrics::{TOKEN_ISSUED, TOKEN_REJECTED};
use crate::users::User;

/// Request header carrying the session token (header names are case-insensitive)
pub const AUTH_HEADER: &str = "x-authentication-token";

/// The only algorithm tokens are signed and accepted with
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Source of truth for a user's current version
#[async_trait]
pub trait VersionOracle: Send + Sync {
    /// `Ok(None)` when the user does not exist
    async fn user_version(&self, user_id: UserId) -> anyhow::Result<Option<Version>>;
}

/// Claims carried by a session token.
///
/// `ver` has no `skip_serializing_if`: version 0 is written out like any other
/// value, and a token without it fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Claims {
    pub uid: UserId,
    pub ver: Version,
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
}

/// Identity extracted from an accepted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub token_id: String,
}

/// Why a token was rejected. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MalformedToken,
    UnsupportedAlgorithm,
    Expired,
    NotYetValid,
    SignatureInvalid,
    StaleVersion,
    UserUnknown,
    OracleFailure,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MalformedToken => "malformed_token",
            RejectReason::UnsupportedAlgorithm => "unsupported_algorithm",
            RejectReason::Expired => "expired",
            RejectReason::NotYetValid => "not_yet_valid",
            RejectReason::SignatureInvalid => "signature_invalid",
            RejectReason::StaleVersion => "stale_version",
            RejectReason::UserUnknown => "user_unknown",
            RejectReason::OracleFailure => "oracle_failure",
        }
    }

    fn from_jwt(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::ExpiredSignature => RejectReason::Expired,
            ErrorKind::ImmatureSignature => RejectReason::NotYetValid,
            ErrorKind::InvalidSignature => RejectReason::SignatureInvalid,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                RejectReason::UnsupportedAlgorithm
            },
            _ => RejectReason::MalformedToken,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error every rejected token maps to
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("authentication error")]
pub struct AuthError;

/// Token issuing failures
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

struct Rejection {
    user_id: Option<UserId>,
    reason: RejectReason,
}

impl Rejection {
    fn new(reason: RejectReason) -> Self {
        Self { user_id: None, reason }
    }

    fn for_user(user_id: UserId, reason: RejectReason) -> Self {
        Self {
            user_id: Some(user_id),
            reason,
        }
    }
}

/// Issues and checks session tokens
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    oracle: Arc<dyn VersionOracle>,
}

impl SessionManager {
    /// Create a session manager signing with `secret`
    pub fn new(secret: &[u8], ttl_days: u32, oracle: Arc<dyn VersionOracle>) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::days(i64::from(ttl_days)),
            oracle,
        }
    }

    /// Issue a token bound to the user's current version
    pub fn create(&self, user: &User) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = Claims {
            uid: user.id,
            ver: user.version,
            jti: generate_token_id(),
            iat: unix_seconds(now.timestamp()),
            exp: unix_seconds((now + self.ttl).timestamp()),
        };
        let token = self.sign(&claims)?;

        counter!(TOKEN_ISSUED).increment(1);
        debug!(user_id = user.id, version = user.version, token_id = %claims.jti, "session token issued");
        Ok(token)
    }

    /// Check a token and return the session it identifies.
    ///
    /// Every failure collapses into [`AuthError`]; the specific reason is only
    /// logged.
    pub async fn check(&self, token: &str) -> Result<Session, AuthError> {
        match self.evaluate(token).await {
            Ok(session) => Ok(session),
            Err(rejection) => {
                counter!(TOKEN_REJECTED, "reason" => rejection.reason.as_str()).increment(1);
                if rejection.reason != RejectReason::OracleFailure {
                    info!(
                        user_id = rejection.user_id,
                        reason = %rejection.reason,
                        "session token rejected"
                    );
                }
                Err(AuthError)
            },
        }
    }

    async fn evaluate(&self, token: &str) -> Result<Session, Rejection> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| Rejection::new(RejectReason::from_jwt(e.kind())))?
            .claims;

        let now = unix_seconds(Utc::now().timestamp());
        if claims.iat > now {
            return Err(Rejection::for_user(claims.uid, RejectReason::NotYetValid));
        }

        let current = match self.oracle.user_version(claims.uid).await {
            Ok(Some(version)) => version,
            Ok(None) => return Err(Rejection::for_user(claims.uid, RejectReason::UserUnknown)),
            Err(e) => {
                warn!(user_id = claims.uid, error = %e, "version lookup failed");
                return Err(Rejection::for_user(claims.uid, RejectReason::OracleFailure));
            },
        };

        if claims.ver != current {
            debug!(
                user_id = claims.uid,
                token_version = claims.ver,
                current_version = current,
                "token issued for an older user version"
            );
            return Err(Rejection::for_user(claims.uid, RejectReason::StaleVersion));
        }

        Ok(Session {
            user_id: claims.uid,
            token_id: claims.jti,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, SessionError> {
        Ok(encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding)?)
    }
}

fn unix_seconds(timestamp: i64) -> u64 {
    u64::try_from(timestamp).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use dashmap::DashMap;

    const SECRET: &[u8] = b"test secret";

    #[derive(Default)]
    struct Versions(DashMap<UserId, Version>);

    #[async_trait]
    impl VersionOracle for Versions {
        async fn user_version(&self, user_id: UserId) -> anyhow::Result<Option<Version>> {
            Ok(self.0.get(&user_id).map(|v| *v))
        }
    }

    struct BrokenOracle;

    #[async_trait]
    impl VersionOracle for BrokenOracle {
        async fn user_version(&self, _: UserId) -> anyhow::Result<Option<Version>> {
            anyhow::bail!("database unavailable")
        }
    }

    fn user(id: UserId, version: Version) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            first_name: "Ada".to_string(),
            last_name: "King".to_string(),
            version,
            pass_hash: String::new(),
        }
    }

    fn setup() -> (Arc<Versions>, SessionManager) {
        let versions = Arc::new(Versions::default());
        let manager = SessionManager::new(SECRET, 90, versions.clone());
        (versions, manager)
    }

    async fn reason(manager: &SessionManager, token: &str) -> RejectReason {
        match manager.evaluate(token).await {
            Ok(_) => panic!("token unexpectedly accepted"),
            Err(rejection) => rejection.reason,
        }
    }

    fn now() -> u64 {
        unix_seconds(Utc::now().timestamp())
    }

    #[tokio::test]
    async fn test_token_accepted_at_current_version() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);

        let token = manager.create(&user(1, 0)).unwrap();
        let session = manager.check(&token).await.unwrap();

        assert_eq!(session.user_id, 1);
        assert_eq!(session.token_id.len(), 32);
    }

    #[tokio::test]
    async fn test_version_bump_revokes_token_for_good() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);
        let old = manager.create(&user(1, 0)).unwrap();
        assert!(manager.check(&old).await.is_ok());

        versions.0.insert(1, 1);
        assert_eq!(manager.check(&old).await, Err(AuthError));
        assert_eq!(reason(&manager, &old).await, RejectReason::StaleVersion);

        versions.0.insert(1, 2);
        assert_eq!(reason(&manager, &old).await, RejectReason::StaleVersion);

        let fresh = manager.create(&user(1, 2)).unwrap();
        assert!(manager.check(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_version_zero_is_encoded() {
        let (_, manager) = setup();
        let token = manager.create(&user(3, 0)).unwrap();

        let payload = token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(claims["ver"], serde_json::json!(0));
        assert_eq!(claims["uid"], serde_json::json!(3));
        assert_eq!(
            claims["exp"].as_u64().unwrap() - claims["iat"].as_u64().unwrap(),
            90 * 24 * 60 * 60
        );
    }

    #[tokio::test]
    async fn test_token_without_version_is_malformed() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);

        let claims = serde_json::json!({"uid": 1, "jti": "x", "iat": now(), "exp": now() + 60});
        let token = encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET))
            .unwrap();

        assert_eq!(reason(&manager, &token).await, RejectReason::MalformedToken);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_even_with_matching_version() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);

        let claims = Claims {
            uid: 1,
            ver: 0,
            jti: generate_token_id(),
            iat: now() - 200,
            exp: now() - 100,
        };
        let token = manager.sign(&claims).unwrap();

        assert_eq!(manager.check(&token).await, Err(AuthError));
        assert_eq!(reason(&manager, &token).await, RejectReason::Expired);
    }

    #[tokio::test]
    async fn test_future_issued_at_rejected() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);

        let claims = Claims {
            uid: 1,
            ver: 0,
            jti: generate_token_id(),
            iat: now() + 3600,
            exp: now() + 7200,
        };
        let token = manager.sign(&claims).unwrap();

        assert_eq!(reason(&manager, &token).await, RejectReason::NotYetValid);
    }

    #[tokio::test]
    async fn test_other_secret_rejected() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);

        let forger = SessionManager::new(b"another secret", 90, versions.clone());
        let token = forger.create(&user(1, 0)).unwrap();

        assert_eq!(manager.check(&token).await, Err(AuthError));
        assert_eq!(reason(&manager, &token).await, RejectReason::SignatureInvalid);
    }

    #[tokio::test]
    async fn test_other_algorithm_rejected() {
        let (versions, manager) = setup();
        versions.0.insert(1, 0);

        let claims = Claims {
            uid: 1,
            ver: 0,
            jti: generate_token_id(),
            iat: now(),
            exp: now() + 60,
        };
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = encode(&Header::new(alg), &claims, &EncodingKey::from_secret(SECRET)).unwrap();
            assert_eq!(reason(&manager, &token).await, RejectReason::UnsupportedAlgorithm);
        }

        // an unsigned token never reaches signature verification
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let unsigned = format!("{header}.{payload}.");
        assert_eq!(manager.check(&unsigned).await, Err(AuthError));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let (_, manager) = setup();
        for token in ["", "abc", "a.b.c", "...."] {
            assert_eq!(manager.check(token).await, Err(AuthError));
        }
        assert_eq!(reason(&manager, "a.b.c").await, RejectReason::MalformedToken);
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let (_, manager) = setup();
        let token = manager.create(&user(42, 0)).unwrap();

        assert_eq!(manager.check(&token).await, Err(AuthError));
        assert_eq!(reason(&manager, &token).await, RejectReason::UserUnknown);
    }

    #[tokio::test]
    async fn test_oracle_failure_rejected() {
        let manager = SessionManager::new(SECRET, 90, Arc::new(BrokenOracle));
        let token = manager.create(&user(1, 0)).unwrap();

        assert_eq!(manager.check(&token).await, Err(AuthError));
        assert_eq!(reason(&manager, &token).await, RejectReason::OracleFailure);
    }

    #[tokio::test]
    async fn test_concurrent_checks() {
        let (versions, manager) = setup();
        versions.0.insert(1, 4);
        let manager = Arc::new(manager);
        let token = manager.create(&user(1, 4)).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                let token = token.clone();
                tokio::spawn(async move { manager.check(&token).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }
}
