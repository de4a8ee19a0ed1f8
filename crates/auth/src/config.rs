//! Immutable authentication configuration.

use chrono::Duration;
use jsonwebtoken::Algorithm;
use thiserror::Error;
use zeroize::Zeroizing;

/// Longest session a token may grant.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthConfigError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token ttl must be positive")]
    NonPositiveTtl,

    #[error("token ttl must not exceed {max_minutes} minutes")]
    TtlTooLong { max_minutes: i64 },

    #[error("unsupported signing algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

/// Signing secret, token lifetime and issuer name.
///
/// Constructed once at process start and shared read-only afterwards. The
/// secret is wiped on drop and never shows up in `Debug` output.
#[derive(Clone)]
pub struct AuthConfig {
    signing_secret: Zeroizing<Vec<u8>>,
    token_ttl: Duration,
    issuer: String,
    algorithm: Algorithm,
}

impl AuthConfig {
    /// Build a config signing with HS256.
    pub fn new(
        signing_secret: impl Into<Vec<u8>>,
        token_ttl: Duration,
        issuer: impl Into<String>,
    ) -> Result<Self, AuthConfigError> {
        let signing_secret = Zeroizing::new(signing_secret.into());
        if signing_secret.is_empty() {
            return Err(AuthConfigError::EmptySecret);
        }
        if token_ttl <= Duration::zero() {
            return Err(AuthConfigError::NonPositiveTtl);
        }
        if token_ttl.num_minutes() > MAX_TOKEN_TTL_MINUTES {
            return Err(AuthConfigError::TtlTooLong {
                max_minutes: MAX_TOKEN_TTL_MINUTES,
            });
        }
        Ok(Self {
            signing_secret,
            token_ttl,
            issuer: issuer.into(),
            algorithm: Algorithm::HS256,
        })
    }

    /// Switch to another HMAC algorithm, e.g. `"HS512"`.
    pub fn with_algorithm(mut self, name: &str) -> Result<Self, AuthConfigError> {
        let algorithm = match name {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(AuthConfigError::UnsupportedAlgorithm(other.to_string())),
        };
        self.algorithm = algorithm;
        Ok(self)
    }

    pub fn signing_secret(&self) -> &[u8] {
        &self.signing_secret
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"[redacted]")
            .field("token_ttl_minutes", &self.token_ttl.num_minutes())
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
