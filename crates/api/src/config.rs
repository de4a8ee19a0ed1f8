//! Process configuration, read once at startup.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use jobboard_auth::{AuthConfig, AuthConfigError};

pub const BIND_ADDR_ENV: &str = "JOBBOARD_BIND_ADDR";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_ENV: &str = "JWT_TTL_MINUTES";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TTL_MINUTES: i64 = 60;
const DEFAULT_ISSUER: &str = "jobboard";
const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidBindAddr { name: &'static str, value: String },

    #[error("{name} must be a whole number of minutes, got '{value}'")]
    InvalidTtl { name: &'static str, value: String },

    #[error("{0} must be set in release builds")]
    MissingSecret(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthConfigError),
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a closure over a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                name: BIND_ADDR_ENV,
                value: bind_raw.clone(),
            })?;

        let token_ttl = match lookup(JWT_TTL_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Duration::try_minutes)
                .ok_or_else(|| ConfigError::InvalidTtl {
                    name: JWT_TTL_ENV,
                    value: raw.clone(),
                })?,
            None => Duration::minutes(DEFAULT_TTL_MINUTES),
        };

        let secret = match lookup(JWT_SECRET_ENV) {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                tracing::warn!("{JWT_SECRET_ENV} not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
            None => return Err(ConfigError::MissingSecret(JWT_SECRET_ENV)),
        };

        let issuer = lookup(JWT_ISSUER_ENV).unwrap_or_else(|| DEFAULT_ISSUER.to_string());
        let mut auth = AuthConfig::new(secret, token_ttl, issuer)?;
        if let Some(algorithm) = lookup(JWT_ALGORITHM_ENV) {
            auth = auth.with_algorithm(algorithm.trim())?;
        }

        Ok(Self {
            bind_addr,
            database_url: lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()),
            auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[(JWT_SECRET_ENV, "s3cret")]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.auth.token_ttl(), Duration::minutes(60));
        assert_eq!(cfg.auth.issuer(), "jobboard");
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config(&[
            (JWT_SECRET_ENV, "s3cret"),
            (JWT_TTL_ENV, "15"),
            (JWT_ISSUER_ENV, "jobs.example"),
            (BIND_ADDR_ENV, "127.0.0.1:9000"),
            (DATABASE_URL_ENV, "postgres://localhost/jobs"),
        ])
        .unwrap();
        assert_eq!(cfg.auth.token_ttl(), Duration::minutes(15));
        assert_eq!(cfg.auth.issuer(), "jobs.example");
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/jobs"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "s"), (JWT_TTL_ENV, "soon")]),
            Err(ConfigError::InvalidTtl { .. })
        ));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "s"), (JWT_TTL_ENV, "0")]),
            Err(ConfigError::Auth(AuthConfigError::NonPositiveTtl))
        ));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "s"), (BIND_ADDR_ENV, "nowhere")]),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "s"), (JWT_ALGORITHM_ENV, "RS256")]),
            Err(ConfigError::Auth(AuthConfigError::UnsupportedAlgorithm(_)))
        ));
    }

    #[test]
    fn out_of_range_ttl_is_rejected_without_panicking() {
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "s"), (JWT_TTL_ENV, "9223372036854775807")]),
            Err(ConfigError::InvalidTtl { .. })
        ));
        assert!(matches!(
            config(&[(JWT_SECRET_ENV, "s"), (JWT_TTL_ENV, "100000000000000")]),
            Err(ConfigError::Auth(AuthConfigError::TtlTooLong { .. }))
        ));
    }

    #[test]
    fn secret_never_appears_in_debug_output() {
        let cfg = config(&[(JWT_SECRET_ENV, "very-private-value")]).unwrap();
        assert!(!format!("{cfg:?}").contains("very-private-value"));
    }
}
