//! Username/password verification against stored credential records.
//!
//! An unknown username and a wrong password fail with the same error so the
//! sign-in endpoint cannot be used to enumerate accounts.

use sha2::{Digest, Sha256};
use tracing::{debug, error};
use zeroize::Zeroizing;

use jobboard_core::{CredentialStore, DomainError, DomainResult, ErrorKind, translate};

use crate::{Principal, Role};

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` must be non-empty but keeps caller-provided whitespace.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    pub fn try_from_parts(username: &str, password: &str) -> DomainResult<Self> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(DomainError::missing_field("username"));
        }
        if password.is_empty() {
            return Err(DomainError::missing_field("password"));
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl core::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Fixed, unsalted one-way hash used for stored passwords (lowercase hex SHA-256).
pub fn hash_password(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Credential verifier over a read-only credential store.
pub struct CredentialVerifier<S> {
    store: S,
}

impl<S: CredentialStore> CredentialVerifier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn verify(&self, credentials: &LoginCredentials) -> DomainResult<Principal> {
        let record = match self
            .store
            .find_credential_by_username(credentials.username())
            .await
        {
            Ok(record) => record,
            Err(failure) if failure.is_not_found() => {
                debug!(username = credentials.username(), "sign-in rejected");
                return Err(ErrorKind::IncorrectUsernameOrPassword.into());
            }
            Err(failure) => return Err(translate(&failure)),
        };

        if record.password_hash != hash_password(credentials.password()) {
            debug!(username = credentials.username(), "sign-in rejected");
            return Err(ErrorKind::IncorrectUsernameOrPassword.into());
        }

        let role: Role = record.role_name.parse().map_err(|e| {
            error!(user_id = %record.user_id, error = %e, "stored credential has unknown role");
            DomainError::internal(format!("{e}"))
        })?;

        Ok(Principal::new(record.user_id, record.username, role))
    }
}
