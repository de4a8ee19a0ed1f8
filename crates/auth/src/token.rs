//! Session token issuing and verification (HMAC-signed JWT).
//!
//! Verification order:
//! 1. header decode (garbage → `InvalidToken`)
//! 2. header algorithm must equal the configured one (`UnexpectedSigningMethod`),
//!    checked before any signature work so algorithm substitution never reaches
//!    the verifier
//! 3. signature, issuer and claim shape (`InvalidToken`)
//! 4. time window against `now` (`ExpiredToken`, or `InvalidToken` when not yet valid)

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use jobboard_core::{DomainError, DomainResult, ErrorKind, UserId};

use crate::claims::{SessionClaims, TokenValidationError, validate_claims};
use crate::{AuthConfig, Principal, Role};

/// Issues and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.signing_secret());
        let decoding_key = DecodingKey::from_secret(config.signing_secret());

        let mut validation = Validation::new(config.algorithm());
        // Expiry is checked by `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn issue(&self, subject: UserId, username: &str, role: Role) -> DomainResult<String> {
        self.issue_at(subject, username, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: UserId,
        username: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> DomainResult<String> {
        let expires_at = now
            .checked_add_signed(self.config.token_ttl())
            .ok_or_else(|| {
                DomainError::with_context(ErrorKind::TokenParseError, "token expiry out of range")
            })?;
        let claims = SessionClaims {
            sub: subject,
            username: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer().to_string(),
        };

        jsonwebtoken::encode(
            &Header::new(self.config.algorithm()),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| DomainError::with_context(ErrorKind::TokenParseError, e.to_string()))
    }

    pub fn verify(&self, token: &str) -> DomainResult<Principal> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> DomainResult<Principal> {
        let header = jsonwebtoken::decode_header(token).map_err(|e| {
            debug!(error = %e, "token header rejected");
            DomainError::with_context(ErrorKind::InvalidToken, e.to_string())
        })?;

        if header.alg != self.config.algorithm() {
            debug!(alg = ?header.alg, expected = ?self.config.algorithm(), "unexpected signing method");
            return Err(DomainError::with_context(
                ErrorKind::UnexpectedSigningMethod,
                format!("{:?}", header.alg),
            ));
        }

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;

        validate_claims(&data.claims, now).map_err(|e| {
            debug!(error = %e, sub = %data.claims.sub, "token outside validity window");
            let kind = match e {
                TokenValidationError::Expired => ErrorKind::ExpiredToken,
                TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                    ErrorKind::InvalidToken
                }
            };
            DomainError::with_context(kind, e.to_string())
        })?;

        Ok(data.claims.into_principal())
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> DomainError {
    use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

    debug!(error = %err, "token rejected");
    let kind = match err.kind() {
        JwtErrorKind::ExpiredSignature => ErrorKind::ExpiredToken,
        JwtErrorKind::InvalidAlgorithm => ErrorKind::UnexpectedSigningMethod,
        _ => ErrorKind::InvalidToken,
    };
    DomainError::with_context(kind, err.to_string())
}
