//! `jobboard-auth` — authentication, authorization and visibility policy.
//!
//! This crate is intentionally decoupled from HTTP. Storage is reached only
//! through the `jobboard-core` store traits.

pub mod authorize;
pub mod bearer;
pub mod claims;
pub mod config;
pub mod credentials;
pub mod principal;
pub mod roles;
pub mod token;
pub mod visibility;

pub use authorize::{
    AccessPolicy, Operation, Requirement, authorize, authorize_owner, authorize_role,
};
pub use bearer::{authenticate_request, extract_bearer};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use config::{AuthConfig, AuthConfigError, MAX_TOKEN_TTL_MINUTES};
pub use credentials::{CredentialVerifier, LoginCredentials, hash_password};
pub use principal::Principal;
pub use roles::{Role, RoleSet};
pub use token::TokenService;
pub use visibility::{VisibilityFilter, can_see, ensure_visible};
