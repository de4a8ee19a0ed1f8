//! `jobboard-core` — domain foundation shared by every other crate.
//!
//! Holds identifiers, the stable domain error vocabulary, the storage
//! collaborator contract and the storage-failure translation table. No HTTP,
//! no SQL driver.

pub mod entity;
pub mod error;
pub mod id;
pub mod store;
pub mod translate;

pub use entity::{EntityKind, EntityRecord, EntityRef};
pub use error::{DomainError, DomainResult, ErrorGroup, ErrorKind};
pub use id::{ApplicationId, CategoryId, CompanyId, ResumeId, UserId, VacancyId};
pub use store::{
    CredentialRecord, CredentialStore, EntityStore, EntityWrite, FailureCategory, ListFilter,
    StorageFailure,
};
pub use translate::{ConstraintTable, translate};
