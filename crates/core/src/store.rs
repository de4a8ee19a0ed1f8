//! Storage collaborator contract.
//!
//! The access core never talks to a database directly. It reads credentials
//! and entity records through these traits and receives failures as opaque,
//! categorised `StorageFailure` values that only `translate` interprets.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityKind, EntityRecord, EntityRef};
use crate::id::UserId;

/// Category code of a storage failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    NotFound,
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    StringTooLong,
    CheckViolation,
    Deadlock,
    /// Anything the adapter could not classify.
    Unrecognized,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::NotFound => "not_found",
            FailureCategory::UniqueViolation => "unique_violation",
            FailureCategory::ForeignKeyViolation => "foreign_key_violation",
            FailureCategory::NotNullViolation => "not_null_violation",
            FailureCategory::StringTooLong => "string_too_long",
            FailureCategory::CheckViolation => "check_violation",
            FailureCategory::Deadlock => "deadlock",
            FailureCategory::Unrecognized => "unrecognized",
        }
    }
}

impl core::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque failure reported by a storage adapter.
///
/// `constraint` is the exact name of the constraint that fired, when the
/// engine reports one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{category}: {message}")]
pub struct StorageFailure {
    pub category: FailureCategory,
    pub constraint: Option<String>,
    pub message: String,
}

impl StorageFailure {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            constraint: None,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureCategory::NotFound, message)
    }

    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::new(FailureCategory::Unrecognized, message)
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.category == FailureCategory::NotFound
    }
}

/// Stored login credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: Option<String>,
    /// Lowercase hex digest of the password.
    pub password_hash: String,
    /// Role name as persisted; parsed by the auth layer.
    pub role_name: String,
}

/// Filters for collection reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub owner_id: Option<UserId>,
    pub related_to: Option<EntityRef>,
    pub limit: Option<usize>,
}

impl ListFilter {
    pub fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn related_to(entity: EntityRef) -> Self {
        Self {
            related_to: Some(entity),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &EntityRecord) -> bool {
        if let Some(owner) = self.owner_id {
            if record.owner_id != Some(owner) {
                return false;
            }
        }
        if let Some(related) = self.related_to {
            if !record.relations.contains(&related) {
                return false;
            }
        }
        true
    }
}

/// A single write against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityWrite {
    Insert(EntityRecord),
    Update(EntityRecord),
    Delete(EntityRef),
}

impl EntityWrite {
    pub fn target(&self) -> EntityRef {
        match self {
            EntityWrite::Insert(r) | EntityWrite::Update(r) => r.entity,
            EntityWrite::Delete(r) => *r,
        }
    }
}

/// Read access to login credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup. Absent usernames fail with `FailureCategory::NotFound`.
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<CredentialRecord, StorageFailure>;
}

/// Read/write access to entity records.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one record. Absent records fail with `FailureCategory::NotFound`.
    async fn find_entity(&self, entity: EntityRef) -> Result<EntityRecord, StorageFailure>;

    async fn list_entities(
        &self,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> Result<Vec<EntityRecord>, StorageFailure>;

    async fn write(&self, write: EntityWrite) -> Result<(), StorageFailure>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<CredentialRecord, StorageFailure> {
        (**self).find_credential_by_username(username).await
    }
}

#[async_trait]
impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    async fn find_entity(&self, entity: EntityRef) -> Result<EntityRecord, StorageFailure> {
        (**self).find_entity(entity).await
    }

    async fn list_entities(
        &self,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> Result<Vec<EntityRecord>, StorageFailure> {
        (**self).list_entities(kind, filter).await
    }

    async fn write(&self, write: EntityWrite) -> Result<(), StorageFailure> {
        (**self).write(write).await
    }
}
