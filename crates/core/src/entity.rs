//! Entity references and the minimal record shape the access core reads.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, ErrorKind};
use crate::id::UserId;

/// Kind of persisted entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Company,
    Vacancy,
    Resume,
    Application,
    Category,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Company => "company",
            EntityKind::Vacancy => "vacancy",
            EntityKind::Resume => "resume",
            EntityKind::Application => "application",
            EntityKind::Category => "category",
        }
    }

    /// Whether records of this kind carry a moderation (blocked) flag.
    pub fn is_blockable(self) -> bool {
        self.blocked_kind().is_some()
    }

    pub fn blocked_kind(self) -> Option<ErrorKind> {
        match self {
            EntityKind::User => Some(ErrorKind::UserBlocked),
            EntityKind::Resume => Some(ErrorKind::ResumeBlocked),
            EntityKind::Vacancy => Some(ErrorKind::VacancyBlocked),
            EntityKind::Company | EntityKind::Application | EntityKind::Category => None,
        }
    }

    pub fn not_found_kind(self) -> ErrorKind {
        match self {
            EntityKind::User => ErrorKind::UserNotFound,
            EntityKind::Company => ErrorKind::CompanyNotFound,
            EntityKind::Vacancy => ErrorKind::VacancyNotFound,
            EntityKind::Resume => ErrorKind::ResumeNotFound,
            EntityKind::Application => ErrorKind::ApplicationNotFound,
            EntityKind::Category => ErrorKind::CategoryNotFound,
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(EntityKind::User),
            "company" => Ok(EntityKind::Company),
            "vacancy" => Ok(EntityKind::Vacancy),
            "resume" => Ok(EntityKind::Resume),
            "application" => Ok(EntityKind::Application),
            "category" => Ok(EntityKind::Category),
            other => Err(DomainError::internal(format!("unknown entity kind '{other}'"))),
        }
    }
}

/// Typed pointer to a persisted entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// What the storage collaborator hands back for a single entity.
///
/// `owner_id` is the creating/submitting user (for a user record, the user
/// itself). `relations` lists the entities this one references; a blocked
/// relation hides the record from callers not entitled to see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity: EntityRef,
    pub owner_id: Option<UserId>,
    pub is_blocked: bool,
    #[serde(default)]
    pub relations: Vec<EntityRef>,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl EntityRecord {
    pub fn new(entity: EntityRef, owner_id: Option<UserId>) -> Self {
        Self {
            entity,
            owner_id,
            is_blocked: false,
            relations: Vec::new(),
            attributes: serde_json::Value::Null,
        }
    }

    pub fn blocked(mut self, is_blocked: bool) -> Self {
        self.is_blocked = is_blocked;
        self
    }

    pub fn with_relation(mut self, relation: impl Into<EntityRef>) -> Self {
        self.relations.push(relation.into());
        self
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    /// The blocked flag only means something on blockable kinds.
    pub fn is_effectively_blocked(&self) -> bool {
        self.is_blocked && self.entity.kind.is_blockable()
    }

    /// First relation of the given kind, if any.
    pub fn relation(&self, kind: EntityKind) -> Option<EntityRef> {
        self.relations.iter().copied().find(|r| r.kind == kind)
    }
}
