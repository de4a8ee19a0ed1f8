//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{EntityKind, EntityRef};
use crate::error::DomainError;

/// Identifier of a user account (also the subject of a session token).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

/// Identifier of an employer company.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(Uuid);

/// Identifier of a vacancy (job posting).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(Uuid);

/// Identifier of a specialist's resume.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(Uuid);

/// Identifier of an application (resume submitted to a vacancy).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(Uuid);

/// Identifier of a vacancy category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal, $kind:expr) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Reference to the entity this identifier names.
            pub fn entity_ref(&self) -> EntityRef {
                EntityRef::new($kind, self.0)
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl From<$t> for EntityRef {
            fn from(value: $t) -> Self {
                value.entity_ref()
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(UserId, "UserId", EntityKind::User);
impl_uuid_newtype!(CompanyId, "CompanyId", EntityKind::Company);
impl_uuid_newtype!(VacancyId, "VacancyId", EntityKind::Vacancy);
impl_uuid_newtype!(ResumeId, "ResumeId", EntityKind::Resume);
impl_uuid_newtype!(ApplicationId, "ApplicationId", EntityKind::Application);
impl_uuid_newtype!(CategoryId, "CategoryId", EntityKind::Category);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn parse_rejects_garbage_with_invalid_id() {
        let err = "not-a-uuid".parse::<VacancyId>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidId);
        assert!(err.context().unwrap().starts_with("VacancyId"));
    }

    #[test]
    fn entity_ref_carries_kind() {
        let id = ResumeId::new();
        let r: EntityRef = id.into();
        assert_eq!(r.kind, EntityKind::Resume);
        assert_eq!(&r.id, id.as_uuid());
    }
}
