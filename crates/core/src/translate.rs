//! Storage failure → domain error translation.
//!
//! | `FailureCategory` | `ErrorKind` | Log level |
//! |---|---|---|
//! | `NotFound` | `RecordNotFound` | debug |
//! | `UniqueViolation` (constraint in table) | table entry, e.g. `UsernameExists` | warn |
//! | `UniqueViolation` (no match) | `UniqueViolation` | warn |
//! | `ForeignKeyViolation` | `ForeignKeyViolation` | warn |
//! | `NotNullViolation` | `NotNullViolation` | warn |
//! | `StringTooLong` | `StringTooLong` | warn |
//! | `CheckViolation` | `CheckConstraintViolation` | warn |
//! | `Deadlock` | `DeadlockDetected` | error |
//! | `Unrecognized` | `Internal` (original message kept as context) | error |
//!
//! Constraint names are matched exactly; there is no substring matching.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::{debug, error, warn};

use crate::error::{DomainError, ErrorKind};
use crate::store::{FailureCategory, StorageFailure};

/// Constraint name of the unique index on `users.username`.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
/// Constraint name of the unique index on `users.email`.
pub const EMAIL_CONSTRAINT: &str = "users_email_key";
/// Constraint name of the one-application-per-resume-and-vacancy index.
pub const APPLICATION_CONSTRAINT: &str = "applications_resume_id_vacancy_id_key";

static DEFAULT_TABLE: LazyLock<ConstraintTable> = LazyLock::new(ConstraintTable::default);

/// Exact constraint-name → error-kind lookup for unique violations.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTable {
    entries: HashMap<String, ErrorKind>,
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self::empty()
            .with(USERNAME_CONSTRAINT, ErrorKind::UsernameExists)
            .with(EMAIL_CONSTRAINT, ErrorKind::EmailExists)
            .with(APPLICATION_CONSTRAINT, ErrorKind::ApplicationAlreadyExists)
    }
}

impl ConstraintTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with(mut self, constraint: impl Into<String>, kind: ErrorKind) -> Self {
        self.entries.insert(constraint.into(), kind);
        self
    }

    pub fn lookup(&self, constraint: &str) -> Option<ErrorKind> {
        self.entries.get(constraint).copied()
    }

    /// Translate a storage failure into exactly one domain error.
    pub fn translate(&self, failure: &StorageFailure) -> DomainError {
        let constraint = failure.constraint.as_deref();
        let kind = match failure.category {
            FailureCategory::NotFound => ErrorKind::RecordNotFound,
            FailureCategory::UniqueViolation => constraint
                .and_then(|c| self.lookup(c))
                .unwrap_or(ErrorKind::UniqueViolation),
            FailureCategory::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
            FailureCategory::NotNullViolation => ErrorKind::NotNullViolation,
            FailureCategory::StringTooLong => ErrorKind::StringTooLong,
            FailureCategory::CheckViolation => ErrorKind::CheckConstraintViolation,
            FailureCategory::Deadlock => ErrorKind::DeadlockDetected,
            FailureCategory::Unrecognized => ErrorKind::Internal,
        };

        match failure.category {
            FailureCategory::NotFound => {
                debug!(category = %failure.category, error = %failure.message, "record not found");
            }
            FailureCategory::Deadlock | FailureCategory::Unrecognized => {
                error!(
                    category = %failure.category,
                    constraint = ?constraint,
                    error = %failure.message,
                    "unexpected storage failure"
                );
            }
            _ => {
                warn!(
                    category = %failure.category,
                    constraint = ?constraint,
                    kind = kind.code(),
                    "storage constraint violated"
                );
            }
        }

        DomainError::with_context(kind, failure.message.clone())
    }
}

/// Translate with the default constraint table.
pub fn translate(failure: &StorageFailure) -> DomainError {
    DEFAULT_TABLE.translate(failure)
}

impl From<StorageFailure> for DomainError {
    fn from(failure: StorageFailure) -> Self {
        translate(&failure)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn unique(constraint: &str) -> StorageFailure {
        StorageFailure::new(FailureCategory::UniqueViolation, "duplicate key value")
            .with_constraint(constraint)
    }

    #[test]
    fn not_found_maps_to_record_not_found() {
        let err = translate(&StorageFailure::not_found("no rows"));
        assert_eq!(err.kind(), ErrorKind::RecordNotFound);
    }

    #[test]
    fn unique_violation_uses_exact_constraint_name() {
        assert_eq!(
            translate(&unique(USERNAME_CONSTRAINT)).kind(),
            ErrorKind::UsernameExists
        );
        assert_eq!(
            translate(&unique(EMAIL_CONSTRAINT)).kind(),
            ErrorKind::EmailExists
        );
        // A name merely containing "username" is not a match.
        assert_eq!(
            translate(&unique("legacy_username_idx")).kind(),
            ErrorKind::UniqueViolation
        );
    }

    #[test]
    fn unique_violation_without_constraint_is_generic() {
        let failure = StorageFailure::new(FailureCategory::UniqueViolation, "dup");
        assert_eq!(translate(&failure).kind(), ErrorKind::UniqueViolation);
    }

    #[test]
    fn constraint_categories_map_one_to_one() {
        let cases = [
            (FailureCategory::ForeignKeyViolation, ErrorKind::ForeignKeyViolation),
            (FailureCategory::NotNullViolation, ErrorKind::NotNullViolation),
            (FailureCategory::StringTooLong, ErrorKind::StringTooLong),
            (FailureCategory::CheckViolation, ErrorKind::CheckConstraintViolation),
            (FailureCategory::Deadlock, ErrorKind::DeadlockDetected),
        ];
        for (category, expected) in cases {
            let err = translate(&StorageFailure::new(category, "boom"));
            assert_eq!(err.kind(), expected, "{category}");
        }
    }

    #[test]
    fn unrecognized_keeps_original_as_private_context() {
        let err = translate(&StorageFailure::unrecognized("connection reset by peer"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.context(), Some("connection reset by peer"));
        assert!(!err.to_string().contains("connection reset"));
    }

    #[test]
    fn custom_table_entries_take_effect() {
        let table = ConstraintTable::empty().with("companies_name_key", ErrorKind::DuplicateBusinessKey);
        assert_eq!(
            table.translate(&unique("companies_name_key")).kind(),
            ErrorKind::DuplicateBusinessKey
        );
        assert_eq!(
            table.translate(&unique(USERNAME_CONSTRAINT)).kind(),
            ErrorKind::UniqueViolation
        );
    }

    fn any_category() -> impl Strategy<Value = FailureCategory> {
        prop_oneof![
            Just(FailureCategory::NotFound),
            Just(FailureCategory::UniqueViolation),
            Just(FailureCategory::ForeignKeyViolation),
            Just(FailureCategory::NotNullViolation),
            Just(FailureCategory::StringTooLong),
            Just(FailureCategory::CheckViolation),
            Just(FailureCategory::Deadlock),
            Just(FailureCategory::Unrecognized),
        ]
    }

    proptest! {
        /// Property: translation is a pure function of the failure value.
        #[test]
        fn translation_is_deterministic(
            category in any_category(),
            constraint in proptest::option::of(prop_oneof![
                Just(USERNAME_CONSTRAINT.to_string()),
                Just(EMAIL_CONSTRAINT.to_string()),
                "[a-z_]{1,24}",
            ]),
            message in ".{0,40}",
        ) {
            let failure = StorageFailure { category, constraint, message };
            let first = translate(&failure);
            let second = translate(&failure);
            prop_assert_eq!(first, second);
        }
    }
}
