//! SQLx / PostgreSQL error classification.
//!
//! The only place that knows PostgreSQL SQLSTATE codes. Everything upstream
//! sees a `StorageFailure`.
//!
//! | SQLx Error | PostgreSQL Error Code | FailureCategory |
//! |------------|----------------------|-----------------|
//! | RowNotFound | N/A | `NotFound` |
//! | Database (unique violation) | `23505` | `UniqueViolation` (+ constraint name) |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` |
//! | Database (not-null violation) | `23502` | `NotNullViolation` |
//! | Database (string data right truncation) | `22001` | `StringTooLong` |
//! | Database (check constraint violation) | `23514` | `CheckViolation` |
//! | Database (deadlock detected) | `40P01` | `Deadlock` |
//! | Database (other) | Any other | `Unrecognized` |
//! | PoolClosed, Io, Tls, ... | N/A | `Unrecognized` |

use jobboard_core::{FailureCategory, StorageFailure};

pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const NOT_NULL_VIOLATION: &str = "23502";
pub const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
pub const CHECK_VIOLATION: &str = "23514";
pub const DEADLOCK_DETECTED: &str = "40P01";

/// Classify a PostgreSQL error by SQLSTATE code.
pub fn classify_pg_code(
    code: Option<&str>,
    constraint: Option<&str>,
    message: impl Into<String>,
) -> StorageFailure {
    let category = match code {
        Some(UNIQUE_VIOLATION) => FailureCategory::UniqueViolation,
        Some(FOREIGN_KEY_VIOLATION) => FailureCategory::ForeignKeyViolation,
        Some(NOT_NULL_VIOLATION) => FailureCategory::NotNullViolation,
        Some(STRING_DATA_RIGHT_TRUNCATION) => FailureCategory::StringTooLong,
        Some(CHECK_VIOLATION) => FailureCategory::CheckViolation,
        Some(DEADLOCK_DETECTED) => FailureCategory::Deadlock,
        _ => FailureCategory::Unrecognized,
    };

    let failure = StorageFailure::new(category, message);
    match constraint {
        Some(name) => failure.with_constraint(name),
        None => failure,
    }
}

/// Map a SQLx error raised by `operation` to a storage failure.
pub fn from_sqlx(operation: &str, err: sqlx::Error) -> StorageFailure {
    match err {
        sqlx::Error::RowNotFound => {
            StorageFailure::not_found(format!("no rows returned in {operation}"))
        }
        sqlx::Error::Database(db_err) => {
            let message = format!("database error in {}: {}", operation, db_err.message());
            classify_pg_code(db_err.code().as_deref(), db_err.constraint(), message)
        }
        sqlx::Error::PoolClosed => {
            StorageFailure::unrecognized(format!("connection pool closed in {operation}"))
        }
        other => StorageFailure::unrecognized(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlstate_codes_map_to_categories() {
        let cases = [
            (UNIQUE_VIOLATION, FailureCategory::UniqueViolation),
            (FOREIGN_KEY_VIOLATION, FailureCategory::ForeignKeyViolation),
            (NOT_NULL_VIOLATION, FailureCategory::NotNullViolation),
            (STRING_DATA_RIGHT_TRUNCATION, FailureCategory::StringTooLong),
            (CHECK_VIOLATION, FailureCategory::CheckViolation),
            (DEADLOCK_DETECTED, FailureCategory::Deadlock),
            ("42P01", FailureCategory::Unrecognized),
        ];
        for (code, expected) in cases {
            assert_eq!(classify_pg_code(Some(code), None, "x").category, expected, "{code}");
        }
        assert_eq!(
            classify_pg_code(None, None, "x").category,
            FailureCategory::Unrecognized
        );
    }

    #[test]
    fn unique_violation_keeps_constraint_name() {
        let failure = classify_pg_code(
            Some(UNIQUE_VIOLATION),
            Some("users_username_key"),
            "duplicate key value violates unique constraint",
        );
        assert_eq!(failure.constraint.as_deref(), Some("users_username_key"));
    }

    #[test]
    fn row_not_found_is_not_found() {
        let failure = from_sqlx("find_entity", sqlx::Error::RowNotFound);
        assert!(failure.is_not_found());
        assert!(failure.message.contains("find_entity"));
    }

    #[test]
    fn transport_errors_are_unrecognized() {
        let failure = from_sqlx("list_entities", sqlx::Error::PoolClosed);
        assert_eq!(failure.category, FailureCategory::Unrecognized);

        let failure = from_sqlx("write", sqlx::Error::PoolTimedOut);
        assert_eq!(failure.category, FailureCategory::Unrecognized);
    }
}
