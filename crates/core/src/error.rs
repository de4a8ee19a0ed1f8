//! Domain error model.
//!
//! `ErrorKind` is the closed, transport-independent vocabulary every failure
//! is reduced to before it leaves the core. `DomainError` pairs a kind with
//! an optional private context string (the original failure, for logs).

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Coarse classification of error kinds.
///
/// The outward boundary maps groups, not individual kinds, to transport
/// status codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorGroup {
    /// Caller can recover by correcting the input.
    Validation,
    /// Resource absent or soft-deleted.
    NotFound,
    /// No usable identity could be established for the request.
    Authentication,
    /// Identity established but not allowed (role, ownership, blocked entity).
    Authorization,
    /// Composite create/update failed after validation passed.
    OperationFailure,
    /// Translated storage constraint violation.
    StorageConstraint,
    /// Anything unexpected.
    Internal,
}

macro_rules! error_kinds {
    ($($group:ident { $($variant:ident => $code:literal, $message:literal;)+ })+) => {
        /// Stable domain error kind.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ErrorKind {
            $($($variant,)+)+
        }

        impl ErrorKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [ErrorKind] = &[$($(ErrorKind::$variant,)+)+];

            pub fn group(self) -> ErrorGroup {
                match self {
                    $($(ErrorKind::$variant => ErrorGroup::$group,)+)+
                }
            }

            /// Machine-readable code (snake_case), safe to expose.
            pub fn code(self) -> &'static str {
                match self {
                    $($(ErrorKind::$variant => $code,)+)+
                }
            }

            /// Human-readable message, safe to expose.
            pub fn message(self) -> &'static str {
                match self {
                    $($(ErrorKind::$variant => $message,)+)+
                }
            }
        }
    };
}

error_kinds! {
    Validation {
        InvalidInput => "invalid_input", "invalid input";
        MissingRequiredField => "missing_required_field", "missing required field";
        InvalidId => "invalid_id", "invalid identifier";
        MalformedBody => "malformed_body", "malformed request body";
        UsernameExists => "username_exists", "username already exists";
        EmailExists => "email_exists", "email already exists";
        DuplicateBusinessKey => "duplicate_business_key", "record already exists";
        ApplicationAlreadyExists => "application_already_exists", "application already exists";
    }
    NotFound {
        RecordNotFound => "record_not_found", "record not found";
        UserNotFound => "user_not_found", "user not found";
        CompanyNotFound => "company_not_found", "company not found";
        VacancyNotFound => "vacancy_not_found", "vacancy not found";
        ResumeNotFound => "resume_not_found", "resume not found";
        ApplicationNotFound => "application_not_found", "application not found";
        CategoryNotFound => "category_not_found", "category not found";
    }
    Authentication {
        AuthorizationHeaderMissing => "authorization_header_missing", "authorization header is missing";
        MalformedAuthorizationHeader => "malformed_authorization_header", "authorization header must use the Bearer scheme";
        EmptyToken => "empty_token", "bearer token is empty";
        InvalidToken => "invalid_token", "invalid token";
        ExpiredToken => "expired_token", "token has expired";
        UnexpectedSigningMethod => "unexpected_signing_method", "unexpected signing method";
        IncorrectUsernameOrPassword => "incorrect_username_or_password", "incorrect username or password";
    }
    Authorization {
        PermissionDenied => "permission_denied", "permission denied";
        AccessDenied => "access_denied", "access denied";
        UserBlocked => "user_blocked", "user is blocked";
        ResumeBlocked => "resume_blocked", "resume is blocked";
        VacancyBlocked => "vacancy_blocked", "vacancy is blocked";
    }
    OperationFailure {
        ResumeCreationFailed => "resume_creation_failed", "failed to create resume";
        VacancyCreationFailed => "vacancy_creation_failed", "failed to create vacancy";
        ApplicationCreationFailed => "application_creation_failed", "failed to create application";
        ReviewCreationFailed => "review_creation_failed", "failed to create review";
        ReportCreationFailed => "report_creation_failed", "failed to create report";
        TokenParseError => "token_parse_error", "failed to produce session token";
    }
    StorageConstraint {
        UniqueViolation => "unique_violation", "unique constraint violated";
        ForeignKeyViolation => "foreign_key_violation", "foreign key constraint violated";
        NotNullViolation => "not_null_violation", "not-null constraint violated";
        StringTooLong => "string_too_long", "value too long";
        CheckConstraintViolation => "check_constraint_violation", "check constraint violated";
        DeadlockDetected => "deadlock_detected", "deadlock detected";
    }
    Internal {
        Internal => "internal", "something went wrong";
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Domain-level error.
///
/// `Display` renders only the kind's public message. The context carries the
/// original failure text and must never be rendered to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct DomainError {
    kind: ErrorKind,
    context: Option<String>,
}

impl DomainError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub fn with_context(kind: ErrorKind, context: impl Into<String>) -> Self {
        Self {
            kind,
            context: Some(context.into()),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_context(ErrorKind::InvalidInput, msg)
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::with_context(ErrorKind::MissingRequiredField, field)
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::with_context(ErrorKind::InvalidId, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_context(ErrorKind::Internal, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn group(&self) -> ErrorGroup {
        self.kind.group()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl From<ErrorKind> for DomainError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
