//! `Authorization: Bearer <token>` extraction.

use jobboard_core::{DomainResult, ErrorKind};

use crate::{Principal, TokenService};

const SCHEME: &str = "Bearer ";

/// Pull the token out of a raw `Authorization` header value.
///
/// Missing header, wrong scheme and empty token each fail with their own kind
/// before the verifier is involved.
pub fn extract_bearer(header: Option<&str>) -> DomainResult<&str> {
    let header = header.ok_or(ErrorKind::AuthorizationHeaderMissing)?;
    let token = header
        .strip_prefix(SCHEME)
        .ok_or(ErrorKind::MalformedAuthorizationHeader)?
        .trim();
    if token.is_empty() {
        return Err(ErrorKind::EmptyToken.into());
    }
    Ok(token)
}

/// Extract and verify in one step.
pub fn authenticate_request(tokens: &TokenService, header: Option<&str>) -> DomainResult<Principal> {
    let token = extract_bearer(header)?;
    tokens.verify(token)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jobboard_core::UserId;

    use super::*;
    use crate::{AuthConfig, Role};

    #[test]
    fn distinct_failures_before_verification() {
        let kind = |h: Option<&str>| extract_bearer(h).unwrap_err().kind();
        assert_eq!(kind(None), ErrorKind::AuthorizationHeaderMissing);
        assert_eq!(kind(Some("Basic dXNlcjpwdw==")), ErrorKind::MalformedAuthorizationHeader);
        assert_eq!(kind(Some("bearer abc")), ErrorKind::MalformedAuthorizationHeader);
        assert_eq!(kind(Some("Bearer")), ErrorKind::MalformedAuthorizationHeader);
        assert_eq!(kind(Some("Bearer ")), ErrorKind::EmptyToken);
        assert_eq!(kind(Some("Bearer    ")), ErrorKind::EmptyToken);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(extract_bearer(Some("Bearer  abc.def.ghi ")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn authenticates_issued_token() {
        let tokens = TokenService::new(
            AuthConfig::new("secret", Duration::minutes(5), "jobboard").unwrap(),
        );
        let subject = UserId::new();
        let token = tokens.issue(subject, "carol", Role::Admin).unwrap();
        let header = format!("Bearer {token}");

        let principal = authenticate_request(&tokens, Some(&header)).unwrap();
        assert_eq!(principal.subject_id, subject);
        assert!(principal.is_admin());
    }
}
