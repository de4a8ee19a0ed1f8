//! Access gate: role and ownership checks.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use jobboard_core::{DomainError, DomainResult, ErrorKind, UserId};

use crate::{Principal, Role, RoleSet};

/// Role check: the principal's role must be in `required`.
pub fn authorize_role(principal: &Principal, required: &RoleSet) -> DomainResult<()> {
    if required.contains(principal.role) {
        return Ok(());
    }
    debug!(
        subject = %principal.subject_id,
        role = %principal.role,
        required = %required,
        "role check denied"
    );
    Err(DomainError::with_context(
        ErrorKind::PermissionDenied,
        format!("role '{}' not in {}", principal.role, required),
    ))
}

/// Ownership check: the principal must be the resource owner. Admins bypass.
pub fn authorize_owner(principal: &Principal, owner_id: UserId) -> DomainResult<()> {
    if principal.is_admin() || principal.subject_id == owner_id {
        return Ok(());
    }
    debug!(
        subject = %principal.subject_id,
        owner = %owner_id,
        "ownership check denied"
    );
    Err(ErrorKind::AccessDenied.into())
}

/// Role check first, then ownership when an owner is given.
pub fn authorize(
    principal: &Principal,
    required: &RoleSet,
    owner_id: Option<UserId>,
) -> DomainResult<()> {
    authorize_role(principal, required)?;
    if let Some(owner_id) = owner_id {
        authorize_owner(principal, owner_id)?;
    }
    Ok(())
}

/// Protected business operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ViewProfile,
    ListUsers,
    BlockUser,
    CreateCompany,
    UpdateCompany,
    ListVacancies,
    ViewVacancy,
    CreateVacancy,
    UpdateVacancy,
    DeleteVacancy,
    BlockVacancy,
    ViewResume,
    CreateResume,
    UpdateResume,
    DeleteResume,
    BlockResume,
    ApplyToVacancy,
    WithdrawApplication,
    ChangeApplicationStatus,
    ManageCategories,
}

impl Operation {
    pub const ALL: [Operation; 20] = [
        Operation::ViewProfile,
        Operation::ListUsers,
        Operation::BlockUser,
        Operation::CreateCompany,
        Operation::UpdateCompany,
        Operation::ListVacancies,
        Operation::ViewVacancy,
        Operation::CreateVacancy,
        Operation::UpdateVacancy,
        Operation::DeleteVacancy,
        Operation::BlockVacancy,
        Operation::ViewResume,
        Operation::CreateResume,
        Operation::UpdateResume,
        Operation::DeleteResume,
        Operation::BlockResume,
        Operation::ApplyToVacancy,
        Operation::WithdrawApplication,
        Operation::ChangeApplicationStatus,
        Operation::ManageCategories,
    ];
}

/// What an operation demands of the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub roles: RoleSet,
    /// Whether the caller must own the target resource.
    pub ownership: bool,
}

impl Requirement {
    pub fn role(roles: RoleSet) -> Self {
        Self {
            roles,
            ownership: false,
        }
    }

    pub fn owned(roles: RoleSet) -> Self {
        Self {
            roles,
            ownership: true,
        }
    }
}

/// Operation → requirement table.
///
/// Built once at startup; read-only afterwards. Operations missing from the
/// table are denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    requirements: HashMap<Operation, Requirement>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        use Operation::*;
        use Role::*;

        let any = RoleSet::any();
        let admin = RoleSet::only(Admin);
        let employer = RoleSet::of(&[Admin, Employer]);
        let specialist = RoleSet::of(&[Admin, Specialist]);

        Self::empty()
            .with(ViewProfile, Requirement::role(any))
            .with(ListUsers, Requirement::role(admin))
            .with(BlockUser, Requirement::role(admin))
            .with(CreateCompany, Requirement::role(employer))
            .with(UpdateCompany, Requirement::owned(employer))
            .with(ListVacancies, Requirement::role(any))
            .with(ViewVacancy, Requirement::role(any))
            .with(CreateVacancy, Requirement::role(employer))
            .with(UpdateVacancy, Requirement::owned(employer))
            .with(DeleteVacancy, Requirement::owned(employer))
            .with(BlockVacancy, Requirement::role(admin))
            .with(ViewResume, Requirement::role(any))
            .with(CreateResume, Requirement::role(specialist))
            .with(UpdateResume, Requirement::owned(specialist))
            .with(DeleteResume, Requirement::owned(specialist))
            .with(BlockResume, Requirement::role(admin))
            .with(ApplyToVacancy, Requirement::role(RoleSet::only(Specialist)))
            .with(WithdrawApplication, Requirement::owned(specialist))
            .with(ChangeApplicationStatus, Requirement::owned(employer))
            .with(ManageCategories, Requirement::role(admin))
    }
}

impl AccessPolicy {
    pub fn empty() -> Self {
        Self {
            requirements: HashMap::new(),
        }
    }

    pub fn with(mut self, operation: Operation, requirement: Requirement) -> Self {
        self.requirements.insert(operation, requirement);
        self
    }

    pub fn requirement(&self, operation: Operation) -> Option<Requirement> {
        self.requirements.get(&operation).copied()
    }

    fn lookup(&self, operation: Operation) -> DomainResult<Requirement> {
        self.requirement(operation).ok_or_else(|| {
            debug!(?operation, "operation has no requirement; denying");
            DomainError::with_context(
                ErrorKind::PermissionDenied,
                format!("no policy for {operation:?}"),
            )
        })
    }

    /// Role half of the requirement. Handlers call this before loading the
    /// target resource.
    pub fn check_role(&self, principal: &Principal, operation: Operation) -> DomainResult<()> {
        let requirement = self.lookup(operation)?;
        authorize_role(principal, &requirement.roles)
    }

    /// Ownership half of the requirement; a no-op for role-only operations.
    pub fn check_owner(
        &self,
        principal: &Principal,
        operation: Operation,
        owner_id: Option<UserId>,
    ) -> DomainResult<()> {
        let requirement = self.lookup(operation)?;
        if !requirement.ownership {
            return Ok(());
        }
        match owner_id {
            Some(owner_id) => authorize_owner(principal, owner_id),
            // Ownerless resource: only admins may touch it.
            None if principal.is_admin() => Ok(()),
            None => Err(ErrorKind::AccessDenied.into()),
        }
    }

    /// Check `principal` against the operation's requirement.
    ///
    /// `owner_id` is the target resource's owner; it is required (and checked)
    /// only for operations that demand ownership.
    pub fn check(
        &self,
        principal: &Principal,
        operation: Operation,
        owner_id: Option<UserId>,
    ) -> DomainResult<()> {
        self.check_role(principal, operation)?;
        self.check_owner(principal, operation, owner_id)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), "p", role)
    }

    #[test]
    fn role_check_denies_outsiders() {
        let p = principal(Role::Specialist);
        let err = authorize_role(&p, &RoleSet::only(Role::Employer)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(authorize_role(&p, &RoleSet::any()).is_ok());
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = principal(Role::Admin);
        let someone_else = UserId::new();
        assert!(authorize(&admin, &RoleSet::only(Role::Admin), Some(someone_else)).is_ok());
    }

    #[test]
    fn employer_must_own_resource() {
        let employer = principal(Role::Employer);
        let required = RoleSet::of(&[Role::Admin, Role::Employer]);

        assert!(authorize(&employer, &required, Some(employer.subject_id)).is_ok());
        let err = authorize(&employer, &required, Some(UserId::new())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[test]
    fn role_is_checked_before_ownership() {
        let specialist = principal(Role::Specialist);
        let err = authorize(
            &specialist,
            &RoleSet::only(Role::Employer),
            Some(specialist.subject_id),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn default_policy_covers_every_operation() {
        let policy = AccessPolicy::default();
        for op in Operation::ALL {
            assert!(policy.requirement(op).is_some(), "{op:?}");
        }
    }

    #[test]
    fn policy_denies_unknown_operations() {
        let policy = AccessPolicy::empty();
        let err = policy
            .check(&principal(Role::Admin), Operation::ListUsers, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn policy_applies_ownership() {
        let policy = AccessPolicy::default();
        let owner = principal(Role::Employer);
        let other = principal(Role::Employer);

        assert!(policy.check(&owner, Operation::DeleteVacancy, Some(owner.subject_id)).is_ok());
        assert_eq!(
            policy
                .check(&other, Operation::DeleteVacancy, Some(owner.subject_id))
                .unwrap_err()
                .kind(),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            policy
                .check(&principal(Role::Specialist), Operation::DeleteVacancy, Some(owner.subject_id))
                .unwrap_err()
                .kind(),
            ErrorKind::PermissionDenied
        );
        assert!(
            policy
                .check(&principal(Role::Admin), Operation::DeleteVacancy, Some(owner.subject_id))
                .is_ok()
        );
    }

    #[test]
    fn role_only_operations_ignore_owner() {
        let policy = AccessPolicy::default();
        let specialist = principal(Role::Specialist);
        assert!(
            policy
                .check_owner(&specialist, Operation::ViewVacancy, Some(UserId::new()))
                .is_ok()
        );
        assert_eq!(
            policy
                .check_owner(&specialist, Operation::WithdrawApplication, None)
                .unwrap_err()
                .kind(),
            ErrorKind::AccessDenied
        );
    }

    proptest! {
        /// Property: with an owner given, admins always pass and employers
        /// pass iff they are the owner.
        #[test]
        fn ownership_rule(is_owner in any::<bool>(), as_admin in any::<bool>()) {
            let role = if as_admin { Role::Admin } else { Role::Employer };
            let p = principal(role);
            let owner = if is_owner { p.subject_id } else { UserId::new() };
            let required = RoleSet::of(&[Role::Admin, Role::Employer]);

            let result = authorize(&p, &required, Some(owner));
            prop_assert_eq!(result.is_ok(), as_admin || is_owner);
        }
    }
}
