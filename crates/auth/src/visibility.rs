//! Blocked-entity visibility rules.
//!
//! A blocked user, resume or vacancy is visible only to an admin or to its
//! owner. The rule reaches through relations: a record that references a
//! blocked entity is treated as if it were blocked itself for callers who
//! may not see that entity. Relations are followed one level deep.
//!
//! - detail fetch: fail with the entity-specific blocked kind
//! - collection fetch: silently drop what the caller may not see
//! - dependent write: resolve every touched entity first and refuse if any is
//!   blocked, whoever the caller is; runs before anything reaches storage
//!
//! Blocked state is read fresh on every call, never cached across requests.

use std::collections::HashMap;

use tracing::debug;

use jobboard_core::{
    DomainError, DomainResult, EntityKind, EntityRecord, EntityRef, EntityStore, ErrorKind,
    ListFilter, translate,
};

use crate::Principal;

/// Whether `principal` may see `record` on its own (relations not considered).
pub fn can_see(principal: &Principal, record: &EntityRecord) -> bool {
    !record.is_effectively_blocked() || principal.is_admin() || principal.owns(record.owner_id)
}

/// Fail with the record's blocked kind if `principal` may not see it.
pub fn ensure_visible(principal: &Principal, record: &EntityRecord) -> DomainResult<()> {
    if can_see(principal, record) {
        return Ok(());
    }
    let kind = record
        .kind()
        .blocked_kind()
        .unwrap_or(ErrorKind::PermissionDenied);
    debug!(
        subject = %principal.subject_id,
        entity = %record.entity,
        "blocked entity hidden from caller"
    );
    Err(DomainError::with_context(kind, record.entity.to_string()))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum RelationState {
    Visible,
    Hidden,
    Missing,
}

/// Visibility filter over an entity store.
pub struct VisibilityFilter<S> {
    store: S,
}

impl<S: EntityStore> VisibilityFilter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch one entity, translating not-found to the entity-specific kind.
    /// No visibility check.
    pub async fn resolve(&self, entity: EntityRef) -> DomainResult<EntityRecord> {
        self.store.find_entity(entity).await.map_err(|failure| {
            if failure.is_not_found() {
                debug!(%entity, "entity not found");
                DomainError::with_context(entity.kind.not_found_kind(), failure.message)
            } else {
                translate(&failure)
            }
        })
    }

    /// Detail fetch. Fails loudly when the entity, or one of its blockable
    /// relations, is blocked for the caller.
    pub async fn fetch_visible(
        &self,
        principal: &Principal,
        entity: EntityRef,
    ) -> DomainResult<EntityRecord> {
        let record = self.resolve(entity).await?;
        ensure_visible(principal, &record)?;
        for relation in blockable(&record.relations) {
            let related = self.resolve(relation).await?;
            ensure_visible(principal, &related)?;
        }
        Ok(record)
    }

    /// Collection post-filter. Drops records the caller may not see instead of
    /// failing the request.
    pub async fn filter_for_visibility(
        &self,
        principal: &Principal,
        records: Vec<EntityRecord>,
    ) -> DomainResult<Vec<EntityRecord>> {
        let mut relation_cache: HashMap<EntityRef, RelationState> = HashMap::new();
        let mut visible = Vec::with_capacity(records.len());

        'records: for record in records {
            if !can_see(principal, &record) {
                debug!(entity = %record.entity, "dropping blocked entity from listing");
                continue;
            }
            for relation in blockable(&record.relations) {
                let state = match relation_cache.get(&relation) {
                    Some(state) => *state,
                    None => {
                        let state = self.relation_state(principal, relation).await?;
                        relation_cache.insert(relation, state);
                        state
                    }
                };
                if state != RelationState::Visible {
                    debug!(
                        entity = %record.entity,
                        %relation,
                        ?state,
                        "dropping entity with hidden relation from listing"
                    );
                    continue 'records;
                }
            }
            visible.push(record);
        }

        Ok(visible)
    }

    async fn relation_state(
        &self,
        principal: &Principal,
        relation: EntityRef,
    ) -> DomainResult<RelationState> {
        match self.store.find_entity(relation).await {
            Ok(related) if can_see(principal, &related) => Ok(RelationState::Visible),
            Ok(_) => Ok(RelationState::Hidden),
            Err(failure) if failure.is_not_found() => Ok(RelationState::Missing),
            Err(failure) => Err(translate(&failure)),
        }
    }

    /// List then post-filter.
    pub async fn list_visible(
        &self,
        principal: &Principal,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> DomainResult<Vec<EntityRecord>> {
        let records = self
            .store
            .list_entities(kind, filter)
            .await
            .map_err(|f| translate(&f))?;
        self.filter_for_visibility(principal, records).await
    }

    /// A non-admin caller whose own account is blocked may not act.
    pub async fn check_actor_not_blocked(&self, principal: &Principal) -> DomainResult<()> {
        if principal.is_admin() {
            return Ok(());
        }
        let actor = self.resolve(principal.subject_id.entity_ref()).await?;
        if actor.is_effectively_blocked() {
            debug!(subject = %principal.subject_id, "blocked user attempted an operation");
            return Err(DomainError::with_context(
                ErrorKind::UserBlocked,
                actor.entity.to_string(),
            ));
        }
        Ok(())
    }

    /// Every dependency must exist and be visible to the caller. The first
    /// failing dependency (in the given order) is reported.
    pub async fn check_dependencies_visible(
        &self,
        principal: &Principal,
        dependencies: &[EntityRef],
    ) -> DomainResult<Vec<EntityRecord>> {
        let mut resolved = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let record = self.resolve(*dependency).await?;
            ensure_visible(principal, &record)?;
            resolved.push(record);
        }
        Ok(resolved)
    }

    /// Gate for writes that touch other entities: acting user first, then
    /// each dependency. Owners and admins get no exemption here; a blocked
    /// dependency refuses the write. Read-only; returns the resolved
    /// dependencies.
    pub async fn guard_dependent_write(
        &self,
        principal: &Principal,
        dependencies: &[EntityRef],
    ) -> DomainResult<Vec<EntityRecord>> {
        self.check_actor_not_blocked(principal).await?;
        let mut resolved = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let record = self.resolve(*dependency).await?;
            if record.is_effectively_blocked() {
                debug!(
                    subject = %principal.subject_id,
                    entity = %record.entity,
                    "write against blocked dependency refused"
                );
                let kind = record
                    .kind()
                    .blocked_kind()
                    .unwrap_or(ErrorKind::PermissionDenied);
                return Err(DomainError::with_context(kind, record.entity.to_string()));
            }
            resolved.push(record);
        }
        Ok(resolved)
    }
}

fn blockable(relations: &[EntityRef]) -> impl Iterator<Item = EntityRef> + '_ {
    relations.iter().copied().filter(|r| r.kind.is_blockable())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jobboard_core::{
        ApplicationId, CompanyId, EntityWrite, ResumeId, StorageFailure, UserId, VacancyId,
    };
    use jobboard_infra::InMemoryStore;

    use super::*;
    use crate::Role;

    struct World {
        filter: VisibilityFilter<Arc<InMemoryStore>>,
        employer: Principal,
        specialist: Principal,
        admin: Principal,
        vacancy: VacancyId,
        resume: ResumeId,
    }

    async fn world() -> World {
        let store = Arc::new(InMemoryStore::new());
        let employer = Principal::new(UserId::new(), "acme-hr", Role::Employer);
        let specialist = Principal::new(UserId::new(), "dev", Role::Specialist);
        let admin = Principal::new(UserId::new(), "root", Role::Admin);

        for p in [&employer, &specialist, &admin] {
            store.put(EntityRecord::new(p.subject_id.into(), Some(p.subject_id))).unwrap();
        }

        let company = CompanyId::new();
        store.put(EntityRecord::new(company.into(), Some(employer.subject_id))).unwrap();

        let vacancy = VacancyId::new();
        store
            .put(
                EntityRecord::new(vacancy.into(), Some(employer.subject_id))
                    .with_relation(company)
                    .with_relation(employer.subject_id),
            )
            .unwrap();

        let resume = ResumeId::new();
        store
            .put(
                EntityRecord::new(resume.into(), Some(specialist.subject_id))
                    .with_relation(specialist.subject_id),
            )
            .unwrap();

        World {
            filter: VisibilityFilter::new(store),
            employer,
            specialist,
            admin,
            vacancy,
            resume,
        }
    }

    fn store(w: &World) -> &InMemoryStore {
        w.filter.store()
    }

    fn block(w: &World, entity: EntityRef) {
        store(w).set_blocked(entity, true).unwrap();
    }

    #[tokio::test]
    async fn blocked_vacancy_visible_only_to_owner_and_admin() {
        let w = world().await;
        block(&w, w.vacancy.into());

        let err = w
            .filter
            .check_dependencies_visible(&w.specialist, &[w.vacancy.into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VacancyBlocked);

        for p in [&w.employer, &w.admin] {
            assert!(
                w.filter
                    .check_dependencies_visible(p, &[w.vacancy.into()])
                    .await
                    .is_ok()
            );
        }
    }

    #[tokio::test]
    async fn detail_fetch_fails_loudly() {
        let w = world().await;
        block(&w, w.resume.into());

        let err = w
            .filter
            .fetch_visible(&w.employer, w.resume.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResumeBlocked);

        let record = w
            .filter
            .fetch_visible(&w.specialist, w.resume.into())
            .await
            .unwrap();
        assert_eq!(record.entity, w.resume.entity_ref());
    }

    #[tokio::test]
    async fn detail_fetch_checks_blocked_relations() {
        let w = world().await;
        block(&w, w.employer.subject_id.into());

        let err = w
            .filter
            .fetch_visible(&w.specialist, w.vacancy.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserBlocked);
    }

    #[tokio::test]
    async fn missing_entity_uses_specific_not_found() {
        let w = world().await;
        let err = w
            .filter
            .fetch_visible(&w.admin, VacancyId::new().into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VacancyNotFound);
    }

    #[tokio::test]
    async fn listing_drops_blocked_without_error() {
        let w = world().await;
        let mut ids = Vec::new();
        for _ in 0..3 {
            let id = VacancyId::new();
            store(&w).put(EntityRecord::new(id.into(), Some(w.employer.subject_id))).unwrap();
            ids.push(id);
        }
        let records: Vec<EntityRecord> = ids
            .iter()
            .map(|id| EntityRecord::new((*id).into(), Some(w.employer.subject_id)))
            .enumerate()
            .map(|(i, r)| r.blocked(i == 1))
            .collect();

        let visible = w
            .filter
            .filter_for_visibility(&w.specialist, records.clone())
            .await
            .unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|r| r.entity != ids[1].entity_ref()));

        let owner_view = w
            .filter
            .filter_for_visibility(&w.employer, records)
            .await
            .unwrap();
        assert_eq!(owner_view.len(), 3);
    }

    #[tokio::test]
    async fn listing_drops_entities_with_blocked_relations() {
        let w = world().await;
        block(&w, w.employer.subject_id.into());

        let visible = w
            .filter
            .list_visible(&w.specialist, EntityKind::Vacancy, &ListFilter::default())
            .await
            .unwrap();
        assert!(visible.is_empty());

        let admin_view = w
            .filter
            .list_visible(&w.admin, EntityKind::Vacancy, &ListFilter::default())
            .await
            .unwrap();
        assert_eq!(admin_view.len(), 1);
    }

    #[tokio::test]
    async fn dependent_write_refuses_blocked_actor() {
        let w = world().await;
        block(&w, w.specialist.subject_id.into());

        let err = w
            .filter
            .guard_dependent_write(&w.specialist, &[w.resume.into(), w.vacancy.into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserBlocked);
    }

    #[tokio::test]
    async fn dependent_write_refuses_blocked_vacancy_and_leaves_store_untouched() {
        let w = world().await;
        block(&w, w.vacancy.into());

        let err = w
            .filter
            .guard_dependent_write(&w.specialist, &[w.resume.into(), w.vacancy.into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VacancyBlocked);

        let applications = store(&w)
            .list_entities(EntityKind::Application, &ListFilter::default())
            .await
            .unwrap();
        assert!(applications.is_empty());
    }

    #[tokio::test]
    async fn dependent_write_refuses_owner_of_blocked_resume() {
        let w = world().await;
        block(&w, w.resume.into());

        let err = w
            .filter
            .guard_dependent_write(&w.specialist, &[w.resume.into(), w.vacancy.into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResumeBlocked);
    }

    #[tokio::test]
    async fn dependent_write_refuses_owner_and_admin_on_blocked_vacancy() {
        let w = world().await;
        block(&w, w.vacancy.into());

        for p in [&w.employer, &w.admin] {
            let err = w
                .filter
                .guard_dependent_write(p, &[w.vacancy.into()])
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::VacancyBlocked);
        }
    }

    #[tokio::test]
    async fn dependent_write_passes_when_everything_is_visible() {
        let w = world().await;
        let resolved = w
            .filter
            .guard_dependent_write(&w.specialist, &[w.resume.into(), w.vacancy.into()])
            .await
            .unwrap();
        assert_eq!(resolved.len(), 2);

        store(&w)
            .write(EntityWrite::Insert(
                EntityRecord::new(ApplicationId::new().into(), Some(w.specialist.subject_id))
                    .with_relation(w.resume)
                    .with_relation(w.vacancy),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn storage_failures_are_translated() {
        let w = world().await;
        store(&w).fail_next(StorageFailure::unrecognized("socket closed")).unwrap();

        let err = w
            .filter
            .fetch_visible(&w.admin, w.vacancy.into())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
