//! In-memory store for tests and local development.
//!
//! Mirrors the constraint behaviour of the PostgreSQL schema closely enough
//! that failures carry the same categories and constraint names.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use jobboard_core::translate::{APPLICATION_CONSTRAINT, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use jobboard_core::{
    CredentialRecord, CredentialStore, EntityKind, EntityRecord, EntityRef, EntityStore,
    EntityWrite, FailureCategory, ListFilter, StorageFailure,
};

fn poisoned() -> StorageFailure {
    StorageFailure::unrecognized("lock poisoned")
}

/// In-memory credential and entity store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    credentials: RwLock<HashMap<String, CredentialRecord>>,
    entities: RwLock<HashMap<EntityRef, EntityRecord>>,
    injected: Mutex<VecDeque<StorageFailure>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a login credential, enforcing username and email uniqueness.
    pub fn insert_credential(&self, record: CredentialRecord) -> Result<(), StorageFailure> {
        let mut credentials = self.credentials.write().map_err(|_| poisoned())?;

        if credentials.contains_key(&record.username) {
            return Err(StorageFailure::new(
                FailureCategory::UniqueViolation,
                format!("username '{}' already taken", record.username),
            )
            .with_constraint(USERNAME_CONSTRAINT));
        }
        if let Some(email) = record.email.as_deref() {
            if credentials.values().any(|c| c.email.as_deref() == Some(email)) {
                return Err(StorageFailure::new(
                    FailureCategory::UniqueViolation,
                    "email already registered",
                )
                .with_constraint(EMAIL_CONSTRAINT));
            }
        }

        credentials.insert(record.username.clone(), record);
        Ok(())
    }

    /// Insert or replace a record without constraint checks. Seeding only.
    pub fn put(&self, record: EntityRecord) -> Result<(), StorageFailure> {
        let mut entities = self.entities.write().map_err(|_| poisoned())?;
        entities.insert(record.entity, record);
        Ok(())
    }

    pub fn set_blocked(&self, entity: EntityRef, is_blocked: bool) -> Result<(), StorageFailure> {
        let mut entities = self.entities.write().map_err(|_| poisoned())?;
        let record = entities
            .get_mut(&entity)
            .ok_or_else(|| StorageFailure::not_found(format!("{entity} not found")))?;
        record.is_blocked = is_blocked;
        Ok(())
    }

    /// Make the next store call fail with `failure`.
    pub fn fail_next(&self, failure: StorageFailure) -> Result<(), StorageFailure> {
        let mut injected = self.injected.lock().map_err(|_| poisoned())?;
        injected.push_back(failure);
        Ok(())
    }

    fn take_injected(&self) -> Result<(), StorageFailure> {
        let mut injected = self.injected.lock().map_err(|_| poisoned())?;
        match injected.pop_front() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn check_relations(
        entities: &HashMap<EntityRef, EntityRecord>,
        record: &EntityRecord,
    ) -> Result<(), StorageFailure> {
        for relation in &record.relations {
            if !entities.contains_key(relation) {
                return Err(StorageFailure::new(
                    FailureCategory::ForeignKeyViolation,
                    format!("{} references missing {}", record.entity, relation),
                )
                .with_constraint(format!("{}s_{}_fkey", record.kind(), relation.kind)));
            }
        }
        Ok(())
    }

    fn check_unique_application(
        entities: &HashMap<EntityRef, EntityRecord>,
        record: &EntityRecord,
    ) -> Result<(), StorageFailure> {
        if record.kind() != EntityKind::Application {
            return Ok(());
        }
        let key = (
            record.relation(EntityKind::Resume),
            record.relation(EntityKind::Vacancy),
        );
        let (Some(_), Some(_)) = key else {
            return Ok(());
        };

        let duplicate = entities.values().any(|other| {
            other.kind() == EntityKind::Application
                && other.entity != record.entity
                && (
                    other.relation(EntityKind::Resume),
                    other.relation(EntityKind::Vacancy),
                ) == key
        });
        if duplicate {
            return Err(StorageFailure::new(
                FailureCategory::UniqueViolation,
                "resume already applied to vacancy",
            )
            .with_constraint(APPLICATION_CONSTRAINT));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<CredentialRecord, StorageFailure> {
        self.take_injected()?;
        let credentials = self.credentials.read().map_err(|_| poisoned())?;
        credentials
            .get(username)
            .cloned()
            .ok_or_else(|| StorageFailure::not_found(format!("no credential for '{username}'")))
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn find_entity(&self, entity: EntityRef) -> Result<EntityRecord, StorageFailure> {
        self.take_injected()?;
        let entities = self.entities.read().map_err(|_| poisoned())?;
        entities
            .get(&entity)
            .cloned()
            .ok_or_else(|| StorageFailure::not_found(format!("{entity} not found")))
    }

    async fn list_entities(
        &self,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> Result<Vec<EntityRecord>, StorageFailure> {
        self.take_injected()?;
        let entities = self.entities.read().map_err(|_| poisoned())?;

        let mut records: Vec<EntityRecord> = entities
            .values()
            .filter(|r| r.kind() == kind && filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.entity.id);
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn write(&self, write: EntityWrite) -> Result<(), StorageFailure> {
        self.take_injected()?;
        let mut entities = self.entities.write().map_err(|_| poisoned())?;

        match write {
            EntityWrite::Insert(record) => {
                if entities.contains_key(&record.entity) {
                    return Err(StorageFailure::new(
                        FailureCategory::UniqueViolation,
                        format!("{} already exists", record.entity),
                    )
                    .with_constraint(format!("{}s_pkey", record.kind())));
                }
                Self::check_relations(&entities, &record)?;
                Self::check_unique_application(&entities, &record)?;
                entities.insert(record.entity, record);
            }
            EntityWrite::Update(record) => {
                if !entities.contains_key(&record.entity) {
                    return Err(StorageFailure::not_found(format!("{} not found", record.entity)));
                }
                Self::check_relations(&entities, &record)?;
                Self::check_unique_application(&entities, &record)?;
                entities.insert(record.entity, record);
            }
            EntityWrite::Delete(entity) => {
                if !entities.contains_key(&entity) {
                    return Err(StorageFailure::not_found(format!("{entity} not found")));
                }
                if let Some(dependent) = entities.values().find(|r| r.relations.contains(&entity)) {
                    return Err(StorageFailure::new(
                        FailureCategory::ForeignKeyViolation,
                        format!("{entity} is still referenced by {}", dependent.entity),
                    ));
                }
                entities.remove(&entity);
            }
        }
        Ok(())
    }
}
