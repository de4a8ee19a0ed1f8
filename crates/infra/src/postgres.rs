//! PostgreSQL-backed credential and entity store.
//!
//! ## Schema
//!
//! See `migrations/0001_init.sql`. Credentials live in `users`; every other
//! record (including the user's own moderation record) lives in `entities`,
//! keyed by `(kind, id)`. Relations are a JSONB array of `{kind, id}` pairs.
//!
//! ## Error Mapping
//!
//! All SQLx errors go through [`from_sqlx`]; constraint names are passed
//! through untouched so the translation table can match them exactly.
//!
//! ## Thread Safety
//!
//! `PostgresStore` is `Send + Sync`; the SQLx pool handles connection sharing.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use jobboard_core::{
    CredentialRecord, CredentialStore, EntityKind, EntityRecord, EntityRef, EntityStore,
    EntityWrite, FailureCategory, ListFilter, StorageFailure, UserId,
};

use crate::sqlx_errors::from_sqlx;

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

const ENTITY_COLUMNS: &str = "kind, id, owner_id, is_blocked, relations, attributes";

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with a small pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageFailure> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| from_sqlx("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StorageFailure> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| from_sqlx("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(username = %record.username), err)]
    pub async fn insert_credential(&self, record: &CredentialRecord) -> Result<(), StorageFailure> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.user_id.as_uuid())
        .bind(&record.username)
        .bind(record.email.as_deref())
        .bind(&record.password_hash)
        .bind(&record.role_name)
        .execute(&*self.pool)
        .await
        .map_err(|e| from_sqlx("insert_credential", e))?;
        Ok(())
    }

    async fn ensure_relations_exist(
        tx: &mut Transaction<'_, Postgres>,
        record: &EntityRecord,
    ) -> Result<(), StorageFailure> {
        for relation in &record.relations {
            let found = sqlx::query("SELECT 1 FROM entities WHERE kind = $1 AND id = $2")
                .bind(relation.kind.as_str())
                .bind(relation.id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| from_sqlx("check_relation", e))?;
            if found.is_none() {
                return Err(StorageFailure::new(
                    FailureCategory::ForeignKeyViolation,
                    format!("{} references missing {}", record.entity, relation),
                )
                .with_constraint(format!("{}s_{}_fkey", record.kind(), relation.kind)));
            }
        }
        Ok(())
    }
}

/// Application pair columns backing the unique constraint.
fn application_pair(record: &EntityRecord) -> (Option<Uuid>, Option<Uuid>) {
    if record.kind() != EntityKind::Application {
        return (None, None);
    }
    (
        record.relation(EntityKind::Resume).map(|r| r.id),
        record.relation(EntityKind::Vacancy).map(|r| r.id),
    )
}

fn decode_entity(row: &PgRow) -> Result<EntityRecord, StorageFailure> {
    let decode = |e: sqlx::Error| StorageFailure::unrecognized(format!("failed to decode entity row: {e}"));

    let kind: String = row.try_get("kind").map_err(decode)?;
    let kind: EntityKind = kind
        .parse()
        .map_err(|e| StorageFailure::unrecognized(format!("{e}")))?;
    let id: Uuid = row.try_get("id").map_err(decode)?;
    let owner_id: Option<Uuid> = row.try_get("owner_id").map_err(decode)?;
    let is_blocked: bool = row.try_get("is_blocked").map_err(decode)?;
    let Json(relations): Json<Vec<EntityRef>> = row.try_get("relations").map_err(decode)?;
    let attributes: serde_json::Value = row.try_get("attributes").map_err(decode)?;

    Ok(EntityRecord {
        entity: EntityRef::new(kind, id),
        owner_id: owner_id.map(UserId::from_uuid),
        is_blocked,
        relations,
        attributes,
    })
}

#[async_trait]
impl CredentialStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<CredentialRecord, StorageFailure> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, role
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| from_sqlx("find_credential_by_username", e))?;

        let decode =
            |e: sqlx::Error| StorageFailure::unrecognized(format!("failed to decode user row: {e}"));
        Ok(CredentialRecord {
            user_id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
            username: row.try_get("username").map_err(decode)?,
            email: row.try_get("email").map_err(decode)?,
            password_hash: row.try_get("password_hash").map_err(decode)?,
            role_name: row.try_get("role").map_err(decode)?,
        })
    }
}

#[async_trait]
impl EntityStore for PostgresStore {
    #[instrument(skip(self), fields(entity = %entity), err)]
    async fn find_entity(&self, entity: EntityRef) -> Result<EntityRecord, StorageFailure> {
        let row = sqlx::query(&format!(
            "SELECT {ENTITY_COLUMNS} FROM entities WHERE kind = $1 AND id = $2"
        ))
        .bind(entity.kind.as_str())
        .bind(entity.id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| from_sqlx("find_entity", e))?;

        decode_entity(&row)
    }

    #[instrument(skip(self, filter), fields(kind = %kind), err)]
    async fn list_entities(
        &self,
        kind: EntityKind,
        filter: &ListFilter,
    ) -> Result<Vec<EntityRecord>, StorageFailure> {
        let related = filter.related_to.map(|r| Json(vec![r]));
        let limit = filter.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTITY_COLUMNS}
            FROM entities
            WHERE kind = $1
              AND ($2::uuid IS NULL OR owner_id = $2)
              AND ($3::jsonb IS NULL OR relations @> $3)
            ORDER BY id ASC
            LIMIT $4
            "#
        ))
        .bind(kind.as_str())
        .bind(filter.owner_id.map(|o| *o.as_uuid()))
        .bind(related)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| from_sqlx("list_entities", e))?;

        rows.iter().map(decode_entity).collect()
    }

    #[instrument(skip(self, write), fields(target = %write.target()), err)]
    async fn write(&self, write: EntityWrite) -> Result<(), StorageFailure> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| from_sqlx("begin_transaction", e))?;

        match &write {
            EntityWrite::Insert(record) => {
                Self::ensure_relations_exist(&mut tx, record).await?;
                let (resume_id, vacancy_id) = application_pair(record);
                sqlx::query(
                    r#"
                    INSERT INTO entities
                        (kind, id, owner_id, is_blocked, relations, attributes, resume_id, vacancy_id)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(record.kind().as_str())
                .bind(record.entity.id)
                .bind(record.owner_id.map(|o| *o.as_uuid()))
                .bind(record.is_blocked)
                .bind(Json(&record.relations))
                .bind(&record.attributes)
                .bind(resume_id)
                .bind(vacancy_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| from_sqlx("insert_entity", e))?;
            }
            EntityWrite::Update(record) => {
                Self::ensure_relations_exist(&mut tx, record).await?;
                let (resume_id, vacancy_id) = application_pair(record);
                let result = sqlx::query(
                    r#"
                    UPDATE entities
                    SET owner_id = $3, is_blocked = $4, relations = $5, attributes = $6,
                        resume_id = $7, vacancy_id = $8
                    WHERE kind = $1 AND id = $2
                    "#,
                )
                .bind(record.kind().as_str())
                .bind(record.entity.id)
                .bind(record.owner_id.map(|o| *o.as_uuid()))
                .bind(record.is_blocked)
                .bind(Json(&record.relations))
                .bind(&record.attributes)
                .bind(resume_id)
                .bind(vacancy_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| from_sqlx("update_entity", e))?;
                if result.rows_affected() == 0 {
                    return Err(StorageFailure::not_found(format!("{} not found", record.entity)));
                }
            }
            EntityWrite::Delete(entity) => {
                let dependent = sqlx::query("SELECT kind, id FROM entities WHERE relations @> $1 LIMIT 1")
                    .bind(Json(vec![*entity]))
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| from_sqlx("check_dependents", e))?;
                if dependent.is_some() {
                    return Err(StorageFailure::new(
                        FailureCategory::ForeignKeyViolation,
                        format!("{entity} is still referenced"),
                    ));
                }
                let result = sqlx::query("DELETE FROM entities WHERE kind = $1 AND id = $2")
                    .bind(entity.kind.as_str())
                    .bind(entity.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| from_sqlx("delete_entity", e))?;
                if result.rows_affected() == 0 {
                    return Err(StorageFailure::not_found(format!("{entity} not found")));
                }
            }
        }

        tx.commit().await.map_err(|e| from_sqlx("commit", e))?;
        Ok(())
    }
}
