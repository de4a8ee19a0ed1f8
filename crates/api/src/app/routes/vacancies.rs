use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};

use jobboard_auth::{Operation, Principal};
use jobboard_core::{DomainError, EntityKind, EntityRecord, EntityWrite, ErrorKind, ListFilter, UserId, VacancyId};

use crate::app::dto::ListQuery;
use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;

const MAX_PAGE: usize = 100;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_vacancies))
        .route("/:id", get(get_vacancy).delete(delete_vacancy))
}

/// Listing: blocked vacancies the caller may not see are dropped, not reported.
pub async fn list_vacancies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    services.policy.check_role(&principal, Operation::ListVacancies)?;
    let Query(query) = query
        .map_err(|e| DomainError::with_context(ErrorKind::InvalidInput, e.body_text()))?;

    let owner_id = match query.owner_id.as_deref() {
        Some(raw) => Some(parse_id::<UserId>(raw)?),
        None => None,
    };
    let filter = ListFilter {
        owner_id,
        related_to: None,
        limit: Some(query.limit.unwrap_or(MAX_PAGE).min(MAX_PAGE)),
    };

    let items = services
        .visibility
        .list_visible(&principal, EntityKind::Vacancy, &filter)
        .await?;
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

pub async fn get_vacancy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityRecord>> {
    services.policy.check_role(&principal, Operation::ViewVacancy)?;
    let id: VacancyId = parse_id(&id)?;

    let record = services
        .visibility
        .fetch_visible(&principal, id.entity_ref())
        .await?;
    Ok(Json(record))
}

pub async fn delete_vacancy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    services.policy.check_role(&principal, Operation::DeleteVacancy)?;
    let id: VacancyId = parse_id(&id)?;

    let vacancy = services.visibility.resolve(id.entity_ref()).await?;
    services
        .policy
        .check_owner(&principal, Operation::DeleteVacancy, vacancy.owner_id)?;
    services.visibility.check_actor_not_blocked(&principal).await?;

    services.store.write(EntityWrite::Delete(vacancy.entity)).await?;
    tracing::info!(subject = %principal.subject_id, vacancy = %id, "vacancy deleted");
    Ok(StatusCode::NO_CONTENT)
}
