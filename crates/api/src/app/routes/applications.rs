use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    routing::{patch, post},
};
use serde_json::json;

use jobboard_auth::{Operation, Principal, authorize_owner};
use jobboard_core::{
    ApplicationId, DomainError, EntityKind, EntityRecord, EntityRef, EntityWrite, ErrorGroup,
    ErrorKind, ResumeId, StorageFailure, VacancyId, translate,
};

use crate::app::dto::{ApplicationStatus, ChangeStatusRequest, CreateApplicationRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_application))
        .route("/:id/status", patch(change_status))
}

/// Storage failures without a more specific meaning become `ApplicationCreationFailed`.
fn creation_failure(failure: StorageFailure) -> ApiError {
    let err = translate(&failure);
    if err.group() == ErrorGroup::Internal {
        return DomainError::with_context(ErrorKind::ApplicationCreationFailed, failure.message).into();
    }
    err.into()
}

/// A specialist applies to a vacancy with one of their own resumes.
pub async fn create_application(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EntityRecord>)> {
    services.policy.check_role(&principal, Operation::ApplyToVacancy)?;
    let Json(body) = body?;
    let resume: ResumeId = parse_id(&body.resume_id)?;
    let vacancy: VacancyId = parse_id(&body.vacancy_id)?;

    let resume_record = services.visibility.resolve(resume.entity_ref()).await?;
    match resume_record.owner_id {
        Some(owner) => authorize_owner(&principal, owner)?,
        None => return Err(ErrorKind::AccessDenied.into()),
    }

    services
        .visibility
        .guard_dependent_write(&principal, &[resume.entity_ref(), vacancy.entity_ref()])
        .await?;

    let record = EntityRecord::new(ApplicationId::new().entity_ref(), Some(principal.subject_id))
        .with_relation(resume)
        .with_relation(vacancy)
        .with_attributes(json!({
            "status": ApplicationStatus::Pending,
            "cover_letter": body.cover_letter,
        }));
    services
        .store
        .write(EntityWrite::Insert(record.clone()))
        .await
        .map_err(creation_failure)?;

    tracing::info!(
        subject = %principal.subject_id,
        application = %record.entity,
        "application created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// The vacancy's owner moves an application through its review states.
pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> ApiResult<Json<EntityRecord>> {
    services
        .policy
        .check_role(&principal, Operation::ChangeApplicationStatus)?;
    let id: ApplicationId = parse_id(&id)?;
    let Json(body) = body?;

    let mut application = services.visibility.resolve(id.entity_ref()).await?;
    let vacancy_ref = application.relation(EntityKind::Vacancy).ok_or_else(|| {
        DomainError::internal(format!("{} has no vacancy relation", application.entity))
    })?;
    let vacancy = services.visibility.resolve(vacancy_ref).await?;
    services.policy.check_owner(
        &principal,
        Operation::ChangeApplicationStatus,
        vacancy.owner_id,
    )?;

    let dependencies: Vec<EntityRef> = application.relations.clone();
    services
        .visibility
        .guard_dependent_write(&principal, &dependencies)
        .await?;

    if !application.attributes.is_object() {
        application.attributes = json!({});
    }
    if let Some(attributes) = application.attributes.as_object_mut() {
        attributes.insert("status".to_string(), json!(body.status));
    }
    services
        .store
        .write(EntityWrite::Update(application.clone()))
        .await?;

    tracing::info!(
        subject = %principal.subject_id,
        application = %application.entity,
        status = ?body.status,
        "application status changed"
    );
    Ok(Json(application))
}
