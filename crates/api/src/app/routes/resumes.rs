use std::sync::Arc;

use axum::{Extension, Json, extract::Path};

use jobboard_auth::{Operation, Principal};
use jobboard_core::{EntityRecord, ResumeId};

use crate::app::errors::ApiResult;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;

pub async fn get_resume(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Json<EntityRecord>> {
    services.policy.check_role(&principal, Operation::ViewResume)?;
    let id: ResumeId = parse_id(&id)?;

    let record = services
        .visibility
        .fetch_visible(&principal, id.entity_ref())
        .await?;
    Ok(Json(record))
}
