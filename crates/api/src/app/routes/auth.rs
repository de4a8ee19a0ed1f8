use std::sync::Arc;

use axum::{Extension, Json, extract::rejection::JsonRejection};

use jobboard_auth::LoginCredentials;

use crate::app::dto::{SignInRequest, SignInResponse};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

/// Exchange username and password for a session token.
pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<Json<SignInResponse>> {
    let Json(body) = body?;
    let credentials = LoginCredentials::try_from_parts(&body.username, &body.password)?;

    let principal = services.credentials.verify(&credentials).await?;
    services.visibility.check_actor_not_blocked(&principal).await?;

    let token = services
        .tokens
        .issue(principal.subject_id, &principal.username, principal.role)?;
    tracing::info!(subject = %principal.subject_id, role = %principal.role, "signed in");

    Ok(Json(SignInResponse {
        token,
        token_type: "Bearer",
        expires_in: services.tokens.config().token_ttl().num_seconds(),
        user: principal.into(),
    }))
}
