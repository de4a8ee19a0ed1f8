use axum::{Extension, Json, http::StatusCode};

use jobboard_auth::Principal;

use crate::app::dto::PrincipalView;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<Principal>) -> Json<PrincipalView> {
    Json(principal.into())
}
