use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use jobboard_auth::{TokenService, authenticate_request};
use jobboard_core::ErrorKind;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

/// Authenticate the bearer token and attach the `Principal` to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ErrorKind::MalformedAuthorizationHeader)?,
        ),
        None => None,
    };

    let principal = authenticate_request(&state.tokens, header)?;
    tracing::debug!(subject = %principal.subject_id, role = %principal.role, "authenticated");

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// One log line per request with method, path, status and latency.
pub async fn log_requests(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}
