use axum::{Router, routing::get};

pub mod applications;
pub mod auth;
pub mod common;
pub mod resumes;
pub mod system;
pub mod users;
pub mod vacancies;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/users/:id", get(users::get_user))
        .route("/resumes/:id", get(resumes::get_resume))
        .nest("/vacancies", vacancies::router())
        .nest("/applications", applications::router())
}
