use serde::{Deserialize, Serialize};

use jobboard_auth::{Principal, Role};
use jobboard_core::UserId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub resume_id: String,
    pub vacancy_id: String,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub owner_id: Option<String>,
    pub limit: Option<usize>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PrincipalView {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl From<Principal> for PrincipalView {
    fn from(p: Principal) -> Self {
        Self {
            id: p.subject_id,
            username: p.username,
            role: p.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: PrincipalView,
}
