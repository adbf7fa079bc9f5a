//! User directory routes.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use faktura_db::UserRepository;
use faktura_db::repositories::user::UserWithRole;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::CurrentUser;

/// Creates the users router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

/// Response for a role.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Response for a user with their role.
#[derive(Debug, Serialize)]
pub struct UserWithRoleResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub provider_uid: String,
    pub last_login: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub role: Option<RoleResponse>,
}

impl From<UserWithRole> for UserWithRoleResponse {
    fn from(found: UserWithRole) -> Self {
        Self {
            id: found.user.id,
            email: found.user.email,
            first_name: found.user.first_name,
            last_name: found.user.last_name,
            provider_uid: found.user.provider_uid,
            last_login: found.user.last_login,
            created_at: found.user.created_at,
            role: found.role.map(|r| RoleResponse {
                id: r.id,
                name: r.name,
                description: r.description,
            }),
        }
    }
}

/// GET /users - List all users with their roles.
///
/// The directory is global by design; any authenticated user may read it.
async fn list_users(
    State(state): State<AppState>,
    _auth: CurrentUser,
) -> ApiResult<Json<Vec<UserWithRoleResponse>>> {
    let user_repo = UserRepository::new((*state.db).clone());
    let users = user_repo.list_users_with_roles().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}
