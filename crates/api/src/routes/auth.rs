//! Authentication routes: register and login against the external provider.
//!
//! Both endpoints take a provider ID token rather than credentials of their
//! own. Verification failure is 401; a verified subject with no local
//! account is 404 on login ("please register") and gets created on register.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use faktura_db::UserRepository;
use faktura_db::entities::users;
use faktura_db::repositories::RegisterUserInput;
use faktura_shared::{AppError, IdentityError, VerifiedIdentity};

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// ID token issued by the identity provider.
    pub provider_token: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// ID token issued by the identity provider.
    pub provider_token: String,
}

/// Response for a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub provider_uid: String,
    pub last_login: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            provider_uid: user.provider_uid,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Verifies a provider token for the auth endpoints.
async fn verify_token(state: &AppState, token: &str) -> Result<VerifiedIdentity, ApiError> {
    state.verifier.verify(token).await.map_err(|e| match e {
        IdentityError::KeyFetch(detail) => {
            error!(error = %detail, "Failed to fetch provider signing keys");
            ApiError(AppError::Internal(detail))
        }
        _ => ApiError(AppError::Unauthorized(
            "Invalid or expired provider token".to_string(),
        )),
    })
}

/// POST /auth/register - Create a local account for a verified identity.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let identity = verify_token(&state, &payload.provider_token).await?;

    let Some(email) = identity.email else {
        return Err(ApiError(AppError::Validation(
            "Provider account must have an email address".to_string(),
        )));
    };

    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .register_user(RegisterUserInput {
            email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            provider_uid: identity.uid,
        })
        .await?;

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login - Resolve a verified identity to its local account.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserResponse>> {
    let identity = verify_token(&state, &payload.provider_token).await?;

    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_provider_uid(&identity.uid)
        .await?
        .ok_or_else(|| {
            ApiError(AppError::NotFound(
                "User not found. Please register first.".to_string(),
            ))
        })?;

    let user = user_repo.touch_last_login(user.id).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(user.into()))
}
