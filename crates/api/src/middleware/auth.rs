//! Authentication middleware for protected routes.
//!
//! Verifies the bearer credential with the external identity provider and
//! resolves it to a local user. Verification failure and
//! verified-but-unregistered are both 401 on protected routes; only the
//! login endpoint distinguishes the latter.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use faktura_db::UserRepository;
use faktura_db::entities::{user_roles, users};
use faktura_db::repositories::user::ADMIN_ROLE;
use faktura_shared::IdentityError;

use crate::AppState;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// The resolved local identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The local user record.
    pub user: users::Model,
    /// The user's role, joined on read.
    pub role: Option<user_roles::Model>,
}

impl CurrentUser {
    /// Returns the user's id (the tenant key).
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    /// True when the user carries the ADMIN role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_ref().is_some_and(|r| r.name == ADMIN_ROLE)
    }
}

/// Authentication middleware.
///
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Verifies it against the external identity provider
/// 3. Resolves the provider subject to a local user (with role)
/// 4. Stores the [`CurrentUser`] in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    let identity = match state.verifier.verify(token).await {
        Ok(identity) => identity,
        Err(IdentityError::Expired) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "token_expired",
                    "message": "Token has expired"
                })),
            )
                .into_response();
        }
        Err(IdentityError::KeyFetch(e)) => {
            error!(error = %e, "Failed to fetch provider signing keys");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_token",
                    "message": "Invalid or expired token"
                })),
            )
                .into_response();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());
    match user_repo.find_with_role(&identity.uid).await {
        Ok(Some(found)) => {
            request.extensions_mut().insert(CurrentUser {
                user: found.user,
                role: found.role,
            });
            next.run(request).await
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unregistered",
                "message": "User not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to resolve user during authentication");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "unauthorized",
                    "message": "Authentication required"
                })),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }
}
