//! Transaction category management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use faktura_db::TransactionCategoryRepository;
use faktura_db::entities::transaction_categories;
use faktura_db::repositories::{
    CreateTransactionCategoryInput, TransactionCategoryError, UpdateTransactionCategoryInput,
};

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::CurrentUser;

/// Creates the transaction category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transaction-categories", get(list_categories))
        .route("/transaction-categories", post(create_category))
        .route("/transaction-categories/{category_id}", get(get_category))
        .route("/transaction-categories/{category_id}", put(update_category))
        .route("/transaction-categories/{category_id}", delete(delete_category))
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Free-text search over the category name.
    pub q: Option<String>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Request body for partially updating a category.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub icon: Option<Option<String>>,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<transaction_categories::Model> for CategoryResponse {
    fn from(c: transaction_categories::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            color: c.color,
            icon: c.icon,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// GET /transaction-categories - List the tenant's categories.
async fn list_categories(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Json<Vec<CategoryResponse>>> {
    let repo = TransactionCategoryRepository::new((*state.db).clone());
    let categories = repo.list_categories(auth.id(), query.q.as_deref()).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /transaction-categories/{id} - Get one category.
async fn get_category(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<CategoryResponse>> {
    let repo = TransactionCategoryRepository::new((*state.db).clone());
    let category = repo
        .find_category_by_id(auth.id(), category_id)
        .await?
        .ok_or(TransactionCategoryError::NotFound(category_id))?;
    Ok(Json(category.into()))
}

/// POST /transaction-categories - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<CategoryResponse>)> {
    let repo = TransactionCategoryRepository::new((*state.db).clone());
    let category = repo
        .create_category(
            auth.id(),
            CreateTransactionCategoryInput {
                name: payload.name,
                color: payload.color,
                icon: payload.icon,
            },
        )
        .await?;

    info!(user_id = %auth.id(), category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /transaction-categories/{id} - Partially update a category.
async fn update_category(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<CategoryResponse>> {
    let repo = TransactionCategoryRepository::new((*state.db).clone());
    let category = repo
        .update_category(
            auth.id(),
            category_id,
            UpdateTransactionCategoryInput {
                name: payload.name,
                color: payload.color,
                icon: payload.icon,
            },
        )
        .await?;

    info!(user_id = %auth.id(), category_id = %category.id, "Category updated");
    Ok(Json(category.into()))
}

/// DELETE /transaction-categories/{id} - Delete an unreferenced category.
async fn delete_category(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = TransactionCategoryRepository::new((*state.db).clone());
    repo.delete_category(auth.id(), category_id).await?;

    info!(user_id = %auth.id(), category_id = %category_id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
