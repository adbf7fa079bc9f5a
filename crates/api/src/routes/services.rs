//! Template service catalog routes.
//!
//! These endpoints only ever see template services (no parent invoice);
//! line items attached to an invoice are managed through the invoice
//! endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use faktura_core::validation::require_positive;
use faktura_db::ServiceRepository;
use faktura_db::entities::invoice_services;
use faktura_db::repositories::{
    CreateTemplateServiceInput, ServiceError, UpdateTemplateServiceInput,
};

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::CurrentUser;

/// Creates the template service routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services))
        .route("/services", post(create_service))
        .route("/services/{service_id}", get(get_service))
        .route("/services/{service_id}", put(update_service))
        .route("/services/{service_id}", delete(delete_service))
}

/// Query parameters for listing template services.
#[derive(Debug, Deserialize)]
pub struct ListServicesQuery {
    /// Free-text search over the service title.
    pub q: Option<String>,
}

/// Request body for creating a template service.
#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub service_title: String,
    pub service_description: Option<String>,
    pub amount: Decimal,
    pub sort_order: Option<i32>,
}

/// Request body for partially updating a template service.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub service_title: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub service_description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub sort_order: Option<Option<i32>>,
}

/// Response for a service (template or line item).
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub service_title: String,
    pub service_description: Option<String>,
    pub amount: Decimal,
    pub sort_order: Option<i32>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<invoice_services::Model> for ServiceResponse {
    fn from(s: invoice_services::Model) -> Self {
        Self {
            id: s.id,
            service_title: s.service_title,
            service_description: s.service_description,
            amount: s.amount,
            sort_order: s.sort_order,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// GET /services - List the tenant's template services.
async fn list_services(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<ListServicesQuery>,
) -> ApiResult<Json<Vec<ServiceResponse>>> {
    let repo = ServiceRepository::new((*state.db).clone());
    let services = repo.list_templates(auth.id(), query.q.as_deref()).await?;
    Ok(Json(services.into_iter().map(Into::into).collect()))
}

/// GET /services/{id} - Get one template service.
async fn get_service(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(service_id): Path<Uuid>,
) -> ApiResult<Json<ServiceResponse>> {
    let repo = ServiceRepository::new((*state.db).clone());
    let service = repo
        .find_template_by_id(auth.id(), service_id)
        .await?
        .ok_or(ServiceError::NotFound(service_id))?;
    Ok(Json(service.into()))
}

/// POST /services - Create a template service.
async fn create_service(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<CreateServiceRequest>,
) -> ApiResult<(StatusCode, Json<ServiceResponse>)> {
    require_positive(payload.amount)?;

    let repo = ServiceRepository::new((*state.db).clone());
    let service = repo
        .create_template(
            auth.id(),
            CreateTemplateServiceInput {
                service_title: payload.service_title,
                service_description: payload.service_description,
                amount: payload.amount,
                sort_order: payload.sort_order,
            },
        )
        .await?;

    info!(user_id = %auth.id(), service_id = %service.id, "Template service created");
    Ok((StatusCode::CREATED, Json(service.into())))
}

/// PUT /services/{id} - Partially update a template service.
async fn update_service(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(service_id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> ApiResult<Json<ServiceResponse>> {
    if let Some(amount) = payload.amount {
        require_positive(amount)?;
    }

    let repo = ServiceRepository::new((*state.db).clone());
    let service = repo
        .update_template(
            auth.id(),
            service_id,
            UpdateTemplateServiceInput {
                service_title: payload.service_title,
                service_description: payload.service_description,
                amount: payload.amount,
                sort_order: payload.sort_order,
            },
        )
        .await?;

    info!(user_id = %auth.id(), service_id = %service.id, "Template service updated");
    Ok(Json(service.into()))
}

/// DELETE /services/{id} - Delete a template service.
async fn delete_service(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(service_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = ServiceRepository::new((*state.db).clone());
    repo.delete_template(auth.id(), service_id).await?;

    info!(user_id = %auth.id(), service_id = %service_id, "Template service deleted");
    Ok(StatusCode::NO_CONTENT)
}
