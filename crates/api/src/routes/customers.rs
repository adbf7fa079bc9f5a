//! Customer management routes.

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

use faktura_db::CustomerRepository;
use faktura_db::entities::customers;
use faktura_db::repositories::{CreateCustomerInput, CustomerError, UpdateCustomerInput};

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::CurrentUser;

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/customers", post(create_customer))
        .route("/customers/{customer_id}", get(get_customer))
        .route("/customers/{customer_id}", put(update_customer))
        .route("/customers/{customer_id}", delete(delete_customer))
}

/// Query parameters for listing customers.
#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    /// Free-text search over legal and display name.
    pub q: Option<String>,
}

/// Request body for creating a customer.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub legal_name: String,
    pub display_name: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
}

/// Request body for partially updating a customer.
///
/// Omitted fields are untouched; an explicit null clears a nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub legal_name: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub display_name: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub tax_id: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub address_line_1: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub address_line_2: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub zip: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub country: Option<Option<String>>,
}

/// Response for a customer.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub legal_name: String,
    pub display_name: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<customers::Model> for CustomerResponse {
    fn from(c: customers::Model) -> Self {
        Self {
            id: c.id,
            legal_name: c.legal_name,
            display_name: c.display_name,
            tax_id: c.tax_id,
            email: c.email,
            phone: c.phone,
            address_line_1: c.address_line_1,
            address_line_2: c.address_line_2,
            city: c.city,
            state: c.state,
            zip: c.zip,
            country: c.country,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// GET /customers - List the tenant's customers.
async fn list_customers(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<ListCustomersQuery>,
) -> ApiResult<Json<Vec<CustomerResponse>>> {
    let repo = CustomerRepository::new((*state.db).clone());
    let customers = repo.list_customers(auth.id(), query.q.as_deref()).await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// GET /customers/{id} - Get one customer.
async fn get_customer(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<CustomerResponse>> {
    let repo = CustomerRepository::new((*state.db).clone());
    let customer = repo
        .find_customer_by_id(auth.id(), customer_id)
        .await?
        .ok_or(CustomerError::NotFound(customer_id))?;
    Ok(Json(customer.into()))
}

/// POST /customers - Create a customer.
async fn create_customer(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<CustomerResponse>)> {
    let repo = CustomerRepository::new((*state.db).clone());
    let customer = repo
        .create_customer(
            auth.id(),
            CreateCustomerInput {
                legal_name: payload.legal_name,
                display_name: payload.display_name,
                tax_id: payload.tax_id,
                email: payload.email,
                phone: payload.phone,
                address_line_1: payload.address_line_1,
                address_line_2: payload.address_line_2,
                city: payload.city,
                state: payload.state,
                zip: payload.zip,
                country: payload.country,
            },
        )
        .await?;

    info!(user_id = %auth.id(), customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// PUT /customers/{id} - Partially update a customer.
async fn update_customer(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<CustomerResponse>> {
    let repo = CustomerRepository::new((*state.db).clone());
    let customer = repo
        .update_customer(
            auth.id(),
            customer_id,
            UpdateCustomerInput {
                legal_name: payload.legal_name,
                display_name: payload.display_name,
                tax_id: payload.tax_id,
                email: payload.email,
                phone: payload.phone,
                address_line_1: payload.address_line_1,
                address_line_2: payload.address_line_2,
                city: payload.city,
                state: payload.state,
                zip: payload.zip,
                country: payload.country,
            },
        )
        .await?;

    info!(user_id = %auth.id(), customer_id = %customer.id, "Customer updated");
    Ok(Json(customer.into()))
}

/// DELETE /customers/{id} - Delete a customer with no invoices.
async fn delete_customer(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = CustomerRepository::new((*state.db).clone());
    repo.delete_customer(auth.id(), customer_id).await?;

    info!(user_id = %auth.id(), customer_id = %customer_id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let absent: UpdateCustomerRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.display_name.is_none());

        let null: UpdateCustomerRequest =
            serde_json::from_str(r#"{"display_name": null}"#).unwrap();
        assert_eq!(null.display_name, Some(None));

        let set: UpdateCustomerRequest =
            serde_json::from_str(r#"{"display_name": "Acme"}"#).unwrap();
        assert_eq!(set.display_name, Some(Some("Acme".to_string())));
    }
}
