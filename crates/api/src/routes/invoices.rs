//! Invoice routes: the billing aggregate root.
//!
//! Request shapes are validated here, before the repository is touched: a
//! malformed invoice never causes a partial write. Responses embed the
//! customer, the optional bank account, and the ordered line items.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use faktura_core::invoice::{InvoiceStatus, Recurrence, RecurrenceError, RecurrenceFrequency};
use faktura_core::validation::{
    normalize_currency, require_date_order, require_positive, require_services,
};
use faktura_db::InvoiceRepository;
use faktura_db::entities::{customers, invoices};
use faktura_db::repositories::{
    CreateInvoiceInput, CreateServiceLine, InvoiceError, InvoiceFilter, InvoiceWithRelations,
    UpdateInvoiceInput,
};
use faktura_shared::AppError;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::bank_accounts::BankAccountResponse;
use crate::routes::customers::CustomerResponse;
use crate::routes::services::ServiceResponse;

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices", post(create_invoice))
        .route("/invoices/{invoice_id}", get(get_invoice))
        .route("/invoices/{invoice_id}", put(update_invoice))
        .route("/invoices/{invoice_id}", delete(delete_invoice))
}

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    /// Lifecycle status filter: draft, sent, paid, void.
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub issue_date_from: Option<NaiveDate>,
    pub issue_date_to: Option<NaiveDate>,
}

/// One line item in a create or replace request.
#[derive(Debug, Deserialize)]
pub struct ServiceLineRequest {
    pub service_title: String,
    pub service_description: Option<String>,
    pub amount: Decimal,
    /// Defaults to the line's position in the submitted list.
    pub sort_order: Option<i32>,
}

/// Request body for creating an invoice.
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    pub bank_account_id: Option<Uuid>,
    /// Allocated sequentially when omitted.
    pub invoice_number: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// 3-letter code; defaults to USD.
    pub currency: Option<String>,
    /// Defaults to draft.
    pub status: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_recurrent: bool,
    pub recurrence_frequency: Option<String>,
    pub recurrence_day: Option<i32>,
    /// At least one line item is required.
    #[serde(default)]
    pub services: Vec<ServiceLineRequest>,
}

/// Request body for partially updating an invoice.
///
/// Omitted fields are untouched; an explicit null clears a nullable field.
/// A present `services` list replaces every attached line item.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub customer_id: Option<Uuid>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub bank_account_id: Option<Option<Uuid>>,
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub status: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
    pub is_recurrent: Option<bool>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub recurrence_frequency: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub recurrence_day: Option<Option<i32>>,
    pub services: Option<Vec<ServiceLineRequest>>,
}

/// Full invoice response with its read-projection relations.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub is_recurrent: bool,
    pub recurrence_frequency: Option<String>,
    pub recurrence_day: Option<i32>,
    pub customer: CustomerResponse,
    pub bank_account: Option<BankAccountResponse>,
    pub services: Vec<ServiceResponse>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<InvoiceWithRelations> for InvoiceResponse {
    fn from(found: InvoiceWithRelations) -> Self {
        Self {
            id: found.invoice.id,
            invoice_number: found.invoice.invoice_number,
            issue_date: found.invoice.issue_date,
            due_date: found.invoice.due_date,
            currency: found.invoice.currency,
            status: found.invoice.status,
            total_amount: found.invoice.total_amount,
            notes: found.invoice.notes,
            is_recurrent: found.invoice.is_recurrent,
            recurrence_frequency: found.invoice.recurrence_frequency,
            recurrence_day: found.invoice.recurrence_day,
            customer: found.customer.into(),
            bank_account: found.bank_account.map(Into::into),
            services: found.services.into_iter().map(Into::into).collect(),
            created_at: found.invoice.created_at,
            updated_at: found.invoice.updated_at,
        }
    }
}

/// Compact invoice response for listings: no bank account or line items.
#[derive(Debug, Serialize)]
pub struct InvoiceListItemResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub status: String,
    pub total_amount: Decimal,
    pub is_recurrent: bool,
    pub customer: CustomerResponse,
}

impl From<(invoices::Model, customers::Model)> for InvoiceListItemResponse {
    fn from((invoice, customer): (invoices::Model, customers::Model)) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            currency: invoice.currency,
            status: invoice.status,
            total_amount: invoice.total_amount,
            is_recurrent: invoice.is_recurrent,
            customer: customer.into(),
        }
    }
}

/// Parses a status string, rejecting unknown values as a validation error.
fn parse_status(s: &str) -> Result<InvoiceStatus, ApiError> {
    InvoiceStatus::parse(s).ok_or_else(|| {
        ApiError(AppError::Validation(
            "status must be one of draft, sent, paid, void".to_string(),
        ))
    })
}

/// Parses a recurrence frequency string.
fn parse_frequency(s: &str) -> Result<RecurrenceFrequency, ApiError> {
    RecurrenceFrequency::parse(s).ok_or_else(|| RecurrenceError::UnknownFrequency.into())
}

/// Validates a submitted line-item list: non-empty, all amounts positive.
fn validate_service_lines(lines: &[ServiceLineRequest]) -> Result<(), ApiError> {
    require_services(lines.len())?;
    for line in lines {
        require_positive(line.amount)?;
    }
    Ok(())
}

fn into_service_lines(lines: Vec<ServiceLineRequest>) -> Vec<CreateServiceLine> {
    lines
        .into_iter()
        .map(|line| CreateServiceLine {
            service_title: line.service_title,
            service_description: line.service_description,
            amount: line.amount,
            sort_order: line.sort_order,
        })
        .collect()
}

/// GET /invoices - List the tenant's invoices, newest issue date first.
async fn list_invoices(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<Json<Vec<InvoiceListItemResponse>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let repo = InvoiceRepository::new((*state.db).clone());
    let invoices = repo
        .list_invoices(
            auth.id(),
            InvoiceFilter {
                status,
                customer_id: query.customer_id,
                issue_date_from: query.issue_date_from,
                issue_date_to: query.issue_date_to,
            },
        )
        .await?;

    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// GET /invoices/{id} - Get one invoice with its full projection.
async fn get_invoice(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<Json<InvoiceResponse>> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo
        .find_invoice_by_id(auth.id(), invoice_id)
        .await?
        .ok_or(InvoiceError::NotFound(invoice_id))?;
    Ok(Json(invoice.into()))
}

/// POST /invoices - Create an invoice with its line items.
async fn create_invoice(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<InvoiceResponse>)> {
    validate_service_lines(&payload.services)?;
    require_date_order(payload.issue_date, payload.due_date)?;

    let currency = normalize_currency(payload.currency.as_deref().unwrap_or("USD"))?;
    let status = payload
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?
        .unwrap_or_default();

    let frequency = payload
        .recurrence_frequency
        .as_deref()
        .map(parse_frequency)
        .transpose()?;
    let recurrence = Recurrence::validate(payload.is_recurrent, frequency, payload.recurrence_day)
        .map_err(ApiError::from)?;

    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo
        .create_invoice(
            auth.id(),
            CreateInvoiceInput {
                customer_id: payload.customer_id,
                bank_account_id: payload.bank_account_id,
                invoice_number: payload.invoice_number,
                issue_date: payload.issue_date,
                due_date: payload.due_date,
                currency,
                status,
                notes: payload.notes,
                recurrence,
                services: into_service_lines(payload.services),
            },
        )
        .await?;

    info!(
        user_id = %auth.id(),
        invoice_id = %invoice.invoice.id,
        invoice_number = %invoice.invoice.invoice_number,
        total_amount = %invoice.invoice.total_amount,
        "Invoice created"
    );
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// PUT /invoices/{id} - Partially update an invoice.
///
/// A present `services` list replaces the full set of attached line items
/// and recomputes the total.
async fn update_invoice(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> ApiResult<Json<InvoiceResponse>> {
    if let Some(lines) = &payload.services {
        validate_service_lines(lines)?;
    }

    let currency = payload
        .currency
        .as_deref()
        .map(normalize_currency)
        .transpose()?;
    let status = payload.status.as_deref().map(parse_status).transpose()?;
    let recurrence_frequency = match payload.recurrence_frequency {
        Some(Some(s)) => Some(Some(parse_frequency(&s)?)),
        Some(None) => Some(None),
        None => None,
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let invoice = repo
        .update_invoice(
            auth.id(),
            invoice_id,
            UpdateInvoiceInput {
                customer_id: payload.customer_id,
                bank_account_id: payload.bank_account_id,
                invoice_number: payload.invoice_number,
                issue_date: payload.issue_date,
                due_date: payload.due_date,
                currency,
                status,
                notes: payload.notes,
                is_recurrent: payload.is_recurrent,
                recurrence_frequency,
                recurrence_day: payload.recurrence_day,
                services: payload.services.map(into_service_lines),
            },
        )
        .await?;

    info!(
        user_id = %auth.id(),
        invoice_id = %invoice.invoice.id,
        total_amount = %invoice.invoice.total_amount,
        "Invoice updated"
    );
    Ok(Json(invoice.into()))
}

/// DELETE /invoices/{id} - Delete an invoice; its line items cascade away.
async fn delete_invoice(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = InvoiceRepository::new((*state.db).clone());
    repo.delete_invoice(auth.id(), invoice_id).await?;

    info!(user_id = %auth.id(), invoice_id = %invoice_id, "Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(amount: Decimal) -> ServiceLineRequest {
        ServiceLineRequest {
            service_title: "Consulting".to_string(),
            service_description: None,
            amount,
            sort_order: None,
        }
    }

    #[test]
    fn test_empty_service_list_rejected() {
        let err = validate_service_lines(&[]).unwrap_err();
        assert_eq!(err.0.status_code(), 422);
    }

    #[test]
    fn test_non_positive_line_amount_rejected() {
        let err = validate_service_lines(&[line(dec!(5000.00)), line(Decimal::ZERO)]).unwrap_err();
        assert_eq!(err.0.status_code(), 422);
    }

    #[test]
    fn test_valid_lines_accepted() {
        assert!(validate_service_lines(&[line(dec!(0.01))]).is_ok());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(parse_status("overdue").is_err());
        assert_eq!(parse_status("paid").unwrap(), InvoiceStatus::Paid);
    }

    #[test]
    fn test_sort_order_defaults_to_position() {
        let lines = into_service_lines(vec![line(dec!(10)), line(dec!(20))]);
        // Positions are applied by the repository; the request keeps None.
        assert!(lines.iter().all(|l| l.sort_order.is_none()));
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let absent: UpdateInvoiceRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.bank_account_id.is_none());
        assert!(absent.services.is_none());

        let cleared: UpdateInvoiceRequest =
            serde_json::from_str(r#"{"bank_account_id": null}"#).unwrap();
        assert_eq!(cleared.bank_account_id, Some(None));
    }

    #[test]
    fn test_update_request_parses_service_replacement() {
        let replaced: UpdateInvoiceRequest = serde_json::from_str(
            r#"{"services": [{"service_title": "Audit", "amount": "1200.00"}]}"#,
        )
        .unwrap();
        let lines = replaced.services.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, dec!(1200.00));
    }
}
