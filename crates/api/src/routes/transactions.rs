//! Transaction routes: the ledger independent of invoices.
//!
//! Besides CRUD this module exposes the aggregation endpoints: the filtered
//! income/expense summary and the per-bank-account balances.

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

use faktura_core::transaction::{TransactionContext, TransactionType};
use faktura_core::validation::{normalize_currency, require_positive};
use faktura_db::TransactionRepository;
use faktura_db::repositories::{
    BankAccountBalance, CreateTransactionInput, TransactionError, TransactionFilter,
    TransactionSummary, TransactionWithRelations, UpdateTransactionInput,
};
use faktura_shared::AppError;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::routes::bank_accounts::BankAccountResponse;
use crate::routes::transaction_categories::CategoryResponse;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions", post(create_transaction))
        .route("/transactions/summary", get(transaction_summary))
        .route("/transactions/bank-balances", get(bank_balances))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/transactions/{transaction_id}", put(update_transaction))
        .route("/transactions/{transaction_id}", delete(delete_transaction))
}

/// Query parameters shared by listing and the summary.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// income or expense.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// business or personal.
    pub context: Option<String>,
    pub category_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Query parameters for the per-bank-account balances.
#[derive(Debug, Deserialize)]
pub struct BankBalancesQuery {
    /// business or personal.
    pub context: Option<String>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// income or expense.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// business or personal; defaults to business.
    pub context: Option<String>,
    pub description: String,
    pub amount: Decimal,
    /// 3-letter code; defaults to USD.
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Request body for partially updating a transaction.
///
/// Omitted fields are untouched; an explicit null clears a nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub context: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub bank_account_id: Option<Option<Uuid>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

/// Response for a transaction with its read-projection relations.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub context: String,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub category: Option<CategoryResponse>,
    pub bank_account: Option<BankAccountResponse>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<TransactionWithRelations> for TransactionResponse {
    fn from(found: TransactionWithRelations) -> Self {
        Self {
            id: found.transaction.id,
            transaction_type: found.transaction.transaction_type,
            context: found.transaction.context,
            description: found.transaction.description,
            amount: found.transaction.amount,
            currency: found.transaction.currency,
            date: found.transaction.date,
            notes: found.transaction.notes,
            category: found.category.map(Into::into),
            bank_account: found.bank_account.map(Into::into),
            created_at: found.transaction.created_at,
            updated_at: found.transaction.updated_at,
        }
    }
}

/// Response for the filtered summary.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_balance: Decimal,
    pub transaction_count: u64,
}

impl From<TransactionSummary> for SummaryResponse {
    fn from(s: TransactionSummary) -> Self {
        Self {
            total_income: s.total_income,
            total_expenses: s.total_expenses,
            net_balance: s.net_balance,
            transaction_count: s.transaction_count,
        }
    }
}

/// Response for one bank account's balance.
#[derive(Debug, Serialize)]
pub struct BankBalanceResponse {
    pub bank_account_id: Uuid,
    pub bank_account_label: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

impl From<BankAccountBalance> for BankBalanceResponse {
    fn from(b: BankAccountBalance) -> Self {
        Self {
            bank_account_id: b.bank_account_id,
            bank_account_label: b.bank_account_label,
            total_income: b.total_income,
            total_expenses: b.total_expenses,
            balance: b.balance,
        }
    }
}

/// Parses a transaction type string, rejecting unknown values.
fn parse_type(s: &str) -> Result<TransactionType, ApiError> {
    TransactionType::parse(s).ok_or_else(|| {
        ApiError(AppError::Validation(
            "type must be income or expense".to_string(),
        ))
    })
}

/// Parses a context string, rejecting unknown values.
fn parse_context(s: &str) -> Result<TransactionContext, ApiError> {
    TransactionContext::parse(s).ok_or_else(|| {
        ApiError(AppError::Validation(
            "context must be business or personal".to_string(),
        ))
    })
}

/// Builds the shared filter from list/summary query parameters.
fn build_filter(query: ListTransactionsQuery) -> Result<TransactionFilter, ApiError> {
    Ok(TransactionFilter {
        transaction_type: query
            .transaction_type
            .as_deref()
            .map(parse_type)
            .transpose()?,
        context: query.context.as_deref().map(parse_context).transpose()?,
        category_id: query.category_id,
        bank_account_id: query.bank_account_id,
        date_from: query.date_from,
        date_to: query.date_to,
    })
}

/// GET /transactions - List the tenant's transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let filter = build_filter(query)?;
    let repo = TransactionRepository::new((*state.db).clone());
    let transactions = repo.list_transactions(auth.id(), filter).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// GET /transactions/summary - Income, expenses, net balance, and count
/// over the filtered set. No matching rows yields zeros.
async fn transaction_summary(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Json<SummaryResponse>> {
    let filter = build_filter(query)?;
    let repo = TransactionRepository::new((*state.db).clone());
    let summary = repo.summary(auth.id(), filter).await?;
    Ok(Json(summary.into()))
}

/// GET /transactions/bank-balances - Per-bank-account balances. Accounts
/// with no matching transactions are absent.
async fn bank_balances(
    State(state): State<AppState>,
    auth: CurrentUser,
    Query(query): Query<BankBalancesQuery>,
) -> ApiResult<Json<Vec<BankBalanceResponse>>> {
    let context = query.context.as_deref().map(parse_context).transpose()?;
    let repo = TransactionRepository::new((*state.db).clone());
    let balances = repo.bank_account_balances(auth.id(), context).await?;
    Ok(Json(balances.into_iter().map(Into::into).collect()))
}

/// GET /transactions/{id} - Get one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<TransactionResponse>> {
    let repo = TransactionRepository::new((*state.db).clone());
    let transaction = repo
        .find_transaction_by_id(auth.id(), transaction_id)
        .await?
        .ok_or(TransactionError::NotFound(transaction_id))?;
    Ok(Json(transaction.into()))
}

/// POST /transactions - Create a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    require_positive(payload.amount)?;
    let transaction_type = parse_type(&payload.transaction_type)?;
    let context = payload
        .context
        .as_deref()
        .map(parse_context)
        .transpose()?
        .unwrap_or_default();
    let currency = normalize_currency(payload.currency.as_deref().unwrap_or("USD"))?;

    let repo = TransactionRepository::new((*state.db).clone());
    let transaction = repo
        .create_transaction(
            auth.id(),
            CreateTransactionInput {
                transaction_type,
                context,
                description: payload.description,
                amount: payload.amount,
                currency,
                date: payload.date,
                category_id: payload.category_id,
                bank_account_id: payload.bank_account_id,
                notes: payload.notes,
            },
        )
        .await?;

    info!(
        user_id = %auth.id(),
        transaction_id = %transaction.transaction.id,
        amount = %transaction.transaction.amount,
        "Transaction created"
    );
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// PUT /transactions/{id} - Partially update a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    if let Some(amount) = payload.amount {
        require_positive(amount)?;
    }
    let transaction_type = payload
        .transaction_type
        .as_deref()
        .map(parse_type)
        .transpose()?;
    let context = payload.context.as_deref().map(parse_context).transpose()?;
    let currency = payload
        .currency
        .as_deref()
        .map(normalize_currency)
        .transpose()?;

    let repo = TransactionRepository::new((*state.db).clone());
    let transaction = repo
        .update_transaction(
            auth.id(),
            transaction_id,
            UpdateTransactionInput {
                transaction_type,
                context,
                description: payload.description,
                amount: payload.amount,
                currency,
                date: payload.date,
                category_id: payload.category_id,
                bank_account_id: payload.bank_account_id,
                notes: payload.notes,
            },
        )
        .await?;

    info!(
        user_id = %auth.id(),
        transaction_id = %transaction.transaction.id,
        "Transaction updated"
    );
    Ok(Json(transaction.into()))
}

/// DELETE /transactions/{id} - Delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = TransactionRepository::new((*state.db).clone());
    repo.delete_transaction(auth.id(), transaction_id).await?;

    info!(user_id = %auth.id(), transaction_id = %transaction_id, "Transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_rejected() {
        assert!(parse_type("transfer").is_err());
        assert_eq!(parse_type("income").unwrap(), TransactionType::Income);
    }

    #[test]
    fn test_unknown_context_rejected() {
        assert!(parse_context("work").is_err());
        assert_eq!(
            parse_context("personal").unwrap(),
            TransactionContext::Personal
        );
    }

    #[test]
    fn test_filter_rejects_bad_enum() {
        let query: ListTransactionsQuery =
            serde_json::from_str(r#"{"type": "transfer"}"#).unwrap();
        assert!(build_filter(query).is_err());
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null() {
        let absent: UpdateTransactionRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.category_id.is_none());

        let cleared: UpdateTransactionRequest =
            serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));
    }
}
