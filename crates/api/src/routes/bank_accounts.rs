//! Bank account management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use faktura_db::BankAccountRepository;
use faktura_db::entities::bank_accounts;
use faktura_db::repositories::{
    BankAccountError, CreateBankAccountInput, UpdateBankAccountInput,
};

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::CurrentUser;

/// Creates the bank account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bank-accounts", get(list_bank_accounts))
        .route("/bank-accounts", post(create_bank_account))
        .route("/bank-accounts/{bank_account_id}", get(get_bank_account))
        .route("/bank-accounts/{bank_account_id}", put(update_bank_account))
        .route("/bank-accounts/{bank_account_id}", delete(delete_bank_account))
}

/// Request body for creating a bank account.
#[derive(Debug, Deserialize)]
pub struct CreateBankAccountRequest {
    pub label: String,
    pub beneficiary_full_name: String,
    pub beneficiary_full_address: Option<String>,
    pub beneficiary_account_number: String,
    pub swift_code: String,
    pub bank_name: Option<String>,
    pub bank_address: Option<String>,
    pub intermediary_bank_info: Option<String>,
}

/// Request body for partially updating a bank account.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBankAccountRequest {
    pub label: Option<String>,
    pub beneficiary_full_name: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub beneficiary_full_address: Option<Option<String>>,
    pub beneficiary_account_number: Option<String>,
    pub swift_code: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub bank_name: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub bank_address: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub intermediary_bank_info: Option<Option<String>>,
}

/// Response for a bank account.
#[derive(Debug, Serialize)]
pub struct BankAccountResponse {
    pub id: Uuid,
    pub label: String,
    pub beneficiary_full_name: String,
    pub beneficiary_full_address: Option<String>,
    pub beneficiary_account_number: String,
    pub swift_code: String,
    pub bank_name: Option<String>,
    pub bank_address: Option<String>,
    pub intermediary_bank_info: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<bank_accounts::Model> for BankAccountResponse {
    fn from(b: bank_accounts::Model) -> Self {
        Self {
            id: b.id,
            label: b.label,
            beneficiary_full_name: b.beneficiary_full_name,
            beneficiary_full_address: b.beneficiary_full_address,
            beneficiary_account_number: b.beneficiary_account_number,
            swift_code: b.swift_code,
            bank_name: b.bank_name,
            bank_address: b.bank_address,
            intermediary_bank_info: b.intermediary_bank_info,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// GET /bank-accounts - List the tenant's bank accounts.
async fn list_bank_accounts(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> ApiResult<Json<Vec<BankAccountResponse>>> {
    let repo = BankAccountRepository::new((*state.db).clone());
    let accounts = repo.list_bank_accounts(auth.id()).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// GET /bank-accounts/{id} - Get one bank account.
async fn get_bank_account(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(bank_account_id): Path<Uuid>,
) -> ApiResult<Json<BankAccountResponse>> {
    let repo = BankAccountRepository::new((*state.db).clone());
    let account = repo
        .find_bank_account_by_id(auth.id(), bank_account_id)
        .await?
        .ok_or(BankAccountError::NotFound(bank_account_id))?;
    Ok(Json(account.into()))
}

/// POST /bank-accounts - Create a bank account.
async fn create_bank_account(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(payload): Json<CreateBankAccountRequest>,
) -> ApiResult<(StatusCode, Json<BankAccountResponse>)> {
    let repo = BankAccountRepository::new((*state.db).clone());
    let account = repo
        .create_bank_account(
            auth.id(),
            CreateBankAccountInput {
                label: payload.label,
                beneficiary_full_name: payload.beneficiary_full_name,
                beneficiary_full_address: payload.beneficiary_full_address,
                beneficiary_account_number: payload.beneficiary_account_number,
                swift_code: payload.swift_code,
                bank_name: payload.bank_name,
                bank_address: payload.bank_address,
                intermediary_bank_info: payload.intermediary_bank_info,
            },
        )
        .await?;

    info!(user_id = %auth.id(), bank_account_id = %account.id, "Bank account created");
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// PUT /bank-accounts/{id} - Partially update a bank account.
async fn update_bank_account(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(bank_account_id): Path<Uuid>,
    Json(payload): Json<UpdateBankAccountRequest>,
) -> ApiResult<Json<BankAccountResponse>> {
    let repo = BankAccountRepository::new((*state.db).clone());
    let account = repo
        .update_bank_account(
            auth.id(),
            bank_account_id,
            UpdateBankAccountInput {
                label: payload.label,
                beneficiary_full_name: payload.beneficiary_full_name,
                beneficiary_full_address: payload.beneficiary_full_address,
                beneficiary_account_number: payload.beneficiary_account_number,
                swift_code: payload.swift_code,
                bank_name: payload.bank_name,
                bank_address: payload.bank_address,
                intermediary_bank_info: payload.intermediary_bank_info,
            },
        )
        .await?;

    info!(user_id = %auth.id(), bank_account_id = %account.id, "Bank account updated");
    Ok(Json(account.into()))
}

/// DELETE /bank-accounts/{id} - Delete a bank account with no invoices.
async fn delete_bank_account(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(bank_account_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = BankAccountRepository::new((*state.db).clone());
    repo.delete_bank_account(auth.id(), bank_account_id).await?;

    info!(user_id = %auth.id(), bank_account_id = %bank_account_id, "Bank account deleted");
    Ok(StatusCode::NO_CONTENT)
}
