//! Bank account repository for payment-destination database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use faktura_shared::AppError;

use crate::entities::{bank_accounts, invoices};

/// Error types for bank account operations.
#[derive(Debug, thiserror::Error)]
pub enum BankAccountError {
    /// Bank account not found (or owned by another tenant).
    #[error("Bank account not found: {0}")]
    NotFound(Uuid),

    /// Label already taken within the tenant.
    #[error("A bank account with this label already exists")]
    DuplicateLabel,

    /// Account is referenced by invoices and cannot be deleted.
    #[error("Cannot delete bank account that is referenced by invoices")]
    HasInvoices,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BankAccountError> for AppError {
    fn from(err: BankAccountError) -> Self {
        match err {
            BankAccountError::NotFound(_) => Self::NotFound("Bank account not found".to_string()),
            BankAccountError::DuplicateLabel | BankAccountError::HasInvoices => {
                Self::Conflict(err.to_string())
            }
            BankAccountError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a bank account.
#[derive(Debug, Clone)]
pub struct CreateBankAccountInput {
    pub label: String,
    pub beneficiary_full_name: String,
    pub beneficiary_full_address: Option<String>,
    pub beneficiary_account_number: String,
    pub swift_code: String,
    pub bank_name: Option<String>,
    pub bank_address: Option<String>,
    pub intermediary_bank_info: Option<String>,
}

/// Input for partially updating a bank account.
#[derive(Debug, Clone, Default)]
pub struct UpdateBankAccountInput {
    pub label: Option<String>,
    pub beneficiary_full_name: Option<String>,
    pub beneficiary_full_address: Option<Option<String>>,
    pub beneficiary_account_number: Option<String>,
    pub swift_code: Option<String>,
    pub bank_name: Option<Option<String>>,
    pub bank_address: Option<Option<String>>,
    pub intermediary_bank_info: Option<Option<String>>,
}

/// Bank account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct BankAccountRepository {
    db: DatabaseConnection,
}

impl BankAccountRepository {
    /// Creates a new bank account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a bank account for the tenant.
    ///
    /// The (tenant, label) unique constraint does the duplicate detection;
    /// the violation is translated here, never surfaced raw.
    pub async fn create_bank_account(
        &self,
        user_id: Uuid,
        input: CreateBankAccountInput,
    ) -> Result<bank_accounts::Model, BankAccountError> {
        let now = Utc::now().into();
        let account = bank_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            label: Set(input.label),
            beneficiary_full_name: Set(input.beneficiary_full_name),
            beneficiary_full_address: Set(input.beneficiary_full_address),
            beneficiary_account_number: Set(input.beneficiary_account_number),
            swift_code: Set(input.swift_code),
            bank_name: Set(input.bank_name),
            bank_address: Set(input.bank_address),
            intermediary_bank_info: Set(input.intermediary_bank_info),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match account.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(BankAccountError::DuplicateLabel)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists the tenant's bank accounts ordered by label.
    pub async fn list_bank_accounts(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<bank_accounts::Model>, BankAccountError> {
        let accounts = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::CreatedByUserId.eq(user_id))
            .order_by_asc(bank_accounts::Column::Label)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Finds a tenant's bank account by id.
    pub async fn find_bank_account_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<bank_accounts::Model>, BankAccountError> {
        let account = bank_accounts::Entity::find_by_id(id)
            .filter(bank_accounts::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Partially updates a tenant's bank account.
    pub async fn update_bank_account(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateBankAccountInput,
    ) -> Result<bank_accounts::Model, BankAccountError> {
        let account = self
            .find_bank_account_by_id(user_id, id)
            .await?
            .ok_or(BankAccountError::NotFound(id))?;

        let mut active: bank_accounts::ActiveModel = account.into();

        if let Some(label) = input.label {
            active.label = Set(label);
        }
        if let Some(beneficiary_full_name) = input.beneficiary_full_name {
            active.beneficiary_full_name = Set(beneficiary_full_name);
        }
        if let Some(beneficiary_full_address) = input.beneficiary_full_address {
            active.beneficiary_full_address = Set(beneficiary_full_address);
        }
        if let Some(beneficiary_account_number) = input.beneficiary_account_number {
            active.beneficiary_account_number = Set(beneficiary_account_number);
        }
        if let Some(swift_code) = input.swift_code {
            active.swift_code = Set(swift_code);
        }
        if let Some(bank_name) = input.bank_name {
            active.bank_name = Set(bank_name);
        }
        if let Some(bank_address) = input.bank_address {
            active.bank_address = Set(bank_address);
        }
        if let Some(intermediary_bank_info) = input.intermediary_bank_info {
            active.intermediary_bank_info = Set(intermediary_bank_info);
        }
        active.updated_at = Set(Utc::now().into());

        match active.update(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(BankAccountError::DuplicateLabel)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a tenant's bank account.
    ///
    /// # Errors
    ///
    /// Returns `HasInvoices` while any of the tenant's invoices references
    /// the account.
    pub async fn delete_bank_account(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), BankAccountError> {
        let account = self
            .find_bank_account_by_id(user_id, id)
            .await?
            .ok_or(BankAccountError::NotFound(id))?;

        let referencing = invoices::Entity::find()
            .filter(invoices::Column::BankAccountId.eq(id))
            .filter(invoices::Column::CreatedByUserId.eq(user_id))
            .count(&self.db)
            .await?;

        if referencing > 0 {
            return Err(BankAccountError::HasInvoices);
        }

        bank_accounts::Entity::delete_by_id(account.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
