//! Transaction repository for ledger entry database operations.
//!
//! Besides CRUD this module carries the aggregation queries: the filtered
//! income/expense summary and the per-bank-account balances. Both treat an
//! empty result set as zeros, never as an error.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

use faktura_core::transaction::{TransactionContext, TransactionType};
use faktura_shared::AppError;

use crate::entities::{bank_accounts, transaction_categories, transactions};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found (or owned by another tenant).
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Referenced category not found (or owned by another tenant).
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Referenced bank account not found (or owned by another tenant).
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_) => Self::NotFound("Transaction not found".to_string()),
            TransactionError::CategoryNotFound(_) => {
                Self::NotFound("Category not found".to_string())
            }
            TransactionError::BankAccountNotFound(_) => {
                Self::NotFound("Bank account not found".to_string())
            }
            TransactionError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub transaction_type: TransactionType,
    pub context: TransactionContext,
    pub description: String,
    /// Always > 0; validated before reaching the repository.
    pub amount: Decimal,
    /// Normalized upper-case 3-letter code.
    pub currency: String,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Input for partially updating a transaction.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub transaction_type: Option<TransactionType>,
    pub context: Option<TransactionContext>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<Option<Uuid>>,
    pub bank_account_id: Option<Option<Uuid>>,
    pub notes: Option<Option<String>>,
}

/// Filter options shared by listing and the summary.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub context: Option<TransactionContext>,
    pub category_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// A transaction with its read-projection relations.
#[derive(Debug, Clone)]
pub struct TransactionWithRelations {
    pub transaction: transactions::Model,
    pub category: Option<transaction_categories::Model>,
    pub bank_account: Option<bank_accounts::Model>,
}

/// Aggregated totals over a filtered transaction set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_balance: Decimal,
    pub transaction_count: u64,
}

/// Income/expense totals for one bank account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAccountBalance {
    pub bank_account_id: Uuid,
    pub bank_account_label: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a transaction for the tenant.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` / `BankAccountNotFound` when a reference
    /// is absent or belongs to another tenant.
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        input: CreateTransactionInput,
    ) -> Result<TransactionWithRelations, TransactionError> {
        let category = match input.category_id {
            Some(id) => Some(self.require_category(user_id, id).await?),
            None => None,
        };
        let bank_account = match input.bank_account_id {
            Some(id) => Some(self.require_bank_account(user_id, id).await?),
            None => None,
        };

        let now = Utc::now().into();
        let transaction = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            transaction_type: Set(input.transaction_type.as_str().to_string()),
            context: Set(input.context.as_str().to_string()),
            description: Set(input.description),
            amount: Set(input.amount),
            currency: Set(input.currency),
            date: Set(input.date),
            category_id: Set(input.category_id),
            bank_account_id: Set(input.bank_account_id),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let transaction = transaction.insert(&self.db).await?;
        Ok(TransactionWithRelations {
            transaction,
            category,
            bank_account,
        })
    }

    /// Lists the tenant's transactions with relations, newest date first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionWithRelations>, TransactionError> {
        let rows = apply_filter(transactions::Entity::find(), user_id, &filter)
            .find_also_related(transaction_categories::Entity)
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        // Bank accounts are batch-loaded rather than joined a second time.
        let bank_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|(t, _)| t.bank_account_id)
            .collect();
        let banks: HashMap<Uuid, bank_accounts::Model> = if bank_ids.is_empty() {
            HashMap::new()
        } else {
            bank_accounts::Entity::find()
                .filter(bank_accounts::Column::Id.is_in(bank_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|b| (b.id, b))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|(transaction, category)| {
                let bank_account = transaction
                    .bank_account_id
                    .and_then(|id| banks.get(&id).cloned());
                TransactionWithRelations {
                    transaction,
                    category,
                    bank_account,
                }
            })
            .collect())
    }

    /// Finds a tenant's transaction by id with relations.
    pub async fn find_transaction_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TransactionWithRelations>, TransactionError> {
        let transaction = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?;

        match transaction {
            Some(transaction) => Ok(Some(self.load_relations(transaction).await?)),
            None => Ok(None),
        }
    }

    /// Partially updates a tenant's transaction.
    pub async fn update_transaction(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<TransactionWithRelations, TransactionError> {
        let transaction = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        // Re-validate ownership of changed references before writing
        if let Some(Some(category_id)) = input.category_id {
            self.require_category(user_id, category_id).await?;
        }
        if let Some(Some(bank_account_id)) = input.bank_account_id {
            self.require_bank_account(user_id, bank_account_id).await?;
        }

        let mut active: transactions::ActiveModel = transaction.into();

        if let Some(transaction_type) = input.transaction_type {
            active.transaction_type = Set(transaction_type.as_str().to_string());
        }
        if let Some(context) = input.context {
            active.context = Set(context.as_str().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(bank_account_id) = input.bank_account_id {
            active.bank_account_id = Set(bank_account_id);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        self.load_relations(updated).await
    }

    /// Deletes a tenant's transaction.
    pub async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> Result<(), TransactionError> {
        let transaction = transactions::Entity::find_by_id(id)
            .filter(transactions::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        transactions::Entity::delete_by_id(transaction.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Computes income, expenses, net balance, and count over the filtered
    /// set in one pass. No matching rows yields zeros.
    pub async fn summary(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<TransactionSummary, TransactionError> {
        let rows = apply_filter(transactions::Entity::find(), user_id, &filter)
            .all(&self.db)
            .await?;
        Ok(summarize(&rows))
    }

    /// Groups the tenant's transactions by bank account, yielding income,
    /// expenses, and balance per account. Accounts with no matching
    /// transactions are absent from the result.
    pub async fn bank_account_balances(
        &self,
        user_id: Uuid,
        context: Option<TransactionContext>,
    ) -> Result<Vec<BankAccountBalance>, TransactionError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::CreatedByUserId.eq(user_id))
            .filter(transactions::Column::BankAccountId.is_not_null());

        if let Some(context) = context {
            query = query.filter(transactions::Column::Context.eq(context.as_str()));
        }

        let rows = query
            .find_also_related(bank_accounts::Entity)
            .all(&self.db)
            .await?;

        let rows: Vec<(transactions::Model, bank_accounts::Model)> = rows
            .into_iter()
            .filter_map(|(t, b)| b.map(|b| (t, b)))
            .collect();

        Ok(group_balances(&rows))
    }

    /// Loads the read-projection relations for a transaction.
    async fn load_relations(
        &self,
        transaction: transactions::Model,
    ) -> Result<TransactionWithRelations, TransactionError> {
        let category = match transaction.category_id {
            Some(id) => {
                transaction_categories::Entity::find_by_id(id)
                    .one(&self.db)
                    .await?
            }
            None => None,
        };
        let bank_account = match transaction.bank_account_id {
            Some(id) => bank_accounts::Entity::find_by_id(id).one(&self.db).await?,
            None => None,
        };

        Ok(TransactionWithRelations {
            transaction,
            category,
            bank_account,
        })
    }

    /// Looks up a tenant's category, mapping absence to `CategoryNotFound`.
    async fn require_category(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<transaction_categories::Model, TransactionError> {
        transaction_categories::Entity::find_by_id(id)
            .filter(transaction_categories::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(TransactionError::CategoryNotFound(id))
    }

    /// Looks up a tenant's bank account, mapping absence to
    /// `BankAccountNotFound`.
    async fn require_bank_account(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bank_accounts::Model, TransactionError> {
        bank_accounts::Entity::find_by_id(id)
            .filter(bank_accounts::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(TransactionError::BankAccountNotFound(id))
    }
}

/// Applies the tenant filter and then the optional filters to a select.
///
/// The tenant filter is unconditional and always applied first.
fn apply_filter(
    query: Select<transactions::Entity>,
    user_id: Uuid,
    filter: &TransactionFilter,
) -> Select<transactions::Entity> {
    let mut query = query.filter(transactions::Column::CreatedByUserId.eq(user_id));

    if let Some(transaction_type) = filter.transaction_type {
        query = query.filter(transactions::Column::TransactionType.eq(transaction_type.as_str()));
    }
    if let Some(context) = filter.context {
        query = query.filter(transactions::Column::Context.eq(context.as_str()));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(transactions::Column::CategoryId.eq(category_id));
    }
    if let Some(bank_account_id) = filter.bank_account_id {
        query = query.filter(transactions::Column::BankAccountId.eq(bank_account_id));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(transactions::Column::Date.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(transactions::Column::Date.lte(to));
    }

    query
}

/// Folds a transaction set into its summary totals.
#[must_use]
pub fn summarize(rows: &[transactions::Model]) -> TransactionSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;

    for row in rows {
        match TransactionType::parse(&row.transaction_type) {
            Some(TransactionType::Income) => total_income += row.amount,
            Some(TransactionType::Expense) | None => total_expenses += row.amount,
        }
    }

    TransactionSummary {
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        transaction_count: rows.len() as u64,
    }
}

/// Groups (transaction, bank account) pairs into per-account balances,
/// ordered by label.
#[must_use]
pub fn group_balances(
    rows: &[(transactions::Model, bank_accounts::Model)],
) -> Vec<BankAccountBalance> {
    let mut grouped: HashMap<Uuid, BankAccountBalance> = HashMap::new();

    for (transaction, bank_account) in rows {
        let entry = grouped
            .entry(bank_account.id)
            .or_insert_with(|| BankAccountBalance {
                bank_account_id: bank_account.id,
                bank_account_label: bank_account.label.clone(),
                total_income: Decimal::ZERO,
                total_expenses: Decimal::ZERO,
                balance: Decimal::ZERO,
            });

        match TransactionType::parse(&transaction.transaction_type) {
            Some(TransactionType::Income) => entry.total_income += transaction.amount,
            Some(TransactionType::Expense) | None => entry.total_expenses += transaction.amount,
        }
    }

    let mut balances: Vec<BankAccountBalance> = grouped
        .into_values()
        .map(|mut b| {
            b.balance = b.total_income - b.total_expenses;
            b
        })
        .collect();
    balances.sort_by(|a, b| a.bank_account_label.cmp(&b.bank_account_label));
    balances
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
