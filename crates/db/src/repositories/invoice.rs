//! Invoice repository: the billing aggregate root.
//!
//! Creation and update run inside a single database transaction covering the
//! invoice row and its line items, so `total_amount` can never drift from
//! the service set it was computed over.
//!
//! Invoice numbers are allocated optimistically: read the tenant's current
//! maximum, derive the successor, and let the per-tenant unique constraint
//! catch a concurrent allocation. An auto-generated number that collides is
//! regenerated and retried exactly once; an explicit number that collides
//! fails immediately.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use faktura_core::invoice::{
    InvoiceStatus, Recurrence, RecurrenceError, RecurrenceFrequency, invoice_total,
    next_invoice_number,
};
use faktura_shared::AppError;

use crate::entities::{bank_accounts, customers, invoice_services, invoices};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found (or owned by another tenant).
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// Referenced customer not found (or owned by another tenant).
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Referenced bank account not found (or owned by another tenant).
    #[error("Bank account not found: {0}")]
    BankAccountNotFound(Uuid),

    /// Invoice number already taken within the tenant.
    #[error("Invoice number already exists")]
    DuplicateNumber(String),

    /// Due date precedes issue date after applying the update.
    #[error("due_date must be on or after issue_date")]
    DueBeforeIssue,

    /// Recurrence fields do not form a valid combination.
    #[error(transparent)]
    InvalidRecurrence(#[from] RecurrenceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::NotFound(_) => Self::NotFound("Invoice not found".to_string()),
            InvoiceError::CustomerNotFound(_) => Self::NotFound("Customer not found".to_string()),
            InvoiceError::BankAccountNotFound(_) => {
                Self::NotFound("Bank account not found".to_string())
            }
            InvoiceError::DuplicateNumber(_) => {
                Self::Conflict("Invoice number already exists".to_string())
            }
            InvoiceError::DueBeforeIssue => Self::Validation(err.to_string()),
            InvoiceError::InvalidRecurrence(e) => Self::Validation(e.to_string()),
            InvoiceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// One line item supplied at invoice create/update.
#[derive(Debug, Clone)]
pub struct CreateServiceLine {
    pub service_title: String,
    pub service_description: Option<String>,
    /// Always > 0; validated before reaching the repository.
    pub amount: Decimal,
    /// Defaults to the line's position in the submitted list.
    pub sort_order: Option<i32>,
}

/// Input for creating an invoice.
///
/// Currency, status, recurrence, and the service list are validated and
/// normalized before reaching the repository.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    pub customer_id: Uuid,
    pub bank_account_id: Option<Uuid>,
    /// Explicit number; allocated when absent.
    pub invoice_number: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub recurrence: Recurrence,
    /// Non-empty; validated before reaching the repository.
    pub services: Vec<CreateServiceLine>,
}

/// Input for partially updating an invoice.
///
/// Outer `None` means "leave unchanged". A present `services` list replaces
/// the full set of attached line items and recomputes the total.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    pub customer_id: Option<Uuid>,
    pub bank_account_id: Option<Option<Uuid>>,
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<Option<String>>,
    pub is_recurrent: Option<bool>,
    pub recurrence_frequency: Option<Option<RecurrenceFrequency>>,
    pub recurrence_day: Option<Option<i32>>,
    pub services: Option<Vec<CreateServiceLine>>,
}

impl UpdateInvoiceInput {
    /// True when any recurrence field is part of the update.
    fn touches_recurrence(&self) -> bool {
        self.is_recurrent.is_some()
            || self.recurrence_frequency.is_some()
            || self.recurrence_day.is_some()
    }
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub issue_date_from: Option<NaiveDate>,
    pub issue_date_to: Option<NaiveDate>,
}

/// An invoice with its read-projection relations.
#[derive(Debug, Clone)]
pub struct InvoiceWithRelations {
    pub invoice: invoices::Model,
    pub customer: customers::Model,
    pub bank_account: Option<bank_accounts::Model>,
    /// Ordered by sort_order, ties by insertion order.
    pub services: Vec<invoice_services::Model>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice with its line items in one transaction.
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` / `BankAccountNotFound` when a reference is
    ///   absent or belongs to another tenant
    /// - `DuplicateNumber` when an explicit number collides, or an
    ///   auto-generated number still collides after the single retry
    pub async fn create_invoice(
        &self,
        user_id: Uuid,
        input: CreateInvoiceInput,
    ) -> Result<InvoiceWithRelations, InvoiceError> {
        let customer = self.require_customer(user_id, input.customer_id).await?;
        let bank_account = match input.bank_account_id {
            Some(id) => Some(self.require_bank_account(user_id, id).await?),
            None => None,
        };

        let amounts: Vec<Decimal> = input.services.iter().map(|s| s.amount).collect();
        let total = invoice_total(&amounts);

        let explicit = input.invoice_number.is_some();
        let mut number = match input.invoice_number.clone() {
            Some(n) => n,
            None => self.next_number(user_id).await?,
        };

        for attempt in 0..2 {
            match self
                .insert_invoice_with_services(user_id, &input, &number, total)
                .await
            {
                Ok((invoice, services)) => {
                    return Ok(InvoiceWithRelations {
                        invoice,
                        customer,
                        bank_account,
                        services,
                    });
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    if explicit || attempt > 0 {
                        return Err(InvoiceError::DuplicateNumber(number));
                    }
                    // A concurrent creation won the race for this number;
                    // regenerate from the new maximum and retry once.
                    number = self.next_number(user_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(InvoiceError::DuplicateNumber(number))
    }

    /// Lists the tenant's invoices with their customers, newest issue date
    /// first.
    pub async fn list_invoices(
        &self,
        user_id: Uuid,
        filter: InvoiceFilter,
    ) -> Result<Vec<(invoices::Model, customers::Model)>, InvoiceError> {
        let mut query = invoices::Entity::find()
            .filter(invoices::Column::CreatedByUserId.eq(user_id));

        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.as_str()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoices::Column::CustomerId.eq(customer_id));
        }
        if let Some(from) = filter.issue_date_from {
            query = query.filter(invoices::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.issue_date_to {
            query = query.filter(invoices::Column::IssueDate.lte(to));
        }

        let rows = query
            .find_also_related(customers::Entity)
            .order_by_desc(invoices::Column::IssueDate)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(invoice, customer)| {
                let customer = customer.ok_or_else(|| {
                    InvoiceError::Database(DbErr::Custom(format!(
                        "invoice {} references a missing customer",
                        invoice.id
                    )))
                })?;
                Ok((invoice, customer))
            })
            .collect()
    }

    /// Finds a tenant's invoice by id with its full read projection.
    pub async fn find_invoice_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<InvoiceWithRelations>, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?;

        match invoice {
            Some(invoice) => Ok(Some(self.load_relations(invoice).await?)),
            None => Ok(None),
        }
    }

    /// Partially updates a tenant's invoice.
    ///
    /// A present `services` list replaces every attached line item and
    /// recomputes `total_amount`; an absent list leaves both untouched.
    pub async fn update_invoice(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<InvoiceWithRelations, InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        // Re-validate ownership of changed references before writing
        if let Some(customer_id) = input.customer_id {
            self.require_customer(user_id, customer_id).await?;
        }
        if let Some(Some(bank_account_id)) = input.bank_account_id {
            self.require_bank_account(user_id, bank_account_id).await?;
        }

        let issue_date = input.issue_date.unwrap_or(invoice.issue_date);
        let due_date = input.due_date.unwrap_or(invoice.due_date);
        if due_date < issue_date {
            return Err(InvoiceError::DueBeforeIssue);
        }

        // Recurrence is re-validated over the merged state whenever any of
        // its fields is part of the update.
        let recurrence = if input.touches_recurrence() {
            let is_recurrent = input.is_recurrent.unwrap_or(invoice.is_recurrent);
            let frequency = match &input.recurrence_frequency {
                Some(freq) => *freq,
                None => invoice
                    .recurrence_frequency
                    .as_deref()
                    .and_then(RecurrenceFrequency::parse),
            };
            let day = match input.recurrence_day {
                Some(day) => day,
                None => invoice.recurrence_day,
            };
            Some(Recurrence::validate(is_recurrent, frequency, day)?)
        } else {
            None
        };

        let attempted_number = input.invoice_number.clone();
        let txn = self.db.begin().await?;

        let invoice_id = invoice.id;
        let mut active: invoices::ActiveModel = invoice.into();

        if let Some(customer_id) = input.customer_id {
            active.customer_id = Set(customer_id);
        }
        if let Some(bank_account_id) = input.bank_account_id {
            active.bank_account_id = Set(bank_account_id);
        }
        if let Some(number) = input.invoice_number {
            active.invoice_number = Set(number);
        }
        if let Some(date) = input.issue_date {
            active.issue_date = Set(date);
        }
        if let Some(date) = input.due_date {
            active.due_date = Set(date);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(status) = input.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(notes) = input.notes {
            active.notes = Set(notes);
        }
        if let Some(recurrence) = recurrence {
            active.is_recurrent = Set(recurrence.is_recurrent);
            active.recurrence_frequency =
                Set(recurrence.frequency.map(|f| f.as_str().to_string()));
            active.recurrence_day = Set(recurrence.day);
        }

        // Full replace-on-update: a present list deletes every attached
        // line item, inserts the new set, and recomputes the total.
        if let Some(lines) = &input.services {
            invoice_services::Entity::delete_many()
                .filter(invoice_services::Column::InvoiceId.eq(invoice_id))
                .exec(&txn)
                .await?;

            insert_service_lines(&txn, user_id, invoice_id, lines).await?;

            let amounts: Vec<Decimal> = lines.iter().map(|s| s.amount).collect();
            active.total_amount = Set(invoice_total(&amounts));
        }

        active.updated_at = Set(Utc::now().into());

        let updated = match active.update(&txn).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                txn.rollback().await?;
                // Explicit number collisions never retry.
                return Err(InvoiceError::DuplicateNumber(
                    attempted_number.unwrap_or_default(),
                ));
            }
            Err(e) => {
                txn.rollback().await?;
                return Err(e.into());
            }
        };

        txn.commit().await?;

        self.load_relations(updated).await
    }

    /// Deletes a tenant's invoice. Unguarded: line items cascade away and
    /// nothing else may reference an invoice.
    pub async fn delete_invoice(&self, user_id: Uuid, id: Uuid) -> Result<(), InvoiceError> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        invoices::Entity::delete_by_id(invoice.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Derives the next invoice number from the tenant's current maximum.
    async fn next_number(&self, user_id: Uuid) -> Result<String, InvoiceError> {
        let latest = invoices::Entity::find()
            .filter(invoices::Column::CreatedByUserId.eq(user_id))
            .order_by_desc(invoices::Column::InvoiceNumber)
            .one(&self.db)
            .await?
            .map(|inv| inv.invoice_number);

        Ok(next_invoice_number(latest.as_deref()))
    }

    /// Inserts the invoice row and its line items in one transaction.
    async fn insert_invoice_with_services(
        &self,
        user_id: Uuid,
        input: &CreateInvoiceInput,
        number: &str,
        total: Decimal,
    ) -> Result<(invoices::Model, Vec<invoice_services::Model>), DbErr> {
        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let invoice = invoices::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            customer_id: Set(input.customer_id),
            bank_account_id: Set(input.bank_account_id),
            invoice_number: Set(number.to_string()),
            issue_date: Set(input.issue_date),
            due_date: Set(input.due_date),
            currency: Set(input.currency.clone()),
            status: Set(input.status.as_str().to_string()),
            total_amount: Set(total),
            notes: Set(input.notes.clone()),
            is_recurrent: Set(input.recurrence.is_recurrent),
            recurrence_frequency: Set(input
                .recurrence
                .frequency
                .map(|f| f.as_str().to_string())),
            recurrence_day: Set(input.recurrence.day),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let invoice = invoice.insert(&txn).await?;
        let services = insert_service_lines(&txn, user_id, invoice.id, &input.services).await?;

        txn.commit().await?;
        Ok((invoice, services))
    }

    /// Loads the read-projection relations for an invoice.
    async fn load_relations(
        &self,
        invoice: invoices::Model,
    ) -> Result<InvoiceWithRelations, InvoiceError> {
        let customer = customers::Entity::find_by_id(invoice.customer_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                InvoiceError::Database(DbErr::Custom(format!(
                    "invoice {} references a missing customer",
                    invoice.id
                )))
            })?;

        let bank_account = match invoice.bank_account_id {
            Some(id) => bank_accounts::Entity::find_by_id(id).one(&self.db).await?,
            None => None,
        };

        let services = invoice_services::Entity::find()
            .filter(invoice_services::Column::InvoiceId.eq(invoice.id))
            .order_by_asc(invoice_services::Column::SortOrder)
            .order_by_asc(invoice_services::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(InvoiceWithRelations {
            invoice,
            customer,
            bank_account,
            services,
        })
    }

    /// Looks up a tenant's customer, mapping absence to `CustomerNotFound`.
    async fn require_customer(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<customers::Model, InvoiceError> {
        customers::Entity::find_by_id(id)
            .filter(customers::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::CustomerNotFound(id))
    }

    /// Looks up a tenant's bank account, mapping absence to
    /// `BankAccountNotFound`.
    async fn require_bank_account(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bank_accounts::Model, InvoiceError> {
        bank_accounts::Entity::find_by_id(id)
            .filter(bank_accounts::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::BankAccountNotFound(id))
    }
}

/// Inserts line items for an invoice, defaulting `sort_order` to each
/// line's position in the submitted list.
async fn insert_service_lines(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    invoice_id: Uuid,
    lines: &[CreateServiceLine],
) -> Result<Vec<invoice_services::Model>, DbErr> {
    let now = Utc::now().into();
    let mut inserted = Vec::with_capacity(lines.len());

    for (position, line) in lines.iter().enumerate() {
        let sort_order = line
            .sort_order
            .unwrap_or_else(|| i32::try_from(position).unwrap_or(i32::MAX));

        let service = invoice_services::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            invoice_id: Set(Some(invoice_id)),
            service_title: Set(line.service_title.clone()),
            service_description: Set(line.service_description.clone()),
            amount: Set(line.amount),
            sort_order: Set(Some(sort_order)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        inserted.push(service.insert(txn).await?);
    }

    Ok(inserted)
}
