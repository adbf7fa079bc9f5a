//! Global search across entity kinds.
//!
//! Fans out one capped query per kind, each independently tenant-scoped
//! (users excepted: the directory is global and gated on the ADMIN role at
//! the API layer). Kinds with no matches are omitted from the result.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use faktura_shared::AppError;

use crate::entities::{bank_accounts, customers, invoice_services, invoices, transactions, users};

/// Maximum hits returned per entity kind.
const MAX_RESULTS_PER_GROUP: u64 = 3;

/// Error types for search operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
}

/// All hits of one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchGroup {
    /// Kind tag: invoices, customers, banks, services, transactions, users.
    pub kind: &'static str,
    pub items: Vec<SearchItem>,
}

/// Global search repository.
#[derive(Debug, Clone)]
pub struct SearchRepository {
    db: DatabaseConnection,
}

impl SearchRepository {
    /// Creates a new search repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs the fan-out search for a tenant.
    ///
    /// `include_users` widens the search to the global user directory and
    /// must only be set for ADMIN callers.
    pub async fn global_search(
        &self,
        user_id: Uuid,
        q: &str,
        include_users: bool,
    ) -> Result<Vec<SearchGroup>, SearchError> {
        let pattern = format!("%{q}%");
        let mut groups = Vec::new();

        let invoices = self.search_invoices(user_id, &pattern).await?;
        if !invoices.is_empty() {
            groups.push(SearchGroup {
                kind: "invoices",
                items: invoices,
            });
        }

        let customers = self.search_customers(user_id, &pattern).await?;
        if !customers.is_empty() {
            groups.push(SearchGroup {
                kind: "customers",
                items: customers,
            });
        }

        let banks = self.search_bank_accounts(user_id, &pattern).await?;
        if !banks.is_empty() {
            groups.push(SearchGroup {
                kind: "banks",
                items: banks,
            });
        }

        let services = self.search_template_services(user_id, &pattern).await?;
        if !services.is_empty() {
            groups.push(SearchGroup {
                kind: "services",
                items: services,
            });
        }

        let transactions = self.search_transactions(user_id, &pattern).await?;
        if !transactions.is_empty() {
            groups.push(SearchGroup {
                kind: "transactions",
                items: transactions,
            });
        }

        if include_users {
            let users = self.search_users(&pattern).await?;
            if !users.is_empty() {
                groups.push(SearchGroup {
                    kind: "users",
                    items: users,
                });
            }
        }

        Ok(groups)
    }

    /// Invoices match on their number or their customer's legal name.
    async fn search_invoices(
        &self,
        user_id: Uuid,
        pattern: &str,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let rows = invoices::Entity::find()
            .find_also_related(customers::Entity)
            .filter(invoices::Column::CreatedByUserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(Expr::col((invoices::Entity, invoices::Column::InvoiceNumber)).ilike(pattern))
                    .add(Expr::col((customers::Entity, customers::Column::LegalName)).ilike(pattern)),
            )
            .order_by_desc(invoices::Column::IssueDate)
            .limit(MAX_RESULTS_PER_GROUP)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(invoice, customer)| SearchItem {
                id: invoice.id,
                title: invoice.invoice_number,
                subtitle: customer.map(|c| c.legal_name),
            })
            .collect())
    }

    /// Customers match on legal or display name.
    async fn search_customers(
        &self,
        user_id: Uuid,
        pattern: &str,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let rows = customers::Entity::find()
            .filter(customers::Column::CreatedByUserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(Expr::col(customers::Column::LegalName).ilike(pattern))
                    .add(Expr::col(customers::Column::DisplayName).ilike(pattern)),
            )
            .order_by_asc(customers::Column::LegalName)
            .limit(MAX_RESULTS_PER_GROUP)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|c| SearchItem {
                id: c.id,
                title: c.legal_name,
                subtitle: c.email,
            })
            .collect())
    }

    /// Bank accounts match on label or bank name.
    async fn search_bank_accounts(
        &self,
        user_id: Uuid,
        pattern: &str,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let rows = bank_accounts::Entity::find()
            .filter(bank_accounts::Column::CreatedByUserId.eq(user_id))
            .filter(
                Condition::any()
                    .add(Expr::col(bank_accounts::Column::Label).ilike(pattern))
                    .add(Expr::col(bank_accounts::Column::BankName).ilike(pattern)),
            )
            .order_by_asc(bank_accounts::Column::Label)
            .limit(MAX_RESULTS_PER_GROUP)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|b| SearchItem {
                id: b.id,
                title: b.label,
                subtitle: b.bank_name,
            })
            .collect())
    }

    /// Template services match on title; attached line items are excluded.
    async fn search_template_services(
        &self,
        user_id: Uuid,
        pattern: &str,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let rows = invoice_services::Entity::find()
            .filter(invoice_services::Column::CreatedByUserId.eq(user_id))
            .filter(invoice_services::Column::InvoiceId.is_null())
            .filter(Expr::col(invoice_services::Column::ServiceTitle).ilike(pattern))
            .order_by_asc(invoice_services::Column::ServiceTitle)
            .limit(MAX_RESULTS_PER_GROUP)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|s| SearchItem {
                id: s.id,
                title: s.service_title,
                subtitle: Some(format!("${}", s.amount.round_dp(2))),
            })
            .collect())
    }

    /// Transactions match on description.
    async fn search_transactions(
        &self,
        user_id: Uuid,
        pattern: &str,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::CreatedByUserId.eq(user_id))
            .filter(Expr::col(transactions::Column::Description).ilike(pattern))
            .order_by_desc(transactions::Column::Date)
            .limit(MAX_RESULTS_PER_GROUP)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|t| {
                let sign = if t.transaction_type == "income" { "+" } else { "-" };
                SearchItem {
                    id: t.id,
                    title: t.description.clone(),
                    subtitle: Some(format!("{sign}{} {}", t.currency, t.amount.round_dp(2))),
                }
            })
            .collect())
    }

    /// Users match on email or name. Global scope; ADMIN only.
    async fn search_users(&self, pattern: &str) -> Result<Vec<SearchItem>, SearchError> {
        let rows = users::Entity::find()
            .filter(
                Condition::any()
                    .add(Expr::col(users::Column::Email).ilike(pattern))
                    .add(Expr::col(users::Column::FirstName).ilike(pattern))
                    .add(Expr::col(users::Column::LastName).ilike(pattern)),
            )
            .order_by_asc(users::Column::FirstName)
            .limit(MAX_RESULTS_PER_GROUP)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|u| SearchItem {
                id: u.id,
                title: format!("{} {}", u.first_name, u.last_name),
                subtitle: Some(u.email),
            })
            .collect())
    }
}
