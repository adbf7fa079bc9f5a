//! Customer repository for billing-party database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use faktura_shared::AppError;

use crate::entities::{customers, invoices};

/// Error types for customer operations.
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    /// Customer not found (or owned by another tenant).
    #[error("Customer not found: {0}")]
    NotFound(Uuid),

    /// Legal name already taken within the tenant.
    #[error("A customer with this legal name already exists")]
    DuplicateLegalName,

    /// Customer is referenced by invoices and cannot be deleted.
    #[error("Customer has invoices and cannot be deleted")]
    HasInvoices,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound(_) => Self::NotFound("Customer not found".to_string()),
            CustomerError::DuplicateLegalName | CustomerError::HasInvoices => {
                Self::Conflict(err.to_string())
            }
            CustomerError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerInput {
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

/// Input for partially updating a customer.
///
/// Outer `None` means "leave unchanged"; for nullable columns the inner
/// option carries an explicit null.
#[derive(Debug, Clone, Default)]
pub struct UpdateCustomerInput {
    pub legal_name: Option<String>,
    pub display_name: Option<Option<String>>,
    pub tax_id: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address_line_1: Option<Option<String>>,
    pub address_line_2: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub zip: Option<Option<String>>,
    pub country: Option<Option<String>>,
}

/// Customer repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a customer for the tenant.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateLegalName` when the tenant already has a customer
    /// with the same legal name.
    pub async fn create_customer(
        &self,
        user_id: Uuid,
        input: CreateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        let existing = customers::Entity::find()
            .filter(customers::Column::CreatedByUserId.eq(user_id))
            .filter(customers::Column::LegalName.eq(&input.legal_name))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(CustomerError::DuplicateLegalName);
        }

        let now = Utc::now().into();
        let customer = customers::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            legal_name: Set(input.legal_name),
            display_name: Set(input.display_name),
            tax_id: Set(input.tax_id),
            email: Set(input.email),
            phone: Set(input.phone),
            address_line_1: Set(input.address_line_1),
            address_line_2: Set(input.address_line_2),
            city: Set(input.city),
            state: Set(input.state),
            zip: Set(input.zip),
            country: Set(input.country),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The pre-check races with concurrent creates; the unique constraint
        // is the backstop.
        match customer.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(CustomerError::DuplicateLegalName)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists the tenant's customers, optionally filtered by a free-text
    /// query over legal and display name, ordered by legal name.
    pub async fn list_customers(
        &self,
        user_id: Uuid,
        q: Option<&str>,
    ) -> Result<Vec<customers::Model>, CustomerError> {
        let mut query = customers::Entity::find()
            .filter(customers::Column::CreatedByUserId.eq(user_id));

        if let Some(q) = q {
            let pattern = format!("%{q}%");
            query = query.filter(
                Condition::any()
                    .add(Expr::col(customers::Column::LegalName).ilike(pattern.clone()))
                    .add(Expr::col(customers::Column::DisplayName).ilike(pattern)),
            );
        }

        let customers = query
            .order_by_asc(customers::Column::LegalName)
            .all(&self.db)
            .await?;
        Ok(customers)
    }

    /// Finds a tenant's customer by id.
    pub async fn find_customer_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<customers::Model>, CustomerError> {
        let customer = customers::Entity::find_by_id(id)
            .filter(customers::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(customer)
    }

    /// Partially updates a tenant's customer.
    ///
    /// Only fields present in the input are touched.
    pub async fn update_customer(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        let customer = self
            .find_customer_by_id(user_id, id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        // If changing legal_name, validate uniqueness within the tenant
        if let Some(new_name) = &input.legal_name
            && *new_name != customer.legal_name
        {
            let existing = customers::Entity::find()
                .filter(customers::Column::CreatedByUserId.eq(user_id))
                .filter(customers::Column::LegalName.eq(new_name))
                .filter(customers::Column::Id.ne(id))
                .one(&self.db)
                .await?;

            if existing.is_some() {
                return Err(CustomerError::DuplicateLegalName);
            }
        }

        let mut active: customers::ActiveModel = customer.into();

        if let Some(legal_name) = input.legal_name {
            active.legal_name = Set(legal_name);
        }
        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(tax_id) = input.tax_id {
            active.tax_id = Set(tax_id);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(address_line_1) = input.address_line_1 {
            active.address_line_1 = Set(address_line_1);
        }
        if let Some(address_line_2) = input.address_line_2 {
            active.address_line_2 = Set(address_line_2);
        }
        if let Some(city) = input.city {
            active.city = Set(city);
        }
        if let Some(state) = input.state {
            active.state = Set(state);
        }
        if let Some(zip) = input.zip {
            active.zip = Set(zip);
        }
        if let Some(country) = input.country {
            active.country = Set(country);
        }
        active.updated_at = Set(Utc::now().into());

        match active.update(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(CustomerError::DuplicateLegalName)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a tenant's customer.
    ///
    /// # Errors
    ///
    /// Returns `HasInvoices` while any invoice references the customer.
    pub async fn delete_customer(&self, user_id: Uuid, id: Uuid) -> Result<(), CustomerError> {
        let customer = self
            .find_customer_by_id(user_id, id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let referencing = invoices::Entity::find()
            .filter(invoices::Column::CustomerId.eq(id))
            .count(&self.db)
            .await?;

        if referencing > 0 {
            return Err(CustomerError::HasInvoices);
        }

        customers::Entity::delete_by_id(customer.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
