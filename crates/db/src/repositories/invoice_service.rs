//! Template service repository.
//!
//! Template services are `invoice_services` rows with no parent invoice:
//! reusable catalog entries a tenant picks from when drafting invoices.
//! Attached line items are reachable only through their invoice; every
//! query here pins `invoice_id IS NULL`.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, sea_query::{Expr, extension::postgres::PgExpr},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use faktura_shared::AppError;

use crate::entities::invoice_services;

/// Error types for template service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Template service not found (absent, attached, or foreign tenant).
    #[error("Service not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => Self::NotFound("Service not found".to_string()),
            ServiceError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a template service.
#[derive(Debug, Clone)]
pub struct CreateTemplateServiceInput {
    pub service_title: String,
    pub service_description: Option<String>,
    /// Always > 0; validated before reaching the repository.
    pub amount: Decimal,
    pub sort_order: Option<i32>,
}

/// Input for partially updating a template service.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplateServiceInput {
    pub service_title: Option<String>,
    pub service_description: Option<Option<String>>,
    pub amount: Option<Decimal>,
    pub sort_order: Option<Option<i32>>,
}

/// Template service repository.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    db: DatabaseConnection,
}

impl ServiceRepository {
    /// Creates a new template service repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a template service for the tenant.
    pub async fn create_template(
        &self,
        user_id: Uuid,
        input: CreateTemplateServiceInput,
    ) -> Result<invoice_services::Model, ServiceError> {
        let now = Utc::now().into();
        let service = invoice_services::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            invoice_id: Set(None),
            service_title: Set(input.service_title),
            service_description: Set(input.service_description),
            amount: Set(input.amount),
            sort_order: Set(input.sort_order),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let service = service.insert(&self.db).await?;
        Ok(service)
    }

    /// Lists the tenant's template services, optionally filtered by a title
    /// substring, ordered by title.
    pub async fn list_templates(
        &self,
        user_id: Uuid,
        q: Option<&str>,
    ) -> Result<Vec<invoice_services::Model>, ServiceError> {
        let mut query = invoice_services::Entity::find()
            .filter(invoice_services::Column::CreatedByUserId.eq(user_id))
            .filter(invoice_services::Column::InvoiceId.is_null());

        if let Some(q) = q {
            let pattern = format!("%{q}%");
            query = query.filter(Expr::col(invoice_services::Column::ServiceTitle).ilike(pattern));
        }

        let services = query
            .order_by_asc(invoice_services::Column::ServiceTitle)
            .all(&self.db)
            .await?;
        Ok(services)
    }

    /// Finds a tenant's template service by id.
    pub async fn find_template_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<invoice_services::Model>, ServiceError> {
        let service = invoice_services::Entity::find_by_id(id)
            .filter(invoice_services::Column::CreatedByUserId.eq(user_id))
            .filter(invoice_services::Column::InvoiceId.is_null())
            .one(&self.db)
            .await?;
        Ok(service)
    }

    /// Partially updates a tenant's template service.
    pub async fn update_template(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateTemplateServiceInput,
    ) -> Result<invoice_services::Model, ServiceError> {
        let service = self
            .find_template_by_id(user_id, id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        let mut active: invoice_services::ActiveModel = service.into();

        if let Some(service_title) = input.service_title {
            active.service_title = Set(service_title);
        }
        if let Some(service_description) = input.service_description {
            active.service_description = Set(service_description);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(sort_order) = input.sort_order {
            active.sort_order = Set(sort_order);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Deletes a tenant's template service.
    pub async fn delete_template(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let service = self
            .find_template_by_id(user_id, id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        invoice_services::Entity::delete_by_id(service.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
