//! Transaction category repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;

use faktura_shared::AppError;

use crate::entities::{transaction_categories, transactions};

/// Error types for transaction category operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionCategoryError {
    /// Category not found (or owned by another tenant).
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    /// Name already taken within the tenant.
    #[error("A category with this name already exists")]
    DuplicateName,

    /// Category is referenced by transactions and cannot be deleted.
    #[error("Category is used by transactions and cannot be deleted")]
    HasTransactions,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransactionCategoryError> for AppError {
    fn from(err: TransactionCategoryError) -> Self {
        match err {
            TransactionCategoryError::NotFound(_) => {
                Self::NotFound("Category not found".to_string())
            }
            TransactionCategoryError::DuplicateName | TransactionCategoryError::HasTransactions => {
                Self::Conflict(err.to_string())
            }
            TransactionCategoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateTransactionCategoryInput {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Input for partially updating a category.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionCategoryInput {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
}

/// Transaction category repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TransactionCategoryRepository {
    db: DatabaseConnection,
}

impl TransactionCategoryRepository {
    /// Creates a new transaction category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category for the tenant.
    pub async fn create_category(
        &self,
        user_id: Uuid,
        input: CreateTransactionCategoryInput,
    ) -> Result<transaction_categories::Model, TransactionCategoryError> {
        let existing = transaction_categories::Entity::find()
            .filter(transaction_categories::Column::CreatedByUserId.eq(user_id))
            .filter(transaction_categories::Column::Name.eq(&input.name))
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(TransactionCategoryError::DuplicateName);
        }

        let now = Utc::now().into();
        let category = transaction_categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_by_user_id: Set(user_id),
            name: Set(input.name),
            color: Set(input.color),
            icon: Set(input.icon),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match category.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(TransactionCategoryError::DuplicateName)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists the tenant's categories, optionally filtered by name substring,
    /// ordered by name.
    pub async fn list_categories(
        &self,
        user_id: Uuid,
        q: Option<&str>,
    ) -> Result<Vec<transaction_categories::Model>, TransactionCategoryError> {
        let mut query = transaction_categories::Entity::find()
            .filter(transaction_categories::Column::CreatedByUserId.eq(user_id));

        if let Some(q) = q {
            let pattern = format!("%{q}%");
            query = query.filter(Expr::col(transaction_categories::Column::Name).ilike(pattern));
        }

        let categories = query
            .order_by_asc(transaction_categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    /// Finds a tenant's category by id.
    pub async fn find_category_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<transaction_categories::Model>, TransactionCategoryError> {
        let category = transaction_categories::Entity::find_by_id(id)
            .filter(transaction_categories::Column::CreatedByUserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(category)
    }

    /// Partially updates a tenant's category.
    pub async fn update_category(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateTransactionCategoryInput,
    ) -> Result<transaction_categories::Model, TransactionCategoryError> {
        let category = self
            .find_category_by_id(user_id, id)
            .await?
            .ok_or(TransactionCategoryError::NotFound(id))?;

        if let Some(new_name) = &input.name
            && *new_name != category.name
        {
            let existing = transaction_categories::Entity::find()
                .filter(transaction_categories::Column::CreatedByUserId.eq(user_id))
                .filter(transaction_categories::Column::Name.eq(new_name))
                .filter(transaction_categories::Column::Id.ne(id))
                .one(&self.db)
                .await?;

            if existing.is_some() {
                return Err(TransactionCategoryError::DuplicateName);
            }
        }

        let mut active: transaction_categories::ActiveModel = category.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(color) = input.color {
            active.color = Set(color);
        }
        if let Some(icon) = input.icon {
            active.icon = Set(icon);
        }
        active.updated_at = Set(Utc::now().into());

        match active.update(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(TransactionCategoryError::DuplicateName)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a tenant's category.
    ///
    /// # Errors
    ///
    /// Returns `HasTransactions` while any transaction references it.
    pub async fn delete_category(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), TransactionCategoryError> {
        let category = self
            .find_category_by_id(user_id, id)
            .await?
            .ok_or(TransactionCategoryError::NotFound(id))?;

        let referencing = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;

        if referencing > 0 {
            return Err(TransactionCategoryError::HasTransactions);
        }

        transaction_categories::Entity::delete_by_id(category.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
