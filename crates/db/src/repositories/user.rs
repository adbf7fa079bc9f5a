//! User repository for account resolution and registration.
//!
//! Users are created on first successful registration against the external
//! identity provider and never deleted. The role is a weak reference,
//! joined on read.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use faktura_shared::AppError;

use crate::entities::{user_roles, users};

/// Role name assigned to newly registered users.
pub const DEFAULT_ROLE: &str = "CLIENT";

/// Role name allowed to see the global users directory in search.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// A user with this provider uid or email already exists.
    #[error("User already exists")]
    AlreadyExists,

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::AlreadyExists => Self::Conflict(err.to_string()),
            UserError::NotFound(_) => Self::NotFound("User not found".to_string()),
            UserError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct RegisterUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub provider_uid: String,
}

/// A user together with their (weakly referenced) role.
#[derive(Debug, Clone)]
pub struct UserWithRole {
    pub user: users::Model,
    pub role: Option<user_roles::Model>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a user resolved from a verified provider identity.
    ///
    /// The new user gets the CLIENT role when it has been seeded.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` when the provider uid or email is taken.
    pub async fn register_user(&self, input: RegisterUserInput) -> Result<users::Model, UserError> {
        let existing = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::ProviderUid.eq(&input.provider_uid))
                    .add(users::Column::Email.eq(&input.email)),
            )
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(UserError::AlreadyExists);
        }

        let client_role = self.find_role_by_name(DEFAULT_ROLE).await?;

        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            provider_uid: Set(input.provider_uid),
            role_id: Set(client_role.map(|r| r.id)),
            last_login: Set(None),
            created_at: Set(Utc::now().into()),
        };

        match user.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(UserError::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Finds a user by the identity provider's subject id.
    pub async fn find_by_provider_uid(
        &self,
        provider_uid: &str,
    ) -> Result<Option<users::Model>, UserError> {
        let user = users::Entity::find()
            .filter(users::Column::ProviderUid.eq(provider_uid))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    /// Finds a user by provider subject id, with their role joined.
    pub async fn find_with_role(
        &self,
        provider_uid: &str,
    ) -> Result<Option<UserWithRole>, UserError> {
        let found = users::Entity::find()
            .filter(users::Column::ProviderUid.eq(provider_uid))
            .find_also_related(user_roles::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(user, role)| UserWithRole { user, role }))
    }

    /// Bumps a user's last_login to now.
    pub async fn touch_last_login(&self, user_id: Uuid) -> Result<users::Model, UserError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(UserError::NotFound(user_id))?;

        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now().into()));
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Lists every user with their role, ordered by first name.
    ///
    /// The directory is global by design, not tenant-scoped.
    pub async fn list_users_with_roles(&self) -> Result<Vec<UserWithRole>, UserError> {
        let found = users::Entity::find()
            .find_also_related(user_roles::Entity)
            .order_by_asc(users::Column::FirstName)
            .all(&self.db)
            .await?;
        Ok(found
            .into_iter()
            .map(|(user, role)| UserWithRole { user, role })
            .collect())
    }

    /// Finds a role by name.
    pub async fn find_role_by_name(
        &self,
        name: &str,
    ) -> Result<Option<user_roles::Model>, UserError> {
        let role = user_roles::Entity::find()
            .filter(user_roles::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(role)
    }
}
