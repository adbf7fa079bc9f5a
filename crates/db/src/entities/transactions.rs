//! `SeaORM` Entity for the transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A ledger entry independent of invoices.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning tenant.
    pub created_by_user_id: Uuid,
    /// income or expense.
    #[sea_orm(column_name = "type")]
    pub transaction_type: String,
    /// business or personal.
    pub context: String,
    pub description: String,
    /// Always > 0; direction comes from the type.
    pub amount: Decimal,
    pub currency: String,
    pub date: Date,
    /// Optional category; must belong to the same tenant when set.
    pub category_id: Option<Uuid>,
    /// Optional bank account; must belong to the same tenant when set.
    pub bank_account_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedByUserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::transaction_categories::Entity",
        from = "Column::CategoryId",
        to = "super::transaction_categories::Column::Id"
    )]
    TransactionCategories,
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_accounts::Column::Id"
    )]
    BankAccounts,
}

impl Related<super::transaction_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionCategories.def()
    }
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
