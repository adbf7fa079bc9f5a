//! `SeaORM` Entity for the invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The aggregate root of billing. Unique per (tenant, invoice number).
///
/// `total_amount` is derived: always the sum of the attached services'
/// amounts at the moment of last write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning tenant.
    pub created_by_user_id: Uuid,
    /// Billed customer; must belong to the same tenant.
    pub customer_id: Uuid,
    /// Payment destination; must belong to the same tenant when set.
    pub bank_account_id: Option<Uuid>,
    pub invoice_number: String,
    pub issue_date: Date,
    pub due_date: Date,
    /// 3-letter code, stored upper-case.
    pub currency: String,
    /// One of draft, sent, paid, void.
    pub status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub is_recurrent: bool,
    /// One of daily, weekly, monthly; null when not recurrent.
    pub recurrence_frequency: Option<String>,
    /// [0,6] for weekly (0 = Monday), [1,31] for monthly, null otherwise.
    pub recurrence_day: Option<i32>,
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
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_accounts::Column::Id"
    )]
    BankAccounts,
    #[sea_orm(has_many = "super::invoice_services::Entity")]
    InvoiceServices,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl Related<super::invoice_services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceServices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
