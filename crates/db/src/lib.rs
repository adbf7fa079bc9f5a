//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Every repository method that reads or writes tenant-owned data takes the
//! caller's user id and scopes the query to it; rows owned by another tenant
//! are reported as not found.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    BankAccountRepository, CustomerRepository, InvoiceRepository, SearchRepository,
    ServiceRepository, TransactionCategoryRepository, TransactionRepository, UserRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
