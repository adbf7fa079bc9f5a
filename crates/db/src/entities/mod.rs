//! `SeaORM` entity definitions.

pub mod bank_accounts;
pub mod customers;
pub mod invoice_services;
pub mod invoices;
pub mod transaction_categories;
pub mod transactions;
pub mod user_roles;
pub mod users;
