//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Every method touching tenant-owned data takes the caller's user id and
//! scopes the query to it: a row owned by another tenant is reported exactly
//! like a missing row.

pub mod bank_account;
pub mod customer;
pub mod invoice;
pub mod invoice_service;
pub mod search;
pub mod transaction;
pub mod transaction_category;
pub mod user;

pub use bank_account::{
    BankAccountError, BankAccountRepository, CreateBankAccountInput, UpdateBankAccountInput,
};
pub use customer::{CreateCustomerInput, CustomerError, CustomerRepository, UpdateCustomerInput};
pub use invoice::{
    CreateInvoiceInput, CreateServiceLine, InvoiceError, InvoiceFilter, InvoiceRepository,
    InvoiceWithRelations, UpdateInvoiceInput,
};
pub use invoice_service::{
    CreateTemplateServiceInput, ServiceError, ServiceRepository, UpdateTemplateServiceInput,
};
pub use search::{SearchError, SearchGroup, SearchItem, SearchRepository};
pub use transaction::{
    BankAccountBalance, CreateTransactionInput, TransactionError, TransactionFilter,
    TransactionRepository, TransactionSummary, TransactionWithRelations, UpdateTransactionInput,
};
pub use transaction_category::{
    CreateTransactionCategoryInput, TransactionCategoryError, TransactionCategoryRepository,
    UpdateTransactionCategoryInput,
};
pub use user::{RegisterUserInput, UserError, UserRepository, UserWithRole};
