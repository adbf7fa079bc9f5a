//! Initial database migration.
//!
//! Creates all tables, per-tenant unique constraints, foreign keys, and
//! indexes. Enum-like columns are VARCHAR with CHECK constraints; validity
//! is enforced at the application boundary first, the constraints are the
//! backstop.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Identity
        db.execute_unprepared(USER_ROLES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // Tenant-owned master data
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTION_CATEGORIES_SQL).await?;

        // Billing
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(INVOICE_SERVICES_SQL).await?;

        // Bookkeeping
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const USER_ROLES_SQL: &str = r"
-- User roles: immutable reference data (ADMIN, CLIENT), seeded once
CREATE TABLE user_roles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(32) NOT NULL UNIQUE,
    description TEXT
);
";

const USERS_SQL: &str = r"
-- Tenant accounts; identity lives at the external provider
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(320) NOT NULL UNIQUE,
    first_name VARCHAR(255) NOT NULL,
    last_name VARCHAR(255) NOT NULL,
    provider_uid VARCHAR(128) NOT NULL UNIQUE,
    role_id UUID REFERENCES user_roles(id),
    last_login TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_provider_uid ON users(provider_uid);
CREATE INDEX idx_users_email ON users(email);
";

const CUSTOMERS_SQL: &str = r"
-- Billing parties, unique per (tenant, legal_name)
CREATE TABLE customers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by_user_id UUID NOT NULL REFERENCES users(id),
    legal_name VARCHAR(255) NOT NULL,
    display_name VARCHAR(255),
    tax_id VARCHAR(64),
    email VARCHAR(320),
    phone VARCHAR(32),
    address_line_1 VARCHAR(255),
    address_line_2 VARCHAR(255),
    city VARCHAR(128),
    state VARCHAR(128),
    zip VARCHAR(32),
    country VARCHAR(128),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_customer_user_legal_name UNIQUE (created_by_user_id, legal_name)
);

CREATE INDEX idx_customers_tenant ON customers(created_by_user_id);
";

const BANK_ACCOUNTS_SQL: &str = r"
-- Payment-destination profiles, unique per (tenant, label)
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by_user_id UUID NOT NULL REFERENCES users(id),
    label VARCHAR(255) NOT NULL,
    beneficiary_full_name VARCHAR(255) NOT NULL,
    beneficiary_full_address VARCHAR(512),
    beneficiary_account_number VARCHAR(64) NOT NULL,
    swift_code VARCHAR(16) NOT NULL,
    bank_name VARCHAR(255),
    bank_address VARCHAR(512),
    intermediary_bank_info TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_bank_account_user_label UNIQUE (created_by_user_id, label)
);

CREATE INDEX idx_bank_accounts_tenant ON bank_accounts(created_by_user_id);
";

const TRANSACTION_CATEGORIES_SQL: &str = r"
-- Transaction tagging, unique per (tenant, name)
CREATE TABLE transaction_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by_user_id UUID NOT NULL REFERENCES users(id),
    name VARCHAR(128) NOT NULL,
    color VARCHAR(7),
    icon VARCHAR(64),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_transaction_category_user_name UNIQUE (created_by_user_id, name)
);

CREATE INDEX idx_transaction_categories_tenant ON transaction_categories(created_by_user_id);
";

const INVOICES_SQL: &str = r"
-- Billing aggregate root, unique per (tenant, invoice_number)
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by_user_id UUID NOT NULL REFERENCES users(id),
    customer_id UUID NOT NULL REFERENCES customers(id),
    bank_account_id UUID REFERENCES bank_accounts(id),
    invoice_number VARCHAR(64) NOT NULL,
    issue_date DATE NOT NULL,
    due_date DATE NOT NULL,
    currency CHAR(3) NOT NULL DEFAULT 'USD',
    status VARCHAR(16) NOT NULL DEFAULT 'draft',
    total_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    notes TEXT,
    is_recurrent BOOLEAN NOT NULL DEFAULT FALSE,
    recurrence_frequency VARCHAR(16),
    recurrence_day INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_invoice_user_number UNIQUE (created_by_user_id, invoice_number),
    CONSTRAINT chk_invoice_status CHECK (status IN ('draft', 'sent', 'paid', 'void')),
    CONSTRAINT chk_invoice_due_date CHECK (due_date >= issue_date),
    CONSTRAINT chk_invoice_recurrence_frequency
        CHECK (recurrence_frequency IN ('daily', 'weekly', 'monthly'))
);

CREATE INDEX idx_invoices_tenant ON invoices(created_by_user_id);
CREATE INDEX idx_invoices_tenant_customer ON invoices(created_by_user_id, customer_id);
CREATE INDEX idx_invoices_bank_account ON invoices(bank_account_id);
";

const INVOICE_SERVICES_SQL: &str = r"
-- Line items; invoice_id NULL marks a reusable template service
CREATE TABLE invoice_services (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by_user_id UUID NOT NULL REFERENCES users(id),
    invoice_id UUID REFERENCES invoices(id) ON DELETE CASCADE,
    service_title VARCHAR(255) NOT NULL,
    service_description TEXT,
    amount NUMERIC(12, 2) NOT NULL,
    sort_order INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoice_service_amount CHECK (amount > 0)
);

CREATE INDEX idx_invoice_services_tenant ON invoice_services(created_by_user_id);
CREATE INDEX idx_invoice_services_invoice ON invoice_services(invoice_id);
";

const TRANSACTIONS_SQL: &str = r"
-- Ledger entries, independent of invoices
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    created_by_user_id UUID NOT NULL REFERENCES users(id),
    type VARCHAR(16) NOT NULL,
    context VARCHAR(16) NOT NULL DEFAULT 'business',
    description VARCHAR(512) NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    currency CHAR(3) NOT NULL DEFAULT 'USD',
    date DATE NOT NULL,
    category_id UUID REFERENCES transaction_categories(id),
    bank_account_id UUID REFERENCES bank_accounts(id),
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transaction_type CHECK (type IN ('income', 'expense')),
    CONSTRAINT chk_transaction_context CHECK (context IN ('business', 'personal')),
    CONSTRAINT chk_transaction_amount CHECK (amount > 0)
);

CREATE INDEX idx_transactions_tenant ON transactions(created_by_user_id);
CREATE INDEX idx_transactions_tenant_type ON transactions(created_by_user_id, type);
CREATE INDEX idx_transactions_tenant_context ON transactions(created_by_user_id, context);
CREATE INDEX idx_transactions_tenant_date ON transactions(created_by_user_id, date);
CREATE INDEX idx_transactions_category ON transactions(category_id);
CREATE INDEX idx_transactions_bank_account ON transactions(bank_account_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS invoice_services CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS transaction_categories CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS user_roles CASCADE;
";
