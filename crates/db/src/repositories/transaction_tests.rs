use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::{group_balances, summarize};
use crate::entities::{bank_accounts, transactions};

fn mock_transaction(transaction_type: &str, amount: Decimal, bank: Option<Uuid>) -> transactions::Model {
    transactions::Model {
        id: Uuid::new_v4(),
        created_by_user_id: Uuid::new_v4(),
        transaction_type: transaction_type.to_string(),
        context: "business".to_string(),
        description: "test entry".to_string(),
        amount,
        currency: "USD".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        category_id: None,
        bank_account_id: bank,
        notes: None,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn mock_bank_account(id: Uuid, label: &str) -> bank_accounts::Model {
    bank_accounts::Model {
        id,
        created_by_user_id: Uuid::new_v4(),
        label: label.to_string(),
        beneficiary_full_name: "Test Beneficiary".to_string(),
        beneficiary_full_address: None,
        beneficiary_account_number: "0000111122".to_string(),
        swift_code: "TESTUS33".to_string(),
        bank_name: None,
        bank_address: None,
        intermediary_bank_info: None,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

#[test]
fn test_summarize_empty_set_is_zero() {
    let summary = summarize(&[]);
    assert_eq!(summary.total_income, Decimal::ZERO);
    assert_eq!(summary.total_expenses, Decimal::ZERO);
    assert_eq!(summary.net_balance, Decimal::ZERO);
    assert_eq!(summary.transaction_count, 0);
}

#[test]
fn test_summarize_mixed_types() {
    let rows = vec![
        mock_transaction("income", dec!(1000.00), None),
        mock_transaction("income", dec!(250.50), None),
        mock_transaction("expense", dec!(300.25), None),
    ];

    let summary = summarize(&rows);
    assert_eq!(summary.total_income, dec!(1250.50));
    assert_eq!(summary.total_expenses, dec!(300.25));
    assert_eq!(summary.net_balance, dec!(950.25));
    assert_eq!(summary.transaction_count, 3);
}

#[test]
fn test_summarize_expenses_exceed_income() {
    let rows = vec![
        mock_transaction("income", dec!(100.00), None),
        mock_transaction("expense", dec!(400.00), None),
    ];

    let summary = summarize(&rows);
    assert_eq!(summary.net_balance, dec!(-300.00));
}

#[test]
fn test_group_balances_by_account() {
    let checking = Uuid::new_v4();
    let savings = Uuid::new_v4();

    let rows = vec![
        (
            mock_transaction("income", dec!(500.00), Some(checking)),
            mock_bank_account(checking, "Checking"),
        ),
        (
            mock_transaction("expense", dec!(120.00), Some(checking)),
            mock_bank_account(checking, "Checking"),
        ),
        (
            mock_transaction("income", dec!(80.00), Some(savings)),
            mock_bank_account(savings, "Savings"),
        ),
    ];

    let balances = group_balances(&rows);
    assert_eq!(balances.len(), 2);

    // Ordered by label
    assert_eq!(balances[0].bank_account_label, "Checking");
    assert_eq!(balances[0].total_income, dec!(500.00));
    assert_eq!(balances[0].total_expenses, dec!(120.00));
    assert_eq!(balances[0].balance, dec!(380.00));

    assert_eq!(balances[1].bank_account_label, "Savings");
    assert_eq!(balances[1].balance, dec!(80.00));
}

#[test]
fn test_group_balances_empty_input() {
    assert!(group_balances(&[]).is_empty());
}
