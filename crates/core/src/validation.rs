//! Input validation shared by the create and update paths.
//!
//! Everything here runs before any persistence is attempted: a request that
//! fails validation never reaches the database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Validation failures surfaced as 422 at the API boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Currency is not a 3-letter alphabetic code.
    #[error("currency must be a 3-letter code")]
    InvalidCurrency,

    /// Monetary amount is zero or negative.
    #[error("amount must be greater than 0")]
    NonPositiveAmount,

    /// Invoice due date precedes its issue date.
    #[error("due_date must be on or after issue_date")]
    DueBeforeIssue,

    /// Invoice has no line items.
    #[error("at least one service is required")]
    NoServices,
}

/// Validates and upper-cases a 3-letter currency code.
pub fn normalize_currency(currency: &str) -> Result<String, ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(currency.to_ascii_uppercase())
    } else {
        Err(ValidationError::InvalidCurrency)
    }
}

/// Requires a strictly positive monetary amount.
pub fn require_positive(amount: Decimal) -> Result<(), ValidationError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveAmount)
    }
}

/// Requires `due_date` to be on or after `issue_date`.
pub fn require_date_order(issue_date: NaiveDate, due_date: NaiveDate) -> Result<(), ValidationError> {
    if due_date >= issue_date {
        Ok(())
    } else {
        Err(ValidationError::DueBeforeIssue)
    }
}

/// Requires a non-empty service list.
pub fn require_services(count: usize) -> Result<(), ValidationError> {
    if count > 0 {
        Ok(())
    } else {
        Err(ValidationError::NoServices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("usd", "USD")]
    #[case("USD", "USD")]
    #[case("eUr", "EUR")]
    fn test_currency_upper_cased(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_currency(input).unwrap(), expected);
    }

    #[rstest]
    #[case("US")]
    #[case("USDX")]
    #[case("U5D")]
    #[case("")]
    #[case("U D")]
    fn test_currency_rejected(#[case] input: &str) {
        assert_eq!(
            normalize_currency(input),
            Err(ValidationError::InvalidCurrency)
        );
    }

    #[test]
    fn test_positive_amounts() {
        assert!(require_positive(dec!(0.01)).is_ok());
        assert_eq!(
            require_positive(Decimal::ZERO),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            require_positive(dec!(-5)),
            Err(ValidationError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_date_order() {
        let issue = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert!(require_date_order(issue, due).is_ok());
        assert!(require_date_order(issue, issue).is_ok());
        assert_eq!(
            require_date_order(due, issue),
            Err(ValidationError::DueBeforeIssue)
        );
    }

    #[test]
    fn test_service_count() {
        assert!(require_services(1).is_ok());
        assert_eq!(require_services(0), Err(ValidationError::NoServices));
    }
}
