//! Invoice domain rules: numbering, status, recurrence, totals.

pub mod number;
pub mod recurrence;
pub mod status;

#[cfg(test)]
mod number_props;

pub use number::next_invoice_number;
pub use recurrence::{Recurrence, RecurrenceError, RecurrenceFrequency};
pub use status::InvoiceStatus;

use rust_decimal::Decimal;

/// Computes an invoice's total from its line-item amounts.
///
/// The total is always recomputed from the full service set, never
/// maintained incrementally.
#[must_use]
pub fn invoice_total(amounts: &[Decimal]) -> Decimal {
    amounts.iter().copied().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_total_sums_amounts() {
        let total = invoice_total(&[dec!(5000.00), dec!(120.50), dec!(0.01)]);
        assert_eq!(total, dec!(5120.51));
    }

    #[test]
    fn test_invoice_total_single_service() {
        assert_eq!(invoice_total(&[dec!(5000.00)]), dec!(5000.00));
    }

    #[test]
    fn test_invoice_total_empty_is_zero() {
        assert_eq!(invoice_total(&[]), Decimal::ZERO);
    }
}
