//! Sequential invoice number allocation.
//!
//! Numbers look like `INV-000001`: a fixed prefix plus a six-digit,
//! zero-padded counter that grows past six digits without truncation. The
//! counter continues from the trailing digit run of the tenant's
//! lexicographically largest existing number, so manually entered numbers
//! with a numeric suffix (`2024-77`) also advance the sequence.

/// Renders the next invoice number after `latest`.
///
/// `latest` is the current maximum `invoice_number` for the tenant, or
/// `None` when the tenant has no invoices yet. A latest value with no
/// trailing digits contributes a numeric base of zero, so the sequence
/// restarts at `INV-000001`.
#[must_use]
pub fn next_invoice_number(latest: Option<&str>) -> String {
    let base = latest.map_or(0, trailing_number);
    format!("INV-{:06}", base + 1)
}

/// Extracts the trailing contiguous digit run of `s` as a number.
///
/// Returns 0 when `s` does not end in a digit. A run too long to fit in a
/// `u64` also yields 0 rather than failing the allocation.
fn trailing_number(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    s[start..].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number() {
        assert_eq!(next_invoice_number(None), "INV-000001");
    }

    #[test]
    fn test_increments_standard_number() {
        assert_eq!(next_invoice_number(Some("INV-000041")), "INV-000042");
    }

    #[test]
    fn test_carries_over_foreign_suffix() {
        // Only the trailing digit run matters; the prefix is re-rendered.
        assert_eq!(next_invoice_number(Some("2024-77")), "INV-000078");
    }

    #[test]
    fn test_no_trailing_digits_restarts() {
        assert_eq!(next_invoice_number(Some("CUSTOM")), "INV-000001");
    }

    #[test]
    fn test_grows_past_six_digits() {
        assert_eq!(next_invoice_number(Some("INV-999999")), "INV-1000000");
        assert_eq!(next_invoice_number(Some("INV-1000000")), "INV-1000001");
    }

    #[test]
    fn test_trailing_number_extraction() {
        assert_eq!(trailing_number("INV-000007"), 7);
        assert_eq!(trailing_number("abc12def34"), 34);
        assert_eq!(trailing_number("42"), 42);
        assert_eq!(trailing_number(""), 0);
        assert_eq!(trailing_number("INV-"), 0);
        // The run must be at the very end of the string.
        assert_eq!(trailing_number("INV-001X"), 0);
    }

    #[test]
    fn test_oversized_run_falls_back_to_zero() {
        // 25 digits cannot fit in a u64; allocation restarts instead of
        // panicking.
        let oversized = "INV-1111111111111111111111111";
        assert_eq!(next_invoice_number(Some(oversized)), "INV-000001");
    }
}
