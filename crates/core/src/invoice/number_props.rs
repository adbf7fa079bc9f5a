//! Property-based tests for the invoice numbering allocator.

use proptest::prelude::*;

use super::number::next_invoice_number;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Feeding an allocator output back in always yields the successor.
    #[test]
    fn prop_sequence_advances_by_one(n in 0u64..10_000_000) {
        let current = next_invoice_number(Some(&format!("INV-{n:06}")));
        let expected = format!("INV-{:06}", n + 1);
        prop_assert_eq!(current, expected);
    }

    /// Serial allocation starting from nothing is gap-free.
    #[test]
    fn prop_serial_allocation_gap_free(count in 1usize..50) {
        let mut latest: Option<String> = None;
        for i in 1..=count {
            let next = next_invoice_number(latest.as_deref());
            prop_assert_eq!(&next, &format!("INV-{i:06}"));
            latest = Some(next);
        }
    }

    /// The output always parses back to a strictly larger counter than any
    /// numeric suffix it was derived from.
    #[test]
    fn prop_output_exceeds_numeric_base(base in 0u64..1_000_000, prefix in "[A-Z]{0,4}-?") {
        let latest = format!("{prefix}{base}");
        let next = next_invoice_number(Some(&latest));
        let suffix: u64 = next.trim_start_matches("INV-").parse().unwrap();
        prop_assert_eq!(suffix, base + 1);
    }

    /// Output shape is always the INV- prefix plus at least six digits.
    #[test]
    fn prop_output_shape(latest in ".*") {
        let next = next_invoice_number(Some(&latest));
        let suffix = next.strip_prefix("INV-").expect("prefix");
        prop_assert!(suffix.len() >= 6);
        prop_assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
    }
}
