//! Recurrence scheduling intent on invoices.
//!
//! Recurrence is stored intent only: no executor inside Faktura ever issues
//! a recurring invoice. The rules still have to hold so a future scheduler
//! can trust the data.

use thiserror::Error;

/// How often a recurring invoice repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceFrequency {
    /// Every day; no day-of-period applies.
    Daily,
    /// Every week on a fixed weekday (0 = Monday .. 6 = Sunday).
    Weekly,
    /// Every month on a fixed day of month (1..=31).
    Monthly,
}

impl RecurrenceFrequency {
    /// Returns the storage string for this frequency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a storage string back into a frequency.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Validation failures for recurrence input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    /// `is_recurrent` is true but no frequency was supplied.
    #[error("recurrence_frequency is required when is_recurrent is true")]
    MissingFrequency,

    /// Weekly/monthly recurrence needs a day of period.
    #[error("recurrence_day is required for {0} recurrence")]
    MissingDay(&'static str),

    /// Weekly day outside [0,6].
    #[error("recurrence_day must be between 0 (Monday) and 6 (Sunday) for weekly recurrence")]
    WeeklyDayOutOfRange,

    /// Monthly day outside [1,31].
    #[error("recurrence_day must be between 1 and 31 for monthly recurrence")]
    MonthlyDayOutOfRange,

    /// Unknown frequency string.
    #[error("recurrence_frequency must be one of daily, weekly, monthly")]
    UnknownFrequency,
}

/// Normalized recurrence state as it is stored on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recurrence {
    /// Whether the invoice recurs at all.
    pub is_recurrent: bool,
    /// Frequency; always present when `is_recurrent`, always absent otherwise.
    pub frequency: Option<RecurrenceFrequency>,
    /// Day of period; see [`RecurrenceFrequency`] for the ranges.
    pub day: Option<i32>,
}

impl Recurrence {
    /// Validates and normalizes recurrence input.
    ///
    /// - `is_recurrent = false` forces frequency and day to null regardless
    ///   of what was supplied.
    /// - `daily` forces the day to null.
    /// - `weekly` requires a day in [0,6]; `monthly` a day in [1,31].
    pub fn validate(
        is_recurrent: bool,
        frequency: Option<RecurrenceFrequency>,
        day: Option<i32>,
    ) -> Result<Self, RecurrenceError> {
        if !is_recurrent {
            return Ok(Self::default());
        }

        let frequency = frequency.ok_or(RecurrenceError::MissingFrequency)?;

        let day = match frequency {
            RecurrenceFrequency::Daily => None,
            RecurrenceFrequency::Weekly => {
                let day = day.ok_or(RecurrenceError::MissingDay("weekly"))?;
                if !(0..=6).contains(&day) {
                    return Err(RecurrenceError::WeeklyDayOutOfRange);
                }
                Some(day)
            }
            RecurrenceFrequency::Monthly => {
                let day = day.ok_or(RecurrenceError::MissingDay("monthly"))?;
                if !(1..=31).contains(&day) {
                    return Err(RecurrenceError::MonthlyDayOutOfRange);
                }
                Some(day)
            }
        };

        Ok(Self {
            is_recurrent: true,
            frequency: Some(frequency),
            day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_not_recurrent_forces_nulls() {
        let r = Recurrence::validate(false, Some(RecurrenceFrequency::Weekly), Some(3)).unwrap();
        assert_eq!(r, Recurrence::default());
        assert!(!r.is_recurrent);
        assert!(r.frequency.is_none());
        assert!(r.day.is_none());
    }

    #[test]
    fn test_recurrent_requires_frequency() {
        let err = Recurrence::validate(true, None, Some(2)).unwrap_err();
        assert_eq!(err, RecurrenceError::MissingFrequency);
    }

    #[test]
    fn test_daily_forces_day_null() {
        let r = Recurrence::validate(true, Some(RecurrenceFrequency::Daily), Some(15)).unwrap();
        assert!(r.is_recurrent);
        assert_eq!(r.frequency, Some(RecurrenceFrequency::Daily));
        assert!(r.day.is_none());
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(6)]
    fn test_weekly_valid_days(#[case] day: i32) {
        let r = Recurrence::validate(true, Some(RecurrenceFrequency::Weekly), Some(day)).unwrap();
        assert_eq!(r.day, Some(day));
    }

    #[rstest]
    #[case(-1)]
    #[case(7)]
    #[case(9)]
    fn test_weekly_day_out_of_range(#[case] day: i32) {
        let err =
            Recurrence::validate(true, Some(RecurrenceFrequency::Weekly), Some(day)).unwrap_err();
        assert_eq!(err, RecurrenceError::WeeklyDayOutOfRange);
    }

    #[rstest]
    #[case(1)]
    #[case(28)]
    #[case(31)]
    fn test_monthly_valid_days(#[case] day: i32) {
        let r = Recurrence::validate(true, Some(RecurrenceFrequency::Monthly), Some(day)).unwrap();
        assert_eq!(r.day, Some(day));
    }

    #[rstest]
    #[case(0)]
    #[case(32)]
    fn test_monthly_day_out_of_range(#[case] day: i32) {
        let err =
            Recurrence::validate(true, Some(RecurrenceFrequency::Monthly), Some(day)).unwrap_err();
        assert_eq!(err, RecurrenceError::MonthlyDayOutOfRange);
    }

    #[rstest]
    #[case(RecurrenceFrequency::Weekly, RecurrenceError::MissingDay("weekly"))]
    #[case(RecurrenceFrequency::Monthly, RecurrenceError::MissingDay("monthly"))]
    fn test_missing_day(#[case] freq: RecurrenceFrequency, #[case] expected: RecurrenceError) {
        let err = Recurrence::validate(true, Some(freq), None).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_frequency_codec() {
        for (s, f) in [
            ("daily", RecurrenceFrequency::Daily),
            ("weekly", RecurrenceFrequency::Weekly),
            ("monthly", RecurrenceFrequency::Monthly),
        ] {
            assert_eq!(RecurrenceFrequency::parse(s), Some(f));
            assert_eq!(f.as_str(), s);
        }
        assert_eq!(RecurrenceFrequency::parse("yearly"), None);
    }
}
