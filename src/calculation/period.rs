//! Period resolution and date normalization.
//!
//! Every date the engine compares is a [`NaiveDate`]. Zoned timestamps are
//! reduced to the calendar date they carry in their own offset before they
//! reach proration, so a hire date of `2025-09-01T00:00:00+07:00` is
//! 1 September no matter which zone the period boundaries were built in.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

use crate::error::{EngineError, EngineResult};
use crate::models::PayPeriod;

/// Resolves a `(year, month)` designator into its inclusive date range.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPeriod`] when `year < 1`, when `month` is
/// outside `1..=12`, or when the month lies beyond the supported calendar.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::resolve_period;
/// use chrono::NaiveDate;
///
/// let period = resolve_period(2024, 2).unwrap();
/// assert_eq!(period.start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// assert_eq!(period.end_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
///
/// assert!(resolve_period(2025, 13).is_err());
/// ```
pub fn resolve_period(year: i32, month: u32) -> EngineResult<PayPeriod> {
    let invalid = || EngineError::InvalidPeriod { year, month };

    if year < 1 || !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let start_date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_month_start = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end_date = next_month_start
        .and_then(|date| date.pred_opt())
        .ok_or_else(invalid)?;

    Ok(PayPeriod {
        year,
        month,
        start_date,
        end_date,
    })
}

/// Reduces a zoned timestamp to the calendar date it shows in its own offset.
///
/// ```
/// use payroll_engine::calculation::normalize_date;
/// use chrono::{FixedOffset, NaiveDate, TimeZone};
///
/// let bangkok = FixedOffset::east_opt(7 * 3600).unwrap();
/// let hired = bangkok.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
///
/// assert_eq!(normalize_date(&hired), NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
/// ```
pub fn normalize_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDate {
    timestamp.date_naive()
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] naming `field` when neither format
/// matches.
pub fn parse_calendar_date(field: &str, value: &str) -> EngineResult<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(normalize_date(&timestamp));
    }

    Err(EngineError::validation(
        field,
        format!("invalid date '{value}'; use YYYY-MM-DD or RFC 3339"),
    ))
}

/// Parses a period designator into a validated `(year, month)` pair.
///
/// Accepted forms are `YYYY-M`, `YYYY-MM`, `YYYY-MM-DD` and RFC 3339; the
/// last two select the month containing the date.
///
/// # Errors
///
/// Returns [`EngineError::InvalidPeriodFormat`] when the string matches no
/// form, or [`EngineError::InvalidPeriod`] when it parses to an invalid month.
///
/// ```
/// use payroll_engine::calculation::parse_period;
///
/// assert_eq!(parse_period("2025-1").unwrap(), (2025, 1));
/// assert_eq!(parse_period("2025-10-31").unwrap(), (2025, 10));
/// assert!(parse_period("October").is_err());
/// ```
pub fn parse_period(value: &str) -> EngineResult<(i32, u32)> {
    let trimmed = value.trim();

    let (year, month) = if let Ok(date) = parse_calendar_date("period", trimmed) {
        (date.year(), date.month())
    } else {
        let format_error = || EngineError::InvalidPeriodFormat {
            value: value.to_string(),
        };
        let (year, month) = trimmed.split_once('-').ok_or_else(format_error)?;
        let year = year.parse::<i32>().map_err(|_| format_error())?;
        let month = month.parse::<u32>().map_err(|_| format_error())?;
        (year, month)
    };

    resolve_period(year, month)?;
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_september_2025() {
        let period = resolve_period(2025, 9).unwrap();
        assert_eq!(period.start_date, date(2025, 9, 1));
        assert_eq!(period.end_date, date(2025, 9, 30));
        assert_eq!(period.total_days(), 30);
    }

    #[test]
    fn test_resolve_december_rolls_year() {
        let period = resolve_period(2025, 12).unwrap();
        assert_eq!(period.end_date, date(2025, 12, 31));
        assert_eq!(period.total_days(), 31);
    }

    #[test]
    fn test_resolve_leap_february() {
        assert_eq!(resolve_period(2024, 2).unwrap().total_days(), 29);
        assert_eq!(resolve_period(2025, 2).unwrap().total_days(), 28);
        assert_eq!(resolve_period(1900, 2).unwrap().total_days(), 28);
        assert_eq!(resolve_period(2000, 2).unwrap().total_days(), 29);
    }

    #[test]
    fn test_resolve_rejects_month_thirteen() {
        match resolve_period(2025, 13) {
            Err(EngineError::InvalidPeriod { year, month }) => {
                assert_eq!(year, 2025);
                assert_eq!(month, 13);
            }
            other => panic!("Expected InvalidPeriod error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_month_zero_and_year_zero() {
        assert!(resolve_period(2025, 0).is_err());
        assert!(resolve_period(0, 1).is_err());
        assert!(resolve_period(-5, 1).is_err());
    }

    #[test]
    fn test_resolve_year_one_is_valid() {
        let period = resolve_period(1, 1).unwrap();
        assert_eq!(period.start_date, date(1, 1, 1));
        assert_eq!(period.total_days(), 31);
    }

    #[test]
    fn test_normalize_keeps_local_calendar_date() {
        let bangkok = FixedOffset::east_opt(7 * 3600).unwrap();
        let early_morning = bangkok.with_ymd_and_hms(2025, 9, 1, 0, 30, 0).unwrap();

        // 2025-08-31T17:30:00Z in UTC, but still 1 September locally
        assert_eq!(early_morning.with_timezone(&Utc).day(), 31);
        assert_eq!(normalize_date(&early_morning), date(2025, 9, 1));
    }

    #[test]
    fn test_parse_calendar_date_accepts_both_formats() {
        assert_eq!(
            parse_calendar_date("hired_on", "2024-01-15").unwrap(),
            date(2024, 1, 15)
        );
        assert_eq!(
            parse_calendar_date("hired_on", "2025-09-15T00:00:00+07:00").unwrap(),
            date(2025, 9, 15)
        );
    }

    #[test]
    fn test_parse_calendar_date_names_field_on_error() {
        match parse_calendar_date("hired_on", "15/01/2024") {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "hired_on"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_period_forms() {
        assert_eq!(parse_period("2025-10").unwrap(), (2025, 10));
        assert_eq!(parse_period("2025-1").unwrap(), (2025, 1));
        assert_eq!(parse_period(" 2025-10-31 ").unwrap(), (2025, 10));
        assert_eq!(parse_period("2025-10-31T23:00:00-05:00").unwrap(), (2025, 10));
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        assert!(matches!(
            parse_period("2025/10"),
            Err(EngineError::InvalidPeriodFormat { .. })
        ));
        assert!(matches!(
            parse_period("2025-x"),
            Err(EngineError::InvalidPeriodFormat { .. })
        ));
    }

    #[test]
    fn test_parse_period_rejects_out_of_range_month() {
        assert!(matches!(
            parse_period("2025-13"),
            Err(EngineError::InvalidPeriod { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_total_days_matches_calendar(year in 1i32..=9999, month in 1u32..=12) {
            let period = resolve_period(year, month).unwrap();
            let total = period.total_days();

            prop_assert!((28..=31).contains(&total));
            prop_assert_eq!(period.start_date.day(), 1);
            prop_assert_eq!(period.end_date.month(), month);
            prop_assert_eq!(period.end_date.succ_opt().unwrap().day(), 1);
            prop_assert_eq!(total, period.end_date.day());
        }

        #[test]
        fn prop_normalization_is_zone_invariant(
            year in 1970i32..=2100,
            month in 1u32..=12,
            day in 1u32..=28,
            offset_hours in -12i32..=14,
        ) {
            let zone = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let local_midnight = zone.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap();
            prop_assert_eq!(normalize_date(&local_midnight), date(year, month, day));
        }
    }
}
