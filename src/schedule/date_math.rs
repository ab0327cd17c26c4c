//! Day counting from the anchor date.
//!
//! This module provides the "day N together" computation shared by every
//! message template: parsing the configured anchor date and turning the
//! (anchor, today) pair into an elapsed-day count.

use chrono::NaiveDate;

use crate::config::ConfigError;

/// Parses the anchor date from its `YYYY-MM-DD` configuration string.
///
/// The anchor date marks day 1 of the relationship. It carries no timezone:
/// it is interpreted in the same zone the evaluation instant is normalized to.
///
/// # Arguments
///
/// * `input` - The raw configuration value, e.g. `"2022-12-06"`
///
/// # Returns
///
/// The parsed date, or a [`ConfigError`] if the input is not a valid
/// Gregorian calendar date in `YYYY-MM-DD` form. Out-of-range months and
/// days (`2022-13-01`, `2023-02-30`) are rejected the same way as
/// non-numeric input.
///
/// # Examples
///
/// ```
/// # use keepsake::schedule::parse_anchor;
/// let anchor = parse_anchor("2022-12-06").unwrap();
/// assert!(parse_anchor("06/12/2022").is_err());
/// ```
pub fn parse_anchor(input: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        ConfigError::Invalid(format!(
            "anchor_date must be a valid YYYY-MM-DD date, got {input:?}"
        ))
    })
}

/// Computes the day count of the relationship, where the anchor date itself
/// counts as day 1.
///
/// This is a deliberate off-by-one: the difference in calendar days plus one,
/// so evaluating on the anchor date yields 1, not 0.
///
/// When `today` is before `anchor` the result is zero or negative. Callers
/// must not assume positivity; an anchor in the future is reported as-is
/// rather than rejected.
///
/// # Arguments
///
/// * `anchor` - The date counted as day 1
/// * `today` - The calendar date of the evaluation instant
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use keepsake::schedule::days_together;
/// let anchor = NaiveDate::from_ymd_opt(2022, 12, 6).unwrap();
/// assert_eq!(days_together(anchor, anchor), 1);
/// ```
pub fn days_together(anchor: NaiveDate, today: NaiveDate) -> i64 {
    (today - anchor).num_days() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_anchor_date_is_day_one() {
        let anchor = date(2022, 12, 6);
        assert_eq!(days_together(anchor, anchor), 1);
    }

    #[test]
    fn test_next_day_is_day_two() {
        assert_eq!(days_together(date(2022, 12, 6), date(2022, 12, 7)), 2);
    }

    #[test]
    fn test_first_anniversary_is_day_366() {
        // 2022-12-06 to 2023-12-06 spans 365 calendar days and no Feb 29.
        assert_eq!(days_together(date(2022, 12, 6), date(2023, 12, 6)), 366);
    }

    #[test]
    fn test_count_spans_leap_day() {
        // 2024 is a leap year, so the range gains one extra day.
        assert_eq!(days_together(date(2023, 12, 6), date(2024, 12, 6)), 367);
    }

    #[test]
    fn test_future_anchor_is_not_rejected() {
        // One day before the anchor is day 0, two days before is day -1.
        assert_eq!(days_together(date(2022, 12, 6), date(2022, 12, 5)), 0);
        assert_eq!(days_together(date(2022, 12, 6), date(2022, 12, 4)), -1);
    }

    #[test]
    fn test_parse_anchor_valid() {
        assert_eq!(parse_anchor("2022-12-06").unwrap(), date(2022, 12, 6));
    }

    #[test]
    fn test_parse_anchor_trims_whitespace() {
        assert_eq!(parse_anchor(" 2022-12-06 ").unwrap(), date(2022, 12, 6));
    }

    #[test]
    fn test_parse_anchor_rejects_garbage() {
        assert!(parse_anchor("not-a-date").is_err());
        assert!(parse_anchor("").is_err());
        assert!(parse_anchor("06/12/2022").is_err());
    }

    #[test]
    fn test_parse_anchor_rejects_out_of_range() {
        assert!(parse_anchor("2022-13-01").is_err());
        assert!(parse_anchor("2023-02-30").is_err());
        // Feb 29 only exists in leap years.
        assert!(parse_anchor("2023-02-29").is_err());
        assert!(parse_anchor("2024-02-29").is_ok());
    }
}
