//! Normalized 365-slot calendar.
//!
//! Measurements from different years are pooled by day-of-year. Every year is
//! mapped onto the same 365 slots; in leap years the last day (offset 365)
//! is folded onto slot 364, so Feb 29 onwards shares slots with the following
//! day of a common year.

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::{DAYS_PER_YEAR, TesError};

/// Non-leap year used to turn a slot back into a month and day.
const REFERENCE_YEAR: i32 = 2019;

/// Length of a `yymmdd` date token.
pub const DATE_TOKEN_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Day-of-year conversions
// ---------------------------------------------------------------------------

/// Days since Jan 1 of `year`, clipped to the 365-slot calendar.
pub fn date_to_day_of_year(year: i32, month: u32, day: u32) -> Result<usize, TesError> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| TesError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day)))?;
    let offset = date.ordinal0() as usize;
    Ok(offset.min(DAYS_PER_YEAR - 1))
}

/// Month (1-12) and day of month for a slot, read off the reference year.
pub fn day_of_year_to_date(day: usize) -> Result<(u32, u32), TesError> {
    if day >= DAYS_PER_YEAR {
        return Err(TesError::InvalidDate(format!("day-of-year {} out of range", day)));
    }
    let jan_first = NaiveDate::from_ymd_opt(REFERENCE_YEAR, 1, 1)
        .ok_or_else(|| TesError::InvalidDate("reference year".to_string()))?;
    let date = jan_first + Duration::days(day as i64);
    Ok((date.month(), date.day()))
}

/// Zero-based month (0-11) of a slot.
pub fn month_of(day: usize) -> Result<usize, TesError> {
    let (month, _) = day_of_year_to_date(day)?;
    Ok(month as usize - 1)
}

/// Month index for every slot, in slot order. Built once per reduction.
pub fn month_table() -> Vec<usize> {
    (0..DAYS_PER_YEAR)
        .map(|day| month_of(day).unwrap_or(11))
        .collect()
}

// ---------------------------------------------------------------------------
// Date tokens
// ---------------------------------------------------------------------------

/// Parses a `yymmdd` token into (year, month, day). Years are 20yy.
pub fn parse_date_token(token: &str) -> Result<(i32, u32, u32), TesError> {
    if token.len() != DATE_TOKEN_LEN || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(TesError::InvalidDate(format!(
            "date token '{}' is not yymmdd",
            token
        )));
    }
    let field = |range: std::ops::Range<usize>| -> u32 {
        token[range].parse().unwrap_or(0)
    };
    let year = 2000 + field(0..2) as i32;
    let month = field(2..4);
    let day = field(4..6);

    // Reject impossible dates here rather than at slot conversion time.
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| TesError::InvalidDate(format!("date token '{}' is not a real date", token)))?;
    Ok((year, month, day))
}

/// Slot of a `yymmdd` token.
pub fn token_to_day_of_year(token: &str) -> Result<usize, TesError> {
    let (year, month, day) = parse_date_token(token)?;
    date_to_day_of_year(year, month, day)
}

// ---------------------------------------------------------------------------
// Table labels
// ---------------------------------------------------------------------------

/// Column label for a slot: `MM-DD`.
pub fn mm_dd_label(day: usize) -> Result<String, TesError> {
    let (month, day_of_month) = day_of_year_to_date(day)?;
    Ok(format!("{:02}-{:02}", month, day_of_month))
}

/// Row label for a minute offset from the start hour: `HH:MM`.
pub fn hh_mm_label(start_hour: u32, minute: usize) -> String {
    let hour = start_hour as usize + minute / 60;
    format!("{:02}:{:02}", hour, minute % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jan_first_is_slot_zero() {
        assert_eq!(date_to_day_of_year(2017, 1, 1).unwrap(), 0);
        assert_eq!(date_to_day_of_year(2016, 1, 1).unwrap(), 0);
    }

    #[test]
    fn test_dec_31_common_year_is_last_slot() {
        assert_eq!(date_to_day_of_year(2017, 12, 31).unwrap(), 364);
    }

    #[test]
    fn test_dec_31_leap_year_collapses_to_last_slot() {
        // Offset 365 does not exist in the shared calendar.
        assert_eq!(date_to_day_of_year(2016, 12, 31).unwrap(), 364);
        assert_eq!(date_to_day_of_year(2016, 12, 30).unwrap(), 364);
    }

    #[test]
    fn test_leap_day_shifts_following_dates() {
        assert_eq!(date_to_day_of_year(2016, 2, 29).unwrap(), 59);
        assert_eq!(date_to_day_of_year(2016, 3, 1).unwrap(), 60);
        assert_eq!(date_to_day_of_year(2017, 3, 1).unwrap(), 59);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        assert!(date_to_day_of_year(2017, 2, 29).is_err());
        assert!(date_to_day_of_year(2017, 13, 1).is_err());
    }

    #[test]
    fn test_day_of_year_to_date_uses_common_year() {
        assert_eq!(day_of_year_to_date(0).unwrap(), (1, 1));
        assert_eq!(day_of_year_to_date(59).unwrap(), (3, 1));
        assert_eq!(day_of_year_to_date(364).unwrap(), (12, 31));
        assert!(day_of_year_to_date(365).is_err());
    }

    #[test]
    fn test_month_of_boundaries() {
        assert_eq!(month_of(0).unwrap(), 0);
        assert_eq!(month_of(30).unwrap(), 0);
        assert_eq!(month_of(31).unwrap(), 1);
        assert_eq!(month_of(364).unwrap(), 11);
    }

    #[test]
    fn test_month_table_covers_every_slot() {
        let table = month_table();
        assert_eq!(table.len(), DAYS_PER_YEAR);
        assert_eq!(table.iter().filter(|&&m| m == 1).count(), 28, "February has 28 slots");
    }

    #[test]
    fn test_parse_date_token() {
        assert_eq!(parse_date_token("170312").unwrap(), (2017, 3, 12));
        assert_eq!(token_to_day_of_year("160101").unwrap(), 0);
        assert!(parse_date_token("17031").is_err());
        assert!(parse_date_token("17a312").is_err());
        assert!(parse_date_token("170230").is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(mm_dd_label(0).unwrap(), "01-01");
        assert_eq!(mm_dd_label(364).unwrap(), "12-31");
        assert_eq!(hh_mm_label(7, 0), "07:00");
        assert_eq!(hh_mm_label(7, 61), "08:01");
        assert_eq!(hh_mm_label(7, 659), "17:59");
    }
}
