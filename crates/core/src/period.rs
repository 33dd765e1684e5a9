//! Calendar month periods.
//!
//! Monthly budgets, adjustments and the month filter all address a month as a
//! `(year, month)` pair.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest year accepted for a budget period.
pub const MIN_YEAR: i32 = 1970;
/// Latest year accepted for a budget period.
pub const MAX_YEAR: i32 = 9999;

/// Invalid year/month input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// Month outside 1..=12 or year outside the supported range.
    #[error("invalid period {year}-{month}: month must be 1-12 and year {MIN_YEAR}-{MAX_YEAR}")]
    OutOfRange {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Text was not in `YYYY-MM` form.
    #[error("invalid period '{0}': expected YYYY-MM")]
    Malformed(String),
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a period, validating the month and year range.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(PeriodError::OutOfRange { year, month });
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1-12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    /// Returns true if `date` falls inside this month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The following month.
    #[must_use]
    pub fn next(self) -> Self {
        self.plus_months(1)
    }

    /// The preceding month.
    #[must_use]
    pub fn previous(self) -> Self {
        self.minus_months(1)
    }

    /// Shifts forward by `n` months.
    #[must_use]
    pub fn plus_months(self, n: u32) -> Self {
        self.first_day()
            .checked_add_months(Months::new(n))
            .map_or(self, Self::from_date)
    }

    /// Shifts backward by `n` months.
    #[must_use]
    pub fn minus_months(self, n: u32) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(n))
            .map_or(self, Self::from_date)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodError::Malformed(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[rstest]
    #[case(2026, 0)]
    #[case(2026, 13)]
    #[case(1969, 5)]
    fn test_rejects_out_of_range(#[case] year: i32, #[case] month: u32) {
        assert_eq!(
            YearMonth::new(year, month),
            Err(PeriodError::OutOfRange { year, month })
        );
    }

    #[rstest]
    #[case("2026-02", 2026, 2)]
    #[case(" 2024-12 ", 2024, 12)]
    fn test_parse(#[case] input: &str, #[case] year: i32, #[case] month: u32) {
        assert_eq!(input.parse::<YearMonth>().unwrap(), ym(year, month));
    }

    #[rstest]
    #[case("2026-2")]
    #[case("26-02")]
    #[case("2026/02")]
    #[case("2026-ab")]
    #[case("")]
    fn test_parse_malformed(#[case] input: &str) {
        assert!(matches!(
            input.parse::<YearMonth>(),
            Err(PeriodError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_valid_shape_bad_month() {
        assert!(matches!(
            "2026-13".parse::<YearMonth>(),
            Err(PeriodError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ym(2026, 3).to_string(), "2026-03");
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(
            ym(2024, 2).last_day(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            ym(2026, 12).last_day(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
        );
        assert_eq!(
            ym(2026, 4).first_day(),
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_navigation_wraps_years() {
        assert_eq!(ym(2026, 12).next(), ym(2027, 1));
        assert_eq!(ym(2026, 1).previous(), ym(2025, 12));
        assert_eq!(ym(2026, 1).minus_months(13), ym(2024, 12));
        assert_eq!(ym(2026, 11).plus_months(3), ym(2027, 2));
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(ym(2025, 12) < ym(2026, 1));
        assert!(ym(2026, 2) > ym(2026, 1));
    }

    #[test]
    fn test_contains() {
        let feb = ym(2026, 2);
        assert!(feb.contains(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()));
        assert!(!feb.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
    }
}
