//! Reporting period type.
//!
//! Every generation run is scoped to a calendar month. The CLI and HTTP layers accept it as
//! `YYYY-MM`; file names carry the compact `YYYYMM` form.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local};
use thiserror::Error;

/// Errors produced when parsing a reporting month.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthParseError {
    /// Input is not `YYYY-MM`.
    #[error("invalid month '{0}', expected YYYY-MM")]
    Invalid(String),

    /// Input is not `YYYYMM`.
    #[error("invalid compact month '{0}', expected YYYYMM")]
    InvalidCompact(String),

    /// Month component outside 1..=12.
    #[error("month {0} out of range")]
    OutOfRange(u32),
}

/// A calendar month used as a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

impl ReportMonth {
    /// Creates a month, rejecting month numbers outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::OutOfRange(month));
        }
        Ok(Self { year, month })
    }

    /// The month containing the given date.
    #[must_use]
    pub fn of(date: &impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in local time.
    #[must_use]
    pub fn current() -> Self {
        Self::of(&Local::now())
    }

    /// Parses `YYYY-MM`.
    pub fn parse(input: &str) -> Result<Self, MonthParseError> {
        let invalid = || MonthParseError::Invalid(input.to_string());
        let (year, month) = input.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = parse_digits(year).ok_or_else(invalid)?;
        let month = parse_digits(month).ok_or_else(invalid)?;
        Self::new(i32::try_from(year).map_err(|_| invalid())?, month)
    }

    /// Parses the compact `YYYYMM` form used in generated file names.
    pub fn parse_compact(input: &str) -> Result<Self, MonthParseError> {
        let invalid = || MonthParseError::InvalidCompact(input.to_string());
        if input.len() != 6 || !input.is_ascii() {
            return Err(invalid());
        }
        let (year, month) = input.split_at(4);
        let year = parse_digits(year).ok_or_else(invalid)?;
        let month = parse_digits(month).ok_or_else(invalid)?;
        Self::new(i32::try_from(year).map_err(|_| invalid())?, month)
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1..=12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Steps back `offset` months.
    #[must_use]
    pub fn minus_months(self, offset: u32) -> Self {
        let index = i64::from(self.year) * 12 + i64::from(self.month) - 1 - i64::from(offset);
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) + 1;
        Self {
            year: i32::try_from(year).unwrap_or(i32::MIN),
            month: u32::try_from(month).unwrap_or(1),
        }
    }

    /// `YYYYMM`.
    #[must_use]
    pub fn compact(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Zero-padded month, as used for the per-month save directory.
    #[must_use]
    pub fn month_dir(self) -> String {
        format!("{:02}", self.month)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportMonth {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
