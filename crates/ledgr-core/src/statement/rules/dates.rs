//! Date parsing for statement rows.
//!
//! Formats are tried in a fixed order: `/` before `-`, four-digit years
//! before two-digit years, and day-first before month-first before
//! year-first within each. An ambiguous string like `05/01/2024` therefore
//! always reads as 5 January.

use chrono::{Local, NaiveDate};

use super::locale::normalize_digits;
use super::patterns::EMBEDDED_DATE;
use crate::error::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOrder {
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
}

#[derive(Debug, Clone, Copy)]
struct DateFormat {
    separator: char,
    year_digits: usize,
    order: FieldOrder,
}

const fn fmt(separator: char, year_digits: usize, order: FieldOrder) -> DateFormat {
    DateFormat {
        separator,
        year_digits,
        order,
    }
}

const DATE_FORMATS: [DateFormat; 12] = [
    fmt('/', 4, FieldOrder::DayMonthYear),
    fmt('/', 4, FieldOrder::MonthDayYear),
    fmt('/', 4, FieldOrder::YearMonthDay),
    fmt('-', 4, FieldOrder::DayMonthYear),
    fmt('-', 4, FieldOrder::MonthDayYear),
    fmt('-', 4, FieldOrder::YearMonthDay),
    fmt('/', 2, FieldOrder::DayMonthYear),
    fmt('/', 2, FieldOrder::MonthDayYear),
    fmt('/', 2, FieldOrder::YearMonthDay),
    fmt('-', 2, FieldOrder::DayMonthYear),
    fmt('-', 2, FieldOrder::MonthDayYear),
    fmt('-', 2, FieldOrder::YearMonthDay),
];

impl DateFormat {
    fn parse(&self, s: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = s.split(self.separator).collect();
        if parts.len() != 3 || parts.iter().any(|p| !is_digits(p)) {
            return None;
        }

        let (y, m, d) = match self.order {
            FieldOrder::DayMonthYear => (parts[2], parts[1], parts[0]),
            FieldOrder::MonthDayYear => (parts[2], parts[0], parts[1]),
            FieldOrder::YearMonthDay => (parts[0], parts[1], parts[2]),
        };
        if m.len() > 2 || d.len() > 2 {
            return None;
        }

        let year = self.year(y)?;
        NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)
    }

    fn year(&self, raw: &str) -> Option<i32> {
        if raw.len() != self.year_digits {
            return None;
        }
        let value: i32 = raw.parse().ok()?;
        Some(match self.year_digits {
            2 => expand_two_digit_year(value),
            _ => value,
        })
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `00..=68` is 2000-2068, `69..=99` is 1969-1999.
fn expand_two_digit_year(yy: i32) -> i32 {
    if yy <= 68 { 2000 + yy } else { 1900 + yy }
}

fn parse_exact(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS.iter().find_map(|format| format.parse(s))
}

/// Parse a raw date string, reporting failure instead of substituting.
///
/// The whole (digit-normalized, trimmed) string is tried first; failing
/// that, the first date-shaped token inside it, so timestamps such as
/// `2024-01-05T10:00:00` still resolve.
pub fn parse_date_outcome(raw: &str) -> Result<NaiveDate, FieldError> {
    let normalized = normalize_digits(raw);
    let s = normalized.trim();

    parse_exact(s)
        .or_else(|| {
            EMBEDDED_DATE
                .find_iter(s)
                .find_map(|m| parse_exact(m.as_str()))
        })
        .ok_or_else(|| FieldError::UnparsedDate {
            raw: raw.to_string(),
        })
}

/// Parse a raw date, substituting `fallback` when nothing matches.
pub fn parse_date_or(raw: &str, fallback: NaiveDate) -> NaiveDate {
    parse_date_outcome(raw).unwrap_or(fallback)
}

/// Parse a raw date, substituting today's local date when nothing matches.
pub fn parse_date(raw: &str) -> NaiveDate {
    parse_date_or(raw, Local::now().date_naive())
}
