//! Date format detection and parsing
//!
//! Date format inference by elimination. When a value like "31/05/2024"
//! is seen, formats where 31 would have to be a month are eliminated.

use chrono::{Datelike, NaiveDate};

use super::constraints::EliminationReason;

/// Order of the year/month/day components in a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOrder {
    YearMonthDay,
    DayMonthYear,
    MonthDayYear,
}

/// Date format specification with component layout
#[derive(Debug, Clone)]
pub struct DateFormatSpec {
    /// strftime pattern
    pub pattern: &'static str,
    /// Example value
    pub example: &'static str,
    /// Component order
    pub order: ComponentOrder,
    /// Separator character
    pub separator: char,
    /// Number of year digits (2 or 4)
    pub year_digits: u8,
}

const fn spec(
    pattern: &'static str,
    example: &'static str,
    order: ComponentOrder,
    separator: char,
    year_digits: u8,
) -> DateFormatSpec {
    DateFormatSpec {
        pattern,
        example,
        order,
        separator,
        year_digits,
    }
}

use ComponentOrder::{DayMonthYear, MonthDayYear, YearMonthDay};

/// Common numeric date formats to try (ordered by popularity)
pub const DATE_FORMATS: &[DateFormatSpec] = &[
    // ISO formats
    spec("%Y-%m-%d", "2024-05-31", YearMonthDay, '-', 4),
    spec("%Y/%m/%d", "2024/05/31", YearMonthDay, '/', 4),
    // European formats (DD/MM/YYYY)
    spec("%d/%m/%Y", "31/05/2024", DayMonthYear, '/', 4),
    spec("%d-%m-%Y", "31-05-2024", DayMonthYear, '-', 4),
    spec("%d.%m.%Y", "31.05.2024", DayMonthYear, '.', 4),
    // US formats (MM/DD/YYYY)
    spec("%m/%d/%Y", "05/31/2024", MonthDayYear, '/', 4),
    spec("%m-%d-%Y", "05-31-2024", MonthDayYear, '-', 4),
    // Short year formats
    spec("%d/%m/%y", "31/05/24", DayMonthYear, '/', 2),
    spec("%m/%d/%y", "05/31/24", MonthDayYear, '/', 2),
    spec("%y/%m/%d", "24/05/31", YearMonthDay, '/', 2),
];

/// A parsed date with its components
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDate {
    /// Year (full year)
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Day (1-31)
    pub day: u32,
    /// The format that was used to parse
    pub format: &'static str,
}

impl ParsedDate {
    /// Convert to NaiveDate
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// Try a value against one format.
///
/// Returns the parsed date, or the reason this format cannot describe the
/// value. Component checks run before chrono so the reason is specific
/// ("month value 31 is invalid") rather than a bare parse failure.
pub fn check_date_value(
    value: &str,
    format: &'static DateFormatSpec,
) -> Result<ParsedDate, EliminationReason> {
    let trimmed = value.trim();

    let parts: Vec<&str> = trimmed.split(format.separator).collect();
    if parts.len() != 3 {
        return Err(EliminationReason::PatternMismatch {
            value: value.to_string(),
            expected: format.example,
        });
    }

    let (year_raw, month_raw, day_raw) = match format.order {
        YearMonthDay => (parts[0], parts[1], parts[2]),
        DayMonthYear => (parts[2], parts[1], parts[0]),
        MonthDayYear => (parts[2], parts[0], parts[1]),
    };

    if year_raw.len() != format.year_digits as usize
        || !year_raw.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(EliminationReason::PatternMismatch {
            value: value.to_string(),
            expected: format.example,
        });
    }

    let (Ok(month), Ok(day)) = (month_raw.parse::<i32>(), day_raw.parse::<i32>()) else {
        return Err(EliminationReason::PatternMismatch {
            value: value.to_string(),
            expected: format.example,
        });
    };

    if !can_be_month(month) {
        return Err(EliminationReason::DateComponentInvalid {
            value: value.to_string(),
            component: "month",
            actual: month,
        });
    }
    if !can_be_day(day) {
        return Err(EliminationReason::DateComponentInvalid {
            value: value.to_string(),
            component: "day",
            actual: day,
        });
    }

    match NaiveDate::parse_from_str(trimmed, format.pattern) {
        Ok(date) => Ok(ParsedDate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            format: format.pattern,
        }),
        // Day exceeds the month length (e.g. 30/02/2024)
        Err(_) => Err(EliminationReason::DateComponentInvalid {
            value: value.to_string(),
            component: "day",
            actual: day,
        }),
    }
}

/// Parse with the first format in [`DATE_FORMATS`] that accepts the value.
pub fn parse_any_date(value: &str) -> Option<ParsedDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| check_date_value(value, format).ok())
}

/// Check if a component value can be a month (1-12)
pub fn can_be_month(value: i32) -> bool {
    (1..=12).contains(&value)
}

/// Check if a component value can be a day (1-31)
pub fn can_be_day(value: i32) -> bool {
    (1..=31).contains(&value)
}
