//! Temporal extent of date/time columns
//!
//! A permissive timestamp parser plus the `earliest/latest` summary built
//! on top of it. The parser accepts:
//!
//! - bare years (`1997` → `1997-01-01T00:00:00`)
//! - RFC 3339 and RFC 2822 timestamps
//! - ISO-like `date time` values with a numeric offset or a named zone
//!   abbreviation looked up in a caller-supplied table
//! - weekday-prefixed values (`Tuesday, 2016-03-01`, `Tue 01 Mar 2016`)
//! - the numeric day/month/year layouts of [`DATE_FORMATS`] and month names
//!
//! Values without zone information are *naive*, values with one are
//! *aware*. The two kinds cannot be ordered against each other, so a column
//! mixing them is a type mismatch rather than being silently normalized.
//!
//! [`DATE_FORMATS`]: crate::type_inference::DATE_FORMATS

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::type_inference::date_formats::parse_any_date;
use crate::type_inference::solver::{is_null_value, TIME_FORMATS};

/// Zone abbreviations understood by default, as seconds east of UTC.
pub const DEFAULT_TZ_ABBREVIATIONS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("GMT", 0),
    ("Z", 0),
    ("WET", 0),
    ("BST", 3600),
    ("IST", 19800),
    ("CET", 3600),
    ("CEST", 7200),
    ("EET", 7200),
    ("EEST", 10800),
    ("MSK", 10800),
    ("EST", -18000),
    ("EDT", -14400),
    ("CST", -21600),
    ("CDT", -18000),
    ("MST", -25200),
    ("MDT", -21600),
    ("PST", -28800),
    ("PDT", -25200),
    ("AKST", -32400),
    ("AKDT", -28800),
    ("HST", -36000),
    ("JST", 32400),
    ("KST", 32400),
    ("AEST", 36000),
    ("AEDT", 39600),
    ("NZST", 43200),
    ("NZDT", 46800),
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%B %d %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%d %H:%M %z",
];

const NAMED_MONTH_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%d %B, %Y"];

static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid regex"));

static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("valid regex"));

static WEEKDAY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)(day|nesday|urday|sday)?\.?,?\s+")
        .expect("valid regex")
});

static TRAILING_ZONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s+\(?([A-Za-z]{1,5})\)?$").expect("valid regex"));

/// Errors from timestamp parsing and temporal extent computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemporalError {
    #[error("could not parse '{0}' as a timestamp")]
    Unparseable(String),

    #[error(
        "type mismatch: cannot compare timezone-naive '{naive}' with timezone-aware '{aware}'"
    )]
    TypeMismatch { naive: String, aware: String },
}

/// A parsed point in time, with or without zone information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl Timestamp {
    pub fn is_aware(&self) -> bool {
        matches!(self, Timestamp::Aware(_))
    }

    /// ISO 8601 rendering; fractional seconds only when present.
    pub fn to_iso8601(&self) -> String {
        match self {
            Timestamp::Naive(ts) => format_naive(ts),
            Timestamp::Aware(ts) => {
                format!("{}{}", format_naive(&ts.naive_local()), ts.format("%:z"))
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn format_naive(ts: &NaiveDateTime) -> String {
    let base = ts.format("%Y-%m-%dT%H:%M:%S").to_string();
    let micros = ts.nanosecond() / 1_000;
    if micros == 0 {
        base
    } else {
        format!("{}.{:06}", base, micros)
    }
}

/// Permissive timestamp parser with a configurable zone abbreviation table.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    tzinfos: HashMap<String, i32>,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::with_abbreviations(DEFAULT_TZ_ABBREVIATIONS.iter().copied())
    }
}

impl TimestampParser {
    /// Build a parser from `(abbreviation, seconds east of UTC)` pairs.
    /// Abbreviations are matched case-insensitively.
    pub fn with_abbreviations<'a>(table: impl IntoIterator<Item = (&'a str, i32)>) -> Self {
        Self {
            tzinfos: table
                .into_iter()
                .map(|(name, offset)| (name.to_ascii_uppercase(), offset))
                .collect(),
        }
    }

    pub fn parse(&self, value: &str) -> Result<Timestamp, TemporalError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TemporalError::Unparseable(value.to_string()));
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Timestamp::Aware(ts));
        }
        if let Ok(ts) = DateTime::parse_from_rfc2822(trimmed) {
            return Ok(Timestamp::Aware(ts));
        }

        let body = WEEKDAY_PREFIX.replace(trimmed, "");
        self.parse_body(&body)
            .ok_or_else(|| TemporalError::Unparseable(value.to_string()))
    }

    fn parse_body(&self, body: &str) -> Option<Timestamp> {
        if BARE_YEAR.is_match(body) {
            let year = body.parse::<i32>().ok()?;
            return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| Timestamp::Naive(midnight(d)));
        }

        if let Some(caps) = YEAR_MONTH.captures(body) {
            let year = caps[1].parse::<i32>().ok()?;
            let month = caps[2].parse::<u32>().ok()?;
            return NaiveDate::from_ymd_opt(year, month, 1).map(|d| Timestamp::Naive(midnight(d)));
        }

        for format in OFFSET_DATETIME_FORMATS {
            if let Ok(ts) = DateTime::parse_from_str(body, format) {
                return Some(Timestamp::Aware(ts));
            }
        }

        if let Some(naive) = parse_naive(body) {
            return Some(Timestamp::Naive(naive));
        }

        // "2016-01-01 10:00 EST": named zone as the last token
        let caps = TRAILING_ZONE.captures(body)?;
        let offset_secs = self.tzinfos.get(&caps[2].to_ascii_uppercase())?;
        let offset = FixedOffset::east_opt(*offset_secs)?;
        let naive = parse_naive(&caps[1])?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(Timestamp::Aware)
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn parse_naive(body: &str) -> Option<NaiveDateTime> {
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(body, format) {
            return Some(ts);
        }
    }

    if let Some(parsed) = parse_any_date(body) {
        return parsed.to_naive_date().map(midnight);
    }

    NAMED_MONTH_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(body, format).ok())
        .map(midnight)
}

/// Parse with the default zone table.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, TemporalError> {
    TimestampParser::default().parse(value)
}

/// `"earliest/latest"` over every non-null value, ISO 8601 on both ends.
///
/// Returns `Ok(None)` when the column holds no values at all. Any value the
/// parser rejects fails the whole computation, as does mixing naive and
/// aware values.
pub fn temporal_extent<'a, I>(parser: &TimestampParser, values: I) -> Result<Option<String>, TemporalError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut bounds: Option<(Timestamp, Timestamp)> = None;

    for value in values {
        if is_null_value(value) {
            continue;
        }
        let ts = parser.parse(value)?;

        bounds = Some(match bounds {
            None => (ts, ts),
            Some((earliest, latest)) => {
                if earliest.is_aware() != ts.is_aware() {
                    let (naive, aware) = if ts.is_aware() {
                        (earliest, ts)
                    } else {
                        (ts, earliest)
                    };
                    return Err(TemporalError::TypeMismatch {
                        naive: naive.to_iso8601(),
                        aware: aware.to_iso8601(),
                    });
                }
                (
                    if before(&ts, &earliest) { ts } else { earliest },
                    if before(&latest, &ts) { ts } else { latest },
                )
            }
        });
    }

    Ok(bounds.map(|(earliest, latest)| {
        format!("{}/{}", earliest.to_iso8601(), latest.to_iso8601())
    }))
}

/// `"earliest/latest"` for a time-of-day column, `HH:MM:SS` on both ends.
///
/// Time-of-day values carry no date, so they are compared on their own
/// rather than through [`TimestampParser`].
pub fn time_extent<'a, I>(values: I) -> Result<Option<String>, TemporalError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut bounds: Option<(NaiveTime, NaiveTime)> = None;

    for value in values {
        if is_null_value(value) {
            continue;
        }
        let time = parse_time_of_day(value)
            .ok_or_else(|| TemporalError::Unparseable(value.to_string()))?;
        bounds = Some(match bounds {
            None => (time, time),
            Some((earliest, latest)) => (earliest.min(time), latest.max(time)),
        });
    }

    Ok(bounds.map(|(earliest, latest)| format!("{}/{}", format_time(&earliest), format_time(&latest))))
}

fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

fn format_time(time: &NaiveTime) -> String {
    let base = time.format("%H:%M:%S").to_string();
    match time.nanosecond() / 1_000 {
        0 => base,
        micros => format!("{}.{:06}", base, micros),
    }
}

/// Both sides are the same kind; callers check first.
fn before(a: &Timestamp, b: &Timestamp) -> bool {
    match (a, b) {
        (Timestamp::Naive(a), Timestamp::Naive(b)) => a < b,
        (Timestamp::Aware(a), Timestamp::Aware(b)) => a < b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(value: &str) -> String {
        parse_timestamp(value).unwrap().to_iso8601()
    }

    #[test]
    fn test_time_extent() {
        let extent = time_extent(["11:45:10", "", "10:30", "23:00:00.5"]).unwrap();
        assert_eq!(extent.as_deref(), Some("10:30:00/23:00:00.500000"));
        assert_eq!(time_extent(["NA", ""]).unwrap(), None);
        assert!(matches!(
            time_extent(["10:30", "later"]),
            Err(TemporalError::Unparseable(_))
        ));
    }

    #[test]
    fn test_bare_years() {
        assert_eq!(iso("1933"), "1933-01-01T00:00:00");
        assert!(!parse_timestamp("1933").unwrap().is_aware());
    }

    #[test]
    fn test_iso_forms() {
        assert_eq!(iso("2016-03-01"), "2016-03-01T00:00:00");
        assert_eq!(iso("2016-03-01T10:20:30"), "2016-03-01T10:20:30");
        assert_eq!(iso("2016-03-01 10:20"), "2016-03-01T10:20:00");
        assert_eq!(iso("2016-03-01T10:20:30.250"), "2016-03-01T10:20:30.250000");
        assert_eq!(iso("2016-03"), "2016-03-01T00:00:00");
    }

    #[test]
    fn test_offsets_are_kept() {
        assert_eq!(iso("2016-03-01T10:20:30+01:00"), "2016-03-01T10:20:30+01:00");
        assert_eq!(iso("2016-03-01T10:20:30Z"), "2016-03-01T10:20:30+00:00");
        assert_eq!(iso("2016-03-01 10:20:30 -0500"), "2016-03-01T10:20:30-05:00");
    }

    #[test]
    fn test_named_zone_abbreviations() {
        assert_eq!(iso("2016-03-01 10:20 EST"), "2016-03-01T10:20:00-05:00");
        assert_eq!(iso("2016-03-01 10:20:00 cest"), "2016-03-01T10:20:00+02:00");
        assert!(parse_timestamp("2016-03-01 10:20 XYZ").is_err());
    }

    #[test]
    fn test_supplied_zone_table() {
        let parser = TimestampParser::with_abbreviations([("XYZ", 3 * 3600)]);
        let ts = parser.parse("2016-03-01 10:20 XYZ").unwrap();
        assert_eq!(ts.to_iso8601(), "2016-03-01T10:20:00+03:00");
        assert!(parser.parse("2016-03-01 10:20 EST").is_err());
    }

    #[test]
    fn test_weekday_prefixed() {
        assert_eq!(iso("Tuesday, 2016-03-01"), "2016-03-01T00:00:00");
        assert_eq!(iso("Tue 01 March 2016"), "2016-03-01T00:00:00");
        assert_eq!(iso("Tue, 1 Mar 2016 10:00:00 +0200"), "2016-03-01T10:00:00+02:00");
    }

    #[test]
    fn test_named_months_and_numeric_layouts() {
        assert_eq!(iso("March 1, 2016"), "2016-03-01T00:00:00");
        assert_eq!(iso("1 March 2016"), "2016-03-01T00:00:00");
        assert_eq!(iso("31/05/2024"), "2024-05-31T00:00:00");
    }

    #[test]
    fn test_rejects_non_dates() {
        assert!(parse_timestamp("hello").is_err());
        assert!(parse_timestamp("10:30").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("12.5").is_err());
    }

    #[test]
    fn test_extent_of_years() {
        let parser = TimestampParser::default();
        let extent = temporal_extent(&parser, ["1933", "1997", "2016"]).unwrap();
        assert_eq!(extent.as_deref(), Some("1933-01-01T00:00:00/2016-01-01T00:00:00"));
    }

    #[test]
    fn test_extent_skips_nulls_and_orders_values() {
        let parser = TimestampParser::default();
        let extent =
            temporal_extent(&parser, ["2016-05-01", "", "2015-01-01", "2016-01-01"]).unwrap();
        assert_eq!(extent.as_deref(), Some("2015-01-01T00:00:00/2016-05-01T00:00:00"));
        assert_eq!(temporal_extent(&parser, ["", "NA"]).unwrap(), None);
    }

    #[test]
    fn test_extent_of_aware_values_compares_instants() {
        let parser = TimestampParser::default();
        let extent = temporal_extent(
            &parser,
            ["2016-01-01T10:00:00+02:00", "2016-01-01T09:30:00+00:00"],
        )
        .unwrap();
        assert_eq!(
            extent.as_deref(),
            Some("2016-01-01T10:00:00+02:00/2016-01-01T09:30:00+00:00")
        );
    }

    #[test]
    fn test_extent_mixed_timezones_is_type_mismatch() {
        let parser = TimestampParser::default();
        let err = temporal_extent(&parser, ["2016-01-01T10:00:00+01:00", "2016-01-02T10:00:00"])
            .unwrap_err();
        assert!(matches!(err, TemporalError::TypeMismatch { .. }));
        assert!(err.to_string().contains("type mismatch"));
    }

    #[test]
    fn test_extent_fails_on_unparseable_value() {
        let parser = TimestampParser::default();
        let err = temporal_extent(&parser, ["2016", "whenever"]).unwrap_err();
        assert_eq!(err, TemporalError::Unparseable("whenever".to_string()));
    }
}
