//! Constraint-based type inference solver
//!
//! The solver maintains possible types and date formats for a column,
//! eliminating possibilities as values are processed.

use std::collections::HashSet;

use chrono::NaiveTime;

use super::constraints::{EliminationEvidence, EliminationReason, TypeInferenceResult};
use super::date_formats::{check_date_value, DateFormatSpec, DATE_FORMATS};
use super::DataType;
use crate::temporal::TimestampParser;

pub(crate) const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Returns true for the spellings treated as a missing value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed == "NA"
        || trimmed == "N/A"
        || trimmed.eq_ignore_ascii_case("nan")
}

/// Constraint-based type inference solver
///
/// Maintains possible types and formats, eliminating as values are seen.
#[derive(Debug)]
pub struct ConstraintSolver {
    /// Types that are still possible
    possible_types: HashSet<DataType>,

    /// Date formats that accept every value seen so far
    date_format_candidates: Vec<&'static DateFormatSpec>,

    /// First elimination of each type
    elimination_evidence: Vec<EliminationEvidence>,

    /// Number of values processed
    values_processed: usize,

    /// Number of null/empty values seen
    null_count: usize,

    /// Parser used to confirm datetime values
    timestamps: TimestampParser,
}

impl ConstraintSolver {
    pub fn new() -> Self {
        Self {
            possible_types: DataType::candidates().into_iter().collect(),
            date_format_candidates: DATE_FORMATS.iter().collect(),
            elimination_evidence: Vec::new(),
            values_processed: 0,
            null_count: 0,
            timestamps: TimestampParser::default(),
        }
    }

    /// Add a value and apply constraints
    pub fn add_value(&mut self, value: &str) {
        self.values_processed += 1;

        if is_null_value(value) {
            self.null_count += 1;
            return;
        }

        let trimmed = value.trim();
        self.apply_boolean_constraints(trimmed);
        self.apply_numeric_constraints(trimmed);
        self.apply_date_constraints(trimmed);
        self.apply_datetime_constraints(trimmed);
        self.apply_time_constraints(trimmed);
    }

    fn apply_boolean_constraints(&mut self, value: &str) {
        if !self.possible_types.contains(&DataType::Boolean) {
            return;
        }

        // Use eq_ignore_ascii_case() instead of to_lowercase() to avoid allocation
        let is_boolean = value.eq_ignore_ascii_case("true")
            || value.eq_ignore_ascii_case("false")
            || value.eq_ignore_ascii_case("yes")
            || value.eq_ignore_ascii_case("no")
            || matches!(
                value,
                "y" | "Y" | "n" | "N" | "1" | "0" | "t" | "T" | "f" | "F"
            );

        if !is_boolean {
            self.eliminate_type(
                DataType::Boolean,
                EliminationReason::NotBooleanValue {
                    value: value.to_string(),
                },
            );
        }
    }

    fn apply_numeric_constraints(&mut self, value: &str) {
        if !is_potentially_numeric(value) || value.parse::<f64>().is_err() {
            for dtype in [DataType::Integer, DataType::Float] {
                self.eliminate_type(
                    dtype,
                    EliminationReason::InvalidCharacters {
                        value: value.to_string(),
                    },
                );
            }
            return;
        }

        if value.parse::<i64>().is_err() {
            self.eliminate_type(
                DataType::Integer,
                EliminationReason::NotWholeNumber {
                    value: value.to_string(),
                },
            );
        }
    }

    fn apply_date_constraints(&mut self, value: &str) {
        if !self.possible_types.contains(&DataType::Date) {
            return;
        }

        self.date_format_candidates
            .retain(|format| check_date_value(value, *format).is_ok());

        if self.date_format_candidates.is_empty() {
            self.eliminate_type(
                DataType::Date,
                EliminationReason::NoDateFormat {
                    value: value.to_string(),
                },
            );
        }
    }

    fn apply_datetime_constraints(&mut self, value: &str) {
        if !self.possible_types.contains(&DataType::DateTime) {
            return;
        }

        // A datetime carries a time of day; bare dates stay with the Date candidate.
        if !value.contains(':') || self.timestamps.parse(value).is_err() {
            self.eliminate_type(
                DataType::DateTime,
                EliminationReason::PatternMismatch {
                    value: value.to_string(),
                    expected: "date and time, e.g. 2024-05-31T10:00:00",
                },
            );
        }
    }

    fn apply_time_constraints(&mut self, value: &str) {
        if !self.possible_types.contains(&DataType::Time) {
            return;
        }

        let parses = TIME_FORMATS
            .iter()
            .any(|format| NaiveTime::parse_from_str(value, format).is_ok());

        if !parses {
            self.eliminate_type(
                DataType::Time,
                EliminationReason::PatternMismatch {
                    value: value.to_string(),
                    expected: "HH:MM or HH:MM:SS",
                },
            );
        }
    }

    /// Eliminate a type and record evidence
    fn eliminate_type(&mut self, data_type: DataType, reason: EliminationReason) {
        if self.possible_types.remove(&data_type) {
            self.elimination_evidence.push(EliminationEvidence {
                data_type,
                reason,
                row_index: self.values_processed.saturating_sub(1),
            });
        }
    }

    /// True once every candidate has been eliminated; nothing further can change the result.
    pub fn is_exhausted(&self) -> bool {
        self.possible_types.is_empty()
    }

    /// Get the current result
    pub fn get_result(&self) -> TypeInferenceResult {
        // Only nulls: nothing to eliminate with, report as text
        if self.null_count == self.values_processed {
            return TypeInferenceResult::NoValidType {
                fallback: DataType::String,
                eliminations: self.elimination_evidence.clone(),
            };
        }

        let resolved = DataType::PRECEDENCE
            .iter()
            .copied()
            .find(|t| self.possible_types.contains(t));

        match resolved {
            Some(data_type) => {
                let format = if data_type == DataType::Date {
                    self.date_format_candidates.first().map(|f| f.pattern)
                } else {
                    None
                };

                TypeInferenceResult::Resolved {
                    data_type,
                    format,
                    evidence: self.elimination_evidence.clone(),
                }
            }
            None => TypeInferenceResult::NoValidType {
                fallback: DataType::String,
                eliminations: self.elimination_evidence.clone(),
            },
        }
    }
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Infer the type of a single column of values.
///
/// Stops reading once every candidate is gone; elimination never reverses.
pub fn infer_column_type<'a, I>(values: I) -> TypeInferenceResult
where
    I: IntoIterator<Item = &'a str>,
{
    let mut solver = ConstraintSolver::new();

    for value in values {
        solver.add_value(value);
        if solver.is_exhausted() {
            break;
        }
    }

    solver.get_result()
}

/// Check if a value looks numeric: optional sign, digits, at most one
/// decimal point, optional exponent. Rejects `inf`/`NaN` spellings that
/// `f64::from_str` would otherwise accept.
fn is_potentially_numeric(value: &str) -> bool {
    let body = value.strip_prefix(['-', '+']).unwrap_or(value);
    if body.is_empty() {
        return false;
    }

    let mut has_digit = false;
    let mut decimal_count = 0;
    let mut seen_exponent = false;
    let mut prev = '\0';

    for c in body.chars() {
        if c.is_ascii_digit() {
            has_digit = true;
        } else if c == '.' && !seen_exponent {
            decimal_count += 1;
            if decimal_count > 1 {
                return false;
            }
        } else if (c == 'e' || c == 'E') && has_digit && !seen_exponent {
            seen_exponent = true;
        } else if (c == '-' || c == '+') && (prev == 'e' || prev == 'E') {
            // exponent sign
        } else {
            return false;
        }
        prev = c;
    }

    has_digit
}
