//! Constraint types for type inference
//!
//! Evidence about what a column CANNOT be. The solver keeps the first
//! elimination of each type so a surprising result can be explained in the
//! logs.

use std::fmt;

use super::DataType;

/// Reason why a type or format was eliminated
#[derive(Debug, Clone, PartialEq)]
pub enum EliminationReason {
    /// Value contains characters that rule out this type
    InvalidCharacters { value: String },
    /// Contains decimal point or exponent (eliminates integer)
    NotWholeNumber { value: String },
    /// Date component impossible (e.g., month > 12)
    DateComponentInvalid {
        value: String,
        component: &'static str,
        actual: i32,
    },
    /// Format pattern doesn't match
    PatternMismatch {
        value: String,
        expected: &'static str,
    },
    /// Boolean interpretation failed
    NotBooleanValue { value: String },
    /// No remaining date format accepts the value
    NoDateFormat { value: String },
}

impl fmt::Display for EliminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EliminationReason::InvalidCharacters { value } => {
                write!(f, "'{}' contains non-numeric characters", value)
            }
            EliminationReason::NotWholeNumber { value } => {
                write!(f, "'{}' is not a whole number", value)
            }
            EliminationReason::DateComponentInvalid {
                value,
                component,
                actual,
            } => write!(f, "'{}': {} value {} is invalid", value, component, actual),
            EliminationReason::PatternMismatch { value, expected } => {
                write!(f, "'{}' doesn't match pattern: {}", value, expected)
            }
            EliminationReason::NotBooleanValue { value } => {
                write!(f, "'{}' is not a boolean value", value)
            }
            EliminationReason::NoDateFormat { value } => {
                write!(f, "no date format accepts '{}'", value)
            }
        }
    }
}

/// The value that ruled a type out.
#[derive(Debug, Clone, PartialEq)]
pub struct EliminationEvidence {
    pub data_type: DataType,
    pub reason: EliminationReason,
    /// Row that triggered the elimination (0-indexed, header excluded)
    pub row_index: usize,
}

/// Result of type inference for a column
#[derive(Debug, Clone)]
pub enum TypeInferenceResult {
    /// At least one candidate survived; the highest-precedence one wins
    Resolved {
        data_type: DataType,
        /// For dates, the first surviving strftime pattern
        format: Option<&'static str>,
        evidence: Vec<EliminationEvidence>,
    },
    /// Every candidate was eliminated, or the column held only nulls
    NoValidType {
        fallback: DataType,
        eliminations: Vec<EliminationEvidence>,
    },
}

impl TypeInferenceResult {
    /// The type the column should be reported as.
    pub fn data_type(&self) -> DataType {
        match self {
            TypeInferenceResult::Resolved { data_type, .. } => *data_type,
            TypeInferenceResult::NoValidType { fallback, .. } => *fallback,
        }
    }

    pub fn evidence(&self) -> &[EliminationEvidence] {
        match self {
            TypeInferenceResult::Resolved { evidence, .. } => evidence,
            TypeInferenceResult::NoValidType { eliminations, .. } => eliminations,
        }
    }
}

impl fmt::Display for TypeInferenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInferenceResult::Resolved {
                data_type,
                format: Some(pattern),
                ..
            } => write!(f, "{}({})", data_type, pattern),
            TypeInferenceResult::Resolved { data_type, .. } => write!(f, "{}", data_type),
            TypeInferenceResult::NoValidType { fallback, .. } => {
                write!(f, "no_valid_type(fallback: {})", fallback)
            }
        }
    }
}
