//! Constraint-based type inference engine
//!
//! Uses ALL values to eliminate possibilities (not sampling).
//! Each value removes the types it cannot belong to; whatever survives
//! the whole column is a candidate.
//!
//! # Resolution
//!
//! Unlike a voting scheme, survivors are not weighed against each other.
//! A column of `1, 0, 1` is still a valid integer, number and boolean
//! column, so a fixed precedence decides:
//!
//! integer → number → boolean → datetime → date → time → string
//!
//! # Example
//!
//! Given a column with values: ["05/06/2024", "31/05/2024"]
//!
//! - "05/06/2024" could be DD/MM/YYYY or MM/DD/YYYY
//! - "31/05/2024" eliminates MM/DD/YYYY because 31 cannot be a month
//! - integer, number and boolean were eliminated by the first value, so the
//!   column resolves to a date, reported as `datetime`

pub mod constraints;
pub mod date_formats;
pub mod solver;

pub use constraints::{EliminationEvidence, EliminationReason, TypeInferenceResult};
pub use date_formats::{ParsedDate, DATE_FORMATS};
pub use solver::{infer_column_type, ConstraintSolver};

use datapackager_protocol::FieldType;

/// Type inference engine data types.
///
/// Uses inference-friendly names (Integer, Float, DateTime) rather than
/// the JSON Table Schema names used in [`FieldType`]. The engine works with
/// these, then converts via `From` for output.
///
/// # Name Mapping
///
/// | Inference | FieldType |
/// |-----------|-----------|
/// | Integer | integer |
/// | Float | number |
/// | Date | datetime |
/// | DateTime | datetime |
/// | Time | time |
/// | Null | string |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Null/empty value
    Null,
    /// Boolean (true/false, yes/no, t/f)
    Boolean,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Date (no time component)
    Date,
    /// DateTime (date + time)
    DateTime,
    /// Time (no date component)
    Time,
    /// UTF-8 string (fallback)
    String,
}

impl DataType {
    /// Types a fresh solver starts from (everything but the fallback).
    pub fn candidates() -> Vec<DataType> {
        vec![
            DataType::Boolean,
            DataType::Integer,
            DataType::Float,
            DataType::Date,
            DataType::DateTime,
            DataType::Time,
        ]
    }

    /// Resolution order when several candidates survive.
    pub const PRECEDENCE: [DataType; 6] = [
        DataType::Integer,
        DataType::Float,
        DataType::Boolean,
        DataType::DateTime,
        DataType::Date,
        DataType::Time,
    ];

    /// Returns true if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// Returns true if this type is temporal
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::DateTime | DataType::Time)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Null => write!(f, "null"),
            DataType::Boolean => write!(f, "boolean"),
            DataType::Integer => write!(f, "integer"),
            DataType::Float => write!(f, "float"),
            DataType::Date => write!(f, "date"),
            DataType::DateTime => write!(f, "datetime"),
            DataType::Time => write!(f, "time"),
            DataType::String => write!(f, "string"),
        }
    }
}

impl From<DataType> for FieldType {
    fn from(dt: DataType) -> Self {
        match dt {
            DataType::Null => FieldType::String,
            DataType::Boolean => FieldType::Boolean,
            DataType::Integer => FieldType::Integer,
            DataType::Float => FieldType::Number,
            DataType::Date => FieldType::Datetime,
            DataType::DateTime => FieldType::Datetime,
            DataType::Time => FieldType::Time,
            DataType::String => FieldType::String,
        }
    }
}
