use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Field Types (Canonical Definition)
// ============================================================================

/// Canonical field type enum - the SINGLE SOURCE OF TRUTH for field types.
///
/// # Layered Design
///
/// - `datapackager_inference::type_inference::DataType` - Inference-friendly
///   names (Integer, Float, DateTime) that convert to this type via `From`.
/// - `datapackager_schema::Field::field_type` - stores this type directly.
///
/// The wire form is the lowercase JSON Table Schema name (`"integer"`,
/// `"datetime"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 text (default/fallback)
    #[default]
    String,
    /// Any numeric value, including decimals
    Number,
    /// Whole numbers
    Integer,
    /// Calendar date without time
    Date,
    /// Time of day without date
    Time,
    /// Date and time
    Datetime,
    /// true/false
    Boolean,
    /// Base64 or otherwise encoded bytes
    Binary,
    /// JSON object
    Object,
    /// Geographic point
    Geopoint,
    /// GeoJSON geometry
    Geojson,
    /// JSON array
    Array,
    /// Unconstrained
    Any,
}

impl FieldType {
    /// Every accepted type, in the order error messages list them.
    pub const ALL: [FieldType; 13] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Integer,
        FieldType::Date,
        FieldType::Time,
        FieldType::Datetime,
        FieldType::Boolean,
        FieldType::Binary,
        FieldType::Object,
        FieldType::Geopoint,
        FieldType::Geojson,
        FieldType::Array,
        FieldType::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Datetime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Binary => "binary",
            FieldType::Object => "object",
            FieldType::Geopoint => "geopoint",
            FieldType::Geojson => "geojson",
            FieldType::Array => "array",
            FieldType::Any => "any",
        }
    }

    /// Returns true for types that carry descriptive statistics.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Number)
    }

    /// Returns true for types that carry a temporal extent.
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Time | FieldType::Datetime)
    }

    /// Comma separated list of the accepted names.
    pub fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    /// Names are matched exactly; `"Integer"` is not a field type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid field type: '{}'. Expected: {}",
                    s,
                    FieldType::expected_names()
                )
            })
    }
}
