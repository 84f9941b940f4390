//! Schema inference entry points.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use datapackager_protocol::FieldType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InferenceError;
use crate::stats::ColumnStats;
use crate::table::{read_table, Table};
use crate::temporal::{temporal_extent, time_extent, TimestampParser};
use crate::type_inference::solver::is_null_value;
use crate::type_inference::{infer_column_type, DataType};

/// Bytes read in [`InferenceMode::Sample`] unless configured otherwise.
pub const DEFAULT_SAMPLE_BYTES: usize = 1024;

/// How much of the file to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Head of the file only; names and types, no statistics.
    Sample,
    /// Whole file, with statistics for numeric columns.
    #[default]
    Full,
}

impl FromStr for InferenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sample" => Ok(InferenceMode::Sample),
            "full" => Ok(InferenceMode::Full),
            _ => Err(format!("Invalid inference mode: '{}'. Expected: sample, full", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceOptions {
    /// Explicit delimiter; sniffed when `None`.
    pub separator: Option<u8>,
    pub mode: InferenceMode,
    pub sample_bytes: usize,
    pub timestamps: TimestampParser,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            separator: None,
            mode: InferenceMode::Full,
            sample_bytes: DEFAULT_SAMPLE_BYTES,
            timestamps: TimestampParser::default(),
        }
    }
}

impl InferenceOptions {
    pub fn sample() -> Self {
        Self {
            mode: InferenceMode::Sample,
            ..Self::default()
        }
    }
}

/// One inferred column, serialized as a JSON Table Schema field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredField {
    pub index: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(flatten)]
    pub stats: Option<ColumnStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_extent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredSchema {
    pub fields: Vec<InferredField>,
}

impl InferredSchema {
    pub fn field(&self, name: &str) -> Option<&InferredField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Read a delimited file from disk and infer its schema.
pub fn infer_schema_from_path(
    path: &Path,
    options: &InferenceOptions,
) -> Result<InferredSchema, InferenceError> {
    let bytes = fs::read(path).map_err(|source| InferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "Inferring schema");
    infer_schema_from_bytes(&bytes, options)
}

/// Infer a schema from the raw contents of a delimited file.
pub fn infer_schema_from_bytes(
    bytes: &[u8],
    options: &InferenceOptions,
) -> Result<InferredSchema, InferenceError> {
    let input = match options.mode {
        InferenceMode::Sample => sample_head(bytes, options.sample_bytes),
        InferenceMode::Full => bytes,
    };

    let table = read_table(input, options.separator)?;

    let fields = table
        .headers
        .iter()
        .enumerate()
        .map(|(index, name)| infer_field(&table, index, name, options))
        .collect();

    Ok(InferredSchema { fields })
}

/// Cut the input to at most `limit` bytes, ending on a line boundary so the
/// last row is never partial. A head with no newline is kept whole.
fn sample_head(bytes: &[u8], limit: usize) -> &[u8] {
    if bytes.len() <= limit {
        return bytes;
    }
    let head = &bytes[..limit];
    match head.iter().rposition(|&b| b == b'\n') {
        Some(pos) => &head[..=pos],
        None => head,
    }
}

fn infer_field(table: &Table, index: usize, name: &str, options: &InferenceOptions) -> InferredField {
    let result = infer_column_type(table.column(index));
    for evidence in result.evidence() {
        debug!(
            column = name,
            row = evidence.row_index,
            eliminated = %evidence.data_type,
            reason = %evidence.reason,
            "Type eliminated"
        );
    }
    debug!(column = name, result = %result, "Column type resolved");
    let mut data_type = result.data_type();

    // Auxiliary pass: text that the permissive parser reads as timestamps
    // ("Tue, 5 Mar 2024", "2024-03-05 10:00 EST") is still a datetime column.
    if data_type == DataType::String && all_timestamps(table, index, &options.timestamps) {
        debug!(column = name, "Text column reparsed as datetime");
        data_type = DataType::DateTime;
    }

    let field_type = FieldType::from(data_type);

    let stats = match options.mode {
        InferenceMode::Full if data_type.is_numeric() => {
            let values: Vec<f64> = table
                .column(index)
                .filter(|v| !is_null_value(v))
                .filter_map(|v| v.trim().parse::<f64>().ok())
                .collect();
            ColumnStats::describe(&values)
        }
        _ => None,
    };

    let temporal_extent = if data_type.is_temporal() {
        let extent = if data_type == DataType::Time {
            time_extent(table.column(index))
        } else {
            temporal_extent(&options.timestamps, table.column(index))
        };
        match extent {
            Ok(extent) => extent,
            Err(e) => {
                warn!(column = name, error = %e, "Omitting temporal extent");
                None
            }
        }
    } else {
        None
    };

    InferredField {
        index: index as u64,
        name: name.to_string(),
        field_type,
        stats,
        temporal_extent,
    }
}

fn all_timestamps(table: &Table, index: usize, parser: &TimestampParser) -> bool {
    let mut seen = false;
    for value in table.column(index).filter(|v| !is_null_value(v)) {
        if parser.parse(value).is_err() {
            return false;
        }
        seen = true;
    }
    seen
}
