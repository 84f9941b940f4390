//! CSV Type Inference Engine
//!
//! Given a delimited text file, produce a JSON Table Schema: one field per
//! column with its zero-based `index`, the header text as `name`, and an
//! inferred `type`.
//!
//! # Pipeline
//!
//! 1. [`table`]: sniff the delimiter and read the file into memory
//! 2. [`type_inference`]: constraint-based elimination per column, resolved
//!    by a fixed precedence (integer, number, boolean, datetime, string)
//! 3. [`stats`]: descriptive statistics for numeric columns (full mode only)
//! 4. [`temporal`]: `earliest/latest` extent for temporal columns, best effort
//!
//! Entry points are [`infer_schema_from_path`] and [`infer_schema_from_bytes`].

pub mod error;
pub mod infer;
pub mod stats;
pub mod table;
pub mod temporal;
pub mod type_inference;

pub use error::InferenceError;
pub use infer::{
    infer_schema_from_bytes, infer_schema_from_path, InferenceMode, InferenceOptions,
    InferredField, InferredSchema, DEFAULT_SAMPLE_BYTES,
};
pub use stats::ColumnStats;
pub use table::{read_table, sniff_delimiter, Table};
pub use temporal::{
    parse_timestamp, temporal_extent, time_extent, TemporalError, Timestamp, TimestampParser,
};
