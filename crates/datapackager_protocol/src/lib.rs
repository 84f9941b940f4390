//! Shared vocabulary for the Data Packager crates.
//!
//! The inference engine and the schema engine both speak in terms of
//! JSON Table Schema field types. This crate holds the single definition
//! so the two never drift apart.

pub mod types;

pub use types::FieldType;
