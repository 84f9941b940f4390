//! Error types for schema operations.

use std::collections::BTreeMap;
use std::fmt;

use datapackager_inference::InferenceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::naming::NamingError;
use crate::resource::StoreError;

pub const MISSING_VALUE: &str = "Missing value";

/// User-correctable failure: attribute name → messages.
///
/// Serializes as the bare mapping, e.g.
/// `{"index": ["You can't have two fields with the same index"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationError {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error on one attribute.
    pub fn single(attr: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(attr, message);
        err
    }

    pub fn add(&mut self, attr: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(attr.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Messages recorded for `attr`; empty when it has none.
    pub fn messages(&self, attr: &str) -> &[String] {
        self.errors.get(attr).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.errors.contains_key(attr)
    }

    /// `Ok(())` if nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation error")?;
        for (i, (attr, messages)) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, attr, messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Every failure a schema operation can report.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A stored schema breaks an invariant that creation enforces.
    #[error("Schema consistency fault: {0}")]
    Consistency(String),

    #[error("Resource store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchemaError {
    /// Build a consistency fault and log it; these are never expected.
    pub(crate) fn consistency(resource_id: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        error!(resource_id, "{}", message);
        SchemaError::Consistency(message)
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            SchemaError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_messages() {
        let mut err = ValidationError::new();
        err.add("name", MISSING_VALUE);
        err.add("index", "Must be a non-negative integer");
        err.add("index", "You can't have two fields with the same index");
        assert_eq!(
            err.to_string(),
            "Validation error: index: Must be a non-negative integer, You can't have two fields \
             with the same index; name: Missing value"
        );
    }

    #[test]
    fn test_serializes_as_mapping() {
        let err = ValidationError::single("type", "bad");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"type": ["bad"]}));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationError::new().into_result().is_ok());
        let err = ValidationError::single("x", "y").into_result().unwrap_err();
        assert_eq!(err.messages("x"), ["y".to_string()]);
        assert!(err.messages("z").is_empty());
    }
}
