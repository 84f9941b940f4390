//! Field CRUD
//!
//! Fields are addressed by `index`, never by position in the `fields` list.
//! Create and update both validate the whole input first and report every
//! problem at once, keyed by attribute:
//!
//! ```text
//! {"index": ["You can't have two fields with the same index"],
//!  "type":  ["Invalid field type: 'bogus'. Expected: string, number, ..."]}
//! ```
//!
//! Update is a full replace: attributes missing from the input are dropped
//! from the stored field. Custom attributes are stored as strings.

use std::collections::BTreeMap;

use datapackager_protocol::FieldType;
use serde_json::{Map, Value};
use tracing::info;

use crate::engine::SchemaEngine;
use crate::error::{SchemaError, ValidationError, MISSING_VALUE};
use crate::schema::{Field, Schema};

pub const DUPLICATE_INDEX: &str = "You can't have two fields with the same index";
pub const DUPLICATE_NAME: &str = "You can't have two fields with the same name";
pub const NOT_AN_INDEX: &str = "Must be a non-negative integer";
pub const NO_NEXT_INDEX: &str = "No index is free after the highest one in use";

/// Keys that are parameters of the call rather than field attributes.
const NON_FIELD_KEYS: &[&str] = &["resource_id"];

/// Raw field attributes as a caller supplied them.
///
/// Values stay untyped until validation so that every problem can be
/// reported, not just the first one serde would trip on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInput {
    pub index: Option<Value>,
    pub name: Option<Value>,
    /// Everything else: `title`, `description`, `format`, `type` and custom
    /// attributes.
    pub attrs: Map<String, Value>,
}

impl FieldInput {
    pub fn new(index: u64, name: impl Into<String>) -> Self {
        Self {
            index: Some(Value::from(index)),
            name: Some(Value::String(name.into())),
            attrs: Map::new(),
        }
    }

    /// Input for the legacy create path, which assigns the index itself.
    pub fn unindexed(name: impl Into<String>) -> Self {
        Self {
            index: None,
            name: Some(Value::String(name.into())),
            attrs: Map::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Split flat call parameters into a field input.
    pub fn from_params(params: &Map<String, Value>) -> Self {
        let mut input = Self::default();
        for (key, value) in params {
            match key.as_str() {
                "index" => input.index = Some(value.clone()),
                "name" => input.name = Some(value.clone()),
                k if NON_FIELD_KEYS.contains(&k) => {}
                _ => {
                    input.attrs.insert(key.clone(), value.clone());
                }
            }
        }
        input
    }
}

/// Parse an index given as a JSON number or a numeric string.
pub fn parse_index(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// The index of a call, or a validation error on `index`.
pub fn required_index(value: Option<&Value>) -> Result<u64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::single("index", MISSING_VALUE)),
        Some(v) => parse_index(v).ok_or_else(|| ValidationError::single("index", NOT_AN_INDEX)),
    }
}

/// String form of a value: strings as they are, anything else as JSON text.
/// `null` means absent.
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Create,
    /// Replacing the field that currently holds this index.
    Replace,
}

fn validate_field(input: &FieldInput, schema: &Schema, check: Check) -> Result<Field, ValidationError> {
    let mut errors = ValidationError::new();

    let index = match input.index.as_ref() {
        None | Some(Value::Null) => {
            errors.add("index", MISSING_VALUE);
            None
        }
        Some(value) => match parse_index(value) {
            Some(i) => Some(i),
            None => {
                errors.add("index", NOT_AN_INDEX);
                None
            }
        },
    };
    if let (Some(i), Check::Create) = (index, check) {
        if schema.has_index(i) {
            errors.add("index", DUPLICATE_INDEX);
        }
    }

    let name = match input.name.as_ref() {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            errors.add("name", MISSING_VALUE);
            None
        }
        Some(_) => {
            errors.add("name", "Must be a string");
            None
        }
    };
    if let Some(name) = name.as_deref() {
        let clash = schema.fields.iter().any(|f| {
            f.name == name && (check == Check::Create || Some(f.index) != index)
        });
        if clash {
            errors.add("name", DUPLICATE_NAME);
        }
    }

    let mut field_type = None;
    let mut title = None;
    let mut description = None;
    let mut format = None;
    let mut extra = BTreeMap::new();

    for (key, value) in &input.attrs {
        match key.as_str() {
            "type" => match value {
                Value::Null => {}
                Value::String(s) => match s.parse::<FieldType>() {
                    Ok(t) => field_type = Some(t),
                    Err(e) => errors.add("type", e),
                },
                other => errors.add(
                    "type",
                    format!(
                        "Invalid field type: {}. Expected: {}",
                        other,
                        FieldType::expected_names()
                    ),
                ),
            },
            "title" => title = coerce_string(value),
            "description" => description = coerce_string(value),
            "format" => format = coerce_string(value),
            "index" | "name" => {}
            _ => {
                if let Some(s) = coerce_string(value) {
                    extra.insert(key.clone(), Value::String(s));
                }
            }
        }
    }

    match (index, name) {
        (Some(index), Some(name)) if errors.is_empty() => Ok(Field {
            index,
            name,
            title,
            description,
            format,
            field_type,
            extra,
        }),
        _ => Err(errors),
    }
}

/// How a lookup treats several fields sharing one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// Reads report it as a validation error on `index`.
    Read,
    /// Writes refuse to touch a corrupt schema.
    Write,
}

/// Position of the one field holding `index`.
pub(crate) fn locate(
    resource_id: &str,
    schema: &Schema,
    index: u64,
    lookup: Lookup,
) -> Result<usize, SchemaError> {
    let positions: Vec<usize> = schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.index == index)
        .map(|(pos, _)| pos)
        .collect();

    match (positions.as_slice(), lookup) {
        ([], _) => Err(ValidationError::single("index", format!("No field with index {}", index)).into()),
        ([pos], _) => Ok(*pos),
        (many, Lookup::Read) => Err(ValidationError::single(
            "index",
            format!("{} fields have index {}", many.len(), index),
        )
        .into()),
        (many, Lookup::Write) => Err(SchemaError::consistency(
            resource_id,
            format!("{} fields share index {}", many.len(), index),
        )),
    }
}

impl SchemaEngine {
    /// `resource_schema_field_create`. The input must carry an index.
    pub fn field_create(&self, resource_id: &str, input: FieldInput) -> Result<Field, SchemaError> {
        self.create_field(resource_id, input, false)
    }

    /// Legacy create: a missing index becomes the next column position, one
    /// past the highest index in use.
    pub fn field_create_next(&self, resource_id: &str, input: FieldInput) -> Result<Field, SchemaError> {
        self.create_field(resource_id, input, true)
    }

    fn create_field(
        &self,
        resource_id: &str,
        mut input: FieldInput,
        assign_index: bool,
    ) -> Result<Field, SchemaError> {
        let field = self.store.mutate(resource_id, |_, schema| {
            if assign_index && matches!(input.index, None | Some(Value::Null)) {
                let next = schema
                    .next_index()
                    .ok_or_else(|| ValidationError::single("index", NO_NEXT_INDEX))?;
                input.index = Some(Value::from(next));
            }
            let field = validate_field(&input, schema, Check::Create)?;
            schema.fields.push(field.clone());
            Ok(field)
        })?;
        info!(resource_id, index = field.index, name = %field.name, "Field created");
        Ok(field)
    }

    /// `resource_schema_field_show`
    pub fn field_show(&self, resource_id: &str, index: u64) -> Result<Field, SchemaError> {
        let schema = self.store.show(resource_id)?;
        let pos = locate(resource_id, &schema, index, Lookup::Read)?;
        Ok(schema.fields[pos].clone())
    }

    /// `resource_schema_field_update`: replace the field holding the input's
    /// index. Returns the field as read back from the store.
    pub fn field_update(&self, resource_id: &str, input: FieldInput) -> Result<Field, SchemaError> {
        let index = required_index(input.index.as_ref())?;
        self.store.mutate(resource_id, |_, schema| {
            let pos = locate(resource_id, schema, index, Lookup::Write)?;
            let field = validate_field(&input, schema, Check::Replace)?;
            schema.fields[pos] = field;
            Ok(())
        })?;
        info!(resource_id, index, "Field updated");
        self.field_show(resource_id, index)
    }

    /// `resource_schema_field_delete`. Deleting an absent index fails.
    pub fn field_delete(&self, resource_id: &str, index: u64) -> Result<(), SchemaError> {
        self.store.mutate(resource_id, |_, schema| {
            let pos = locate(resource_id, schema, index, Lookup::Write)?;
            schema.fields.remove(pos);
            Ok(())
        })?;
        info!(resource_id, index, "Field deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_with(fields: &[(u64, &str)]) -> Schema {
        Schema {
            fields: fields.iter().map(|(i, n)| Field::new(*i, *n)).collect(),
            ..Schema::default()
        }
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index(&json!(3)), Some(3));
        assert_eq!(parse_index(&json!(" 7 ")), Some(7));
        assert_eq!(parse_index(&json!(-1)), None);
        assert_eq!(parse_index(&json!(1.5)), None);
        assert_eq!(parse_index(&json!("x")), None);
        assert_eq!(parse_index(&json!(true)), None);
    }

    #[test]
    fn test_from_params_splits_attributes() {
        let params = json!({"resource_id": "r1", "index": 0, "name": "a", "title": "A"});
        let input = FieldInput::from_params(params.as_object().unwrap());
        assert_eq!(input.index, Some(json!(0)));
        assert_eq!(input.name, Some(json!("a")));
        assert_eq!(input.attrs.len(), 1);
        assert_eq!(input.attrs["title"], json!("A"));
    }

    #[test]
    fn test_validate_collects_every_error() {
        let schema = schema_with(&[(0, "a")]);
        let input = FieldInput::new(0, "a").attr("type", "bogus");
        let err = validate_field(&input, &schema, Check::Create).unwrap_err();
        assert_eq!(err.messages("index"), [DUPLICATE_INDEX.to_string()]);
        assert_eq!(err.messages("name"), [DUPLICATE_NAME.to_string()]);
        assert!(err.messages("type")[0].contains("bogus"));
    }

    #[test]
    fn test_validate_missing_values() {
        let err = validate_field(&FieldInput::default(), &Schema::default(), Check::Create)
            .unwrap_err();
        assert_eq!(err.messages("index"), [MISSING_VALUE.to_string()]);
        assert_eq!(err.messages("name"), [MISSING_VALUE.to_string()]);

        let blank = FieldInput::new(0, "  ");
        let err = validate_field(&blank, &Schema::default(), Check::Create).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn test_replace_ignores_own_name() {
        let schema = schema_with(&[(0, "a"), (1, "b")]);
        assert!(validate_field(&FieldInput::new(0, "a"), &schema, Check::Replace).is_ok());
        let err = validate_field(&FieldInput::new(0, "b"), &schema, Check::Replace).unwrap_err();
        assert_eq!(err.messages("name"), [DUPLICATE_NAME.to_string()]);
    }

    #[test]
    fn test_custom_attributes_are_stringified() {
        let input = FieldInput::new(0, "f")
            .attr("custom", 145)
            .attr("flag", true)
            .attr("dropped", Value::Null)
            .attr("type", "integer");
        let field = validate_field(&input, &Schema::default(), Check::Create).unwrap();
        assert_eq!(field.extra["custom"], json!("145"));
        assert_eq!(field.extra["flag"], json!("true"));
        assert!(!field.extra.contains_key("dropped"));
        assert_eq!(field.field_type, Some(FieldType::Integer));
    }

    #[test]
    fn test_locate_duplicate_index() {
        let schema = schema_with(&[(0, "a"), (0, "b")]);
        assert!(matches!(
            locate("r1", &schema, 0, Lookup::Write),
            Err(SchemaError::Consistency(_))
        ));
        let err = locate("r1", &schema, 0, Lookup::Read).unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().messages("index"),
            ["2 fields have index 0".to_string()]
        );
        assert!(matches!(
            locate("r1", &schema, 5, Lookup::Read),
            Err(SchemaError::Validation(_))
        ));
    }
}
