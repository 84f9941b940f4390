//! JSON Table Schema documents as stored on a resource.
//!
//! A [`Schema`] round-trips through the resource's `schema` string. Keys this
//! crate does not model (statistics from inference, `missingValues`, ...)
//! are carried in the `extra` maps and written back unchanged.

use std::collections::BTreeMap;

use datapackager_protocol::FieldType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Schema
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(
        rename = "primaryKey",
        default,
        deserialize_with = "one_or_many_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<Vec<String>>,

    #[serde(rename = "foreignKeys", default, skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<Vec<ForeignKey>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Schema {
    pub fn has_index(&self, index: u64) -> bool {
        self.fields.iter().any(|f| f.index == index)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// One past the highest index in use, or 0 for an empty schema.
    /// `None` when the highest index is `u64::MAX`.
    pub fn next_index(&self) -> Option<u64> {
        match self.fields.iter().map(|f| f.index).max() {
            Some(highest) => highest.checked_add(1),
            None => Some(0),
        }
    }

    pub fn foreign_key(&self, uid: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .as_deref()
            .and_then(|keys| keys.iter().find(|k| k.fkey_uid == uid))
    }

    pub fn has_fkey_uid(&self, uid: &str) -> bool {
        self.foreign_key(uid).is_some()
    }
}

// ============================================================================
// Field
// ============================================================================

/// One column descriptor, addressed by `index`.
///
/// Serializes without empty optionals, so a field created with only an index
/// and a name reads back as exactly `{"index": .., "name": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub index: u64,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Custom attributes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Field {
    pub fn new(index: u64, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            title: None,
            description: None,
            format: None,
            field_type: None,
            extra: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Foreign keys
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
    pub fkey_uid: String,
    pub reference: Reference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Name of the referenced resource.
    pub resource: String,
    #[serde(deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    OneOrMany::deserialize(deserializer).map(Into::into)
}

fn one_or_many_opt<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<OneOrMany>::deserialize(deserializer).map(|v| v.map(Into::into))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_schema_serializes_to_fields_only() {
        let json = serde_json::to_value(Schema::default()).unwrap();
        assert_eq!(json, json!({"fields": []}));
    }

    #[test]
    fn test_minimal_field_has_no_extra_keys() {
        let json = serde_json::to_value(Field::new(3, "id")).unwrap();
        assert_eq!(json, json!({"index": 3, "name": "id"}));
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let raw = json!({
            "fields": [{"index": 0, "name": "a", "type": "integer", "mean": 2.0}],
            "primaryKey": "a",
            "missingValues": [""]
        });
        let schema: Schema = serde_json::from_value(raw).unwrap();
        assert_eq!(schema.primary_key, Some(vec!["a".to_string()]));
        assert_eq!(schema.fields[0].field_type, Some(FieldType::Integer));
        assert_eq!(schema.fields[0].extra["mean"], json!(2.0));

        let back = serde_json::to_value(&schema).unwrap();
        assert_eq!(back["primaryKey"], json!(["a"]));
        assert_eq!(back["missingValues"], json!([""]));
        assert_eq!(back["fields"][0]["mean"], json!(2.0));
    }

    #[test]
    fn test_next_index() {
        let mut schema = Schema::default();
        assert_eq!(schema.next_index(), Some(0));
        schema.fields.push(Field::new(3, "d"));
        schema.fields.push(Field::new(1, "b"));
        assert_eq!(schema.next_index(), Some(4));
        schema.fields.push(Field::new(u64::MAX, "last"));
        assert_eq!(schema.next_index(), None);
    }

    #[test]
    fn test_foreign_key_lookup() {
        let schema: Schema = serde_json::from_value(json!({
            "fields": [{"index": 0, "name": "a"}],
            "foreignKeys": [{
                "fields": "a",
                "fkey_uid": "k1",
                "reference": {"resource": "other", "fields": ["b"]}
            }]
        }))
        .unwrap();
        let key = schema.foreign_key("k1").unwrap();
        assert_eq!(key.fields, vec!["a"]);
        assert!(!schema.has_fkey_uid("k2"));
    }
}
