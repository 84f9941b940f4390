//! Named actions over flat JSON parameters.
//!
//! Hosts that expose schema operations remotely call them by name with a
//! flat parameter object and get JSON back. [`Action`] is the closed set of
//! names; [`ActionDispatcher`] validates parameters and routes to
//! [`SchemaEngine`].

use std::fmt;
use std::str::FromStr;

use datapackager_inference::InferenceMode;
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::SchemaEngine;
use crate::error::{SchemaError, ValidationError, MISSING_VALUE};
use crate::fields::{required_index, FieldInput};
use crate::keys::ForeignKeyInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SchemaShow,
    FieldCreate,
    FieldUpdate,
    FieldDelete,
    FieldShow,
    PkeyShow,
    PkeyUpdate,
    PkeyDelete,
    FkeyShow,
    FkeyCreate,
    FkeyUpdate,
    FkeyDelete,
    SchemaInfer,
    NameSuggest,
}

impl Action {
    pub const ALL: [Action; 14] = [
        Action::SchemaShow,
        Action::FieldCreate,
        Action::FieldUpdate,
        Action::FieldDelete,
        Action::FieldShow,
        Action::PkeyShow,
        Action::PkeyUpdate,
        Action::PkeyDelete,
        Action::FkeyShow,
        Action::FkeyCreate,
        Action::FkeyUpdate,
        Action::FkeyDelete,
        Action::SchemaInfer,
        Action::NameSuggest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SchemaShow => "resource_schema_show",
            Action::FieldCreate => "resource_schema_field_create",
            Action::FieldUpdate => "resource_schema_field_update",
            Action::FieldDelete => "resource_schema_field_delete",
            Action::FieldShow => "resource_schema_field_show",
            Action::PkeyShow => "resource_schema_pkey_show",
            Action::PkeyUpdate => "resource_schema_pkey_update",
            Action::PkeyDelete => "resource_schema_pkey_delete",
            Action::FkeyShow => "resource_schema_fkey_show",
            Action::FkeyCreate => "resource_schema_fkey_create",
            Action::FkeyUpdate => "resource_schema_fkey_update",
            Action::FkeyDelete => "resource_schema_fkey_delete",
            Action::SchemaInfer => "resource_schema_infer",
            Action::NameSuggest => "resource_name_suggest",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown action: '{}'", s))
    }
}

// ============================================================================
// Parameter helpers
// ============================================================================

fn required_str(params: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    match params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ValidationError::single(key, MISSING_VALUE)),
    }
}

fn optional_str(params: &Map<String, Value>, key: &str) -> Option<String> {
    match params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// A lone string becomes a one-element list; absent or null is empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect(),
        Some(other) => vec![other.to_string()],
    }
}

fn foreign_key_input(params: &Map<String, Value>) -> ForeignKeyInput {
    ForeignKeyInput {
        fields: string_list(params.get("fields")),
        referenced_id: optional_str(params, "referenced_id").unwrap_or_default(),
        referenced_fields: string_list(params.get("referenced_field")),
        fkey_uid: optional_str(params, "fkey_uid"),
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

pub struct ActionDispatcher {
    engine: SchemaEngine,
}

impl ActionDispatcher {
    pub fn new(engine: SchemaEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SchemaEngine {
        &self.engine
    }

    /// Parse `name` and call it.
    pub fn call_named(&self, name: &str, params: &Map<String, Value>) -> Result<Value, SchemaError> {
        let action = name
            .parse::<Action>()
            .map_err(|e| ValidationError::single("action", e))?;
        self.call(action, params)
    }

    pub fn call(&self, action: Action, params: &Map<String, Value>) -> Result<Value, SchemaError> {
        debug!(action = %action, "Dispatching action");

        let engine = &self.engine;
        let resource_id = || required_str(params, "resource_id");

        let result = match action {
            Action::SchemaShow => serde_json::to_value(engine.schema_show(&resource_id()?)?)?,
            Action::FieldCreate => {
                let input = FieldInput::from_params(params);
                serde_json::to_value(engine.field_create(&resource_id()?, input)?)?
            }
            Action::FieldUpdate => {
                let input = FieldInput::from_params(params);
                serde_json::to_value(engine.field_update(&resource_id()?, input)?)?
            }
            Action::FieldDelete => {
                let index = required_index(params.get("index"))?;
                engine.field_delete(&resource_id()?, index)?;
                Value::Null
            }
            Action::FieldShow => {
                let index = required_index(params.get("index"))?;
                serde_json::to_value(engine.field_show(&resource_id()?, index)?)?
            }
            Action::PkeyShow => serde_json::to_value(engine.pkey_show(&resource_id()?)?)?,
            Action::PkeyUpdate => {
                let names = string_list(params.get("primary_key"));
                serde_json::to_value(engine.pkey_update(&resource_id()?, names)?)?
            }
            Action::PkeyDelete => {
                engine.pkey_delete(&resource_id()?)?;
                Value::Null
            }
            Action::FkeyShow => match optional_str(params, "fkey_uid") {
                Some(uid) => serde_json::to_value(engine.fkey_show(&resource_id()?, &uid)?)?,
                None => serde_json::to_value(engine.fkey_list(&resource_id()?)?)?,
            },
            Action::FkeyCreate => {
                serde_json::to_value(engine.fkey_create(&resource_id()?, foreign_key_input(params))?)?
            }
            Action::FkeyUpdate => {
                serde_json::to_value(engine.fkey_update(&resource_id()?, foreign_key_input(params))?)?
            }
            Action::FkeyDelete => {
                let uid = required_str(params, "fkey_uid")?;
                engine.fkey_delete(&resource_id()?, &uid)?;
                Value::Null
            }
            Action::SchemaInfer => {
                let mut options = engine.inference_options().clone();
                if let Some(mode) = optional_str(params, "mode") {
                    options.mode = mode
                        .parse::<InferenceMode>()
                        .map_err(|e| ValidationError::single("mode", e))?;
                }
                // Untrimmed, a literal tab is a valid separator
                if let Some(separator) = params
                    .get("separator")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                {
                    options.separator = Some(parse_separator(separator)?);
                }
                serde_json::to_value(engine.infer_with(&resource_id()?, &options)?)?
            }
            Action::NameSuggest => {
                let url = required_str(params, "url")?;
                Value::String(engine.suggest_name(&url)?)
            }
        };
        Ok(result)
    }
}

/// A separator is one ASCII character; `\t` and `tab` name the tab.
pub fn parse_separator(value: &str) -> Result<u8, ValidationError> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(ValidationError::single(
            "separator",
            "Must be a single ASCII character",
        )),
    }
}
