//! Primary and foreign keys.
//!
//! Keys refer to fields by name. A foreign key may only reference a resource
//! of the same dataset, and its local and referenced field lists must line up
//! one to one.

use std::collections::BTreeSet;

use tracing::info;
use uuid::Uuid;

use crate::engine::SchemaEngine;
use crate::error::{SchemaError, ValidationError, MISSING_VALUE};
use crate::resource::{Resource, StoreError};
use crate::schema::{ForeignKey, Reference, Schema};
use crate::store::parse_schema;

/// A foreign key as requested by a caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKeyInput {
    pub fields: Vec<String>,
    pub referenced_id: String,
    pub referenced_fields: Vec<String>,
    /// Generated when absent on create; required on update.
    pub fkey_uid: Option<String>,
}

impl ForeignKeyInput {
    pub fn new(
        fields: impl IntoIterator<Item = impl Into<String>>,
        referenced_id: impl Into<String>,
        referenced_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            referenced_id: referenced_id.into(),
            referenced_fields: referenced_fields.into_iter().map(Into::into).collect(),
            fkey_uid: None,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.fkey_uid = Some(uid.into());
        self
    }
}

fn missing_fields<'a>(schema: &Schema, names: &'a [String]) -> Vec<&'a str> {
    names
        .iter()
        .filter(|name| schema.field_by_name(name).is_none())
        .map(String::as_str)
        .collect()
}

fn generate_uid(schema: &Schema) -> String {
    loop {
        let uid = Uuid::new_v4().to_string();
        if !schema.has_fkey_uid(&uid) {
            return uid;
        }
    }
}

/// Names appearing more than once, each reported once, in sorted order.
fn repeated(names: &[String]) -> BTreeSet<&str> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .filter(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
        .collect()
}

impl SchemaEngine {
    // ========================================================================
    // Primary key
    // ========================================================================

    /// `resource_schema_pkey_show`: empty when no primary key is set.
    pub fn pkey_show(&self, resource_id: &str) -> Result<Vec<String>, SchemaError> {
        Ok(self.store.show(resource_id)?.primary_key.unwrap_or_default())
    }

    /// `resource_schema_pkey_update`: every name must be a current field.
    pub fn pkey_update(&self, resource_id: &str, names: Vec<String>) -> Result<Vec<String>, SchemaError> {
        let names = self.store.mutate(resource_id, |_, schema| {
            let mut errors = ValidationError::new();
            if names.is_empty() {
                errors.add("primary_key", MISSING_VALUE);
            }
            for name in missing_fields(schema, &names) {
                errors.add("primary_key", format!("Field '{}' does not exist", name));
            }
            for name in repeated(&names) {
                errors.add("primary_key", format!("Field '{}' is listed more than once", name));
            }
            errors.into_result()?;

            schema.primary_key = Some(names.clone());
            Ok(names)
        })?;
        info!(resource_id, primary_key = ?names, "Primary key updated");
        Ok(names)
    }

    /// `resource_schema_pkey_delete`: safe when there is no primary key.
    pub fn pkey_delete(&self, resource_id: &str) -> Result<(), SchemaError> {
        self.store.mutate(resource_id, |_, schema| {
            schema.primary_key = None;
            Ok(())
        })
    }

    // ========================================================================
    // Foreign keys
    // ========================================================================

    /// `resource_schema_fkey_show` for one uid.
    pub fn fkey_show(&self, resource_id: &str, fkey_uid: &str) -> Result<ForeignKey, SchemaError> {
        self.store
            .show(resource_id)?
            .foreign_key(fkey_uid)
            .cloned()
            .ok_or_else(|| unknown_uid(fkey_uid).into())
    }

    /// `resource_schema_fkey_show` without a uid: every foreign key.
    pub fn fkey_list(&self, resource_id: &str) -> Result<Vec<ForeignKey>, SchemaError> {
        Ok(self.store.show(resource_id)?.foreign_keys.unwrap_or_default())
    }

    /// `resource_schema_fkey_create`. A supplied uid must be unused.
    pub fn fkey_create(&self, resource_id: &str, input: ForeignKeyInput) -> Result<ForeignKey, SchemaError> {
        let key = self.store.mutate(resource_id, |resource, schema| {
            let mut errors = ValidationError::new();
            if let Some(uid) = input.fkey_uid.as_deref() {
                if uid.trim().is_empty() {
                    errors.add("fkey_uid", MISSING_VALUE);
                } else if schema.has_fkey_uid(uid) {
                    errors.add("fkey_uid", format!("Foreign key uid '{}' is already in use", uid));
                }
            }
            let reference = self.check_foreign_key(resource, schema, &input, &mut errors)?;
            errors.into_result()?;

            let key = ForeignKey {
                fields: input.fields.clone(),
                fkey_uid: input.fkey_uid.clone().unwrap_or_else(|| generate_uid(schema)),
                reference,
            };
            schema.foreign_keys.get_or_insert_with(Vec::new).push(key.clone());
            Ok(key)
        })?;
        info!(resource_id, fkey_uid = %key.fkey_uid, "Foreign key created");
        Ok(key)
    }

    /// `resource_schema_fkey_update`: drop any key with the uid, then append
    /// the new definition.
    pub fn fkey_update(&self, resource_id: &str, input: ForeignKeyInput) -> Result<ForeignKey, SchemaError> {
        let uid = match input.fkey_uid.as_deref().map(str::trim) {
            Some(uid) if !uid.is_empty() => uid.to_string(),
            _ => return Err(ValidationError::single("fkey_uid", MISSING_VALUE).into()),
        };

        let key = self.store.mutate(resource_id, |resource, schema| {
            let mut errors = ValidationError::new();
            let reference = self.check_foreign_key(resource, schema, &input, &mut errors)?;
            errors.into_result()?;

            let key = ForeignKey {
                fields: input.fields.clone(),
                fkey_uid: uid.clone(),
                reference,
            };
            let keys = schema.foreign_keys.get_or_insert_with(Vec::new);
            keys.retain(|k| k.fkey_uid != uid);
            keys.push(key.clone());
            Ok(key)
        })?;
        info!(resource_id, fkey_uid = %key.fkey_uid, "Foreign key updated");
        Ok(key)
    }

    /// `resource_schema_fkey_delete`. An unknown uid fails.
    pub fn fkey_delete(&self, resource_id: &str, fkey_uid: &str) -> Result<(), SchemaError> {
        self.store.mutate(resource_id, |_, schema| {
            let keys = schema.foreign_keys.get_or_insert_with(Vec::new);
            let before = keys.len();
            keys.retain(|k| k.fkey_uid != fkey_uid);
            if keys.len() == before {
                return Err(unknown_uid(fkey_uid).into());
            }
            if keys.is_empty() {
                schema.foreign_keys = None;
            }
            Ok(())
        })?;
        info!(resource_id, fkey_uid, "Foreign key deleted");
        Ok(())
    }

    /// Validate everything but the uid and build the reference. Problems go
    /// into `errors`; only store failures return early.
    fn check_foreign_key(
        &self,
        resource: &Resource,
        schema: &Schema,
        input: &ForeignKeyInput,
        errors: &mut ValidationError,
    ) -> Result<Reference, SchemaError> {
        if input.fields.is_empty() {
            errors.add("fields", MISSING_VALUE);
        }
        for name in missing_fields(schema, &input.fields) {
            errors.add("fields", format!("Field '{}' does not exist", name));
        }

        if input.referenced_fields.is_empty() {
            errors.add("referenced_field", MISSING_VALUE);
        } else if input.referenced_fields.len() != input.fields.len() {
            errors.add(
                "referenced_field",
                format!(
                    "Expected {} referenced field(s) to match 'fields', got {}",
                    input.fields.len(),
                    input.referenced_fields.len()
                ),
            );
        }

        let referenced_id = input.referenced_id.trim();
        let referenced = if referenced_id.is_empty() {
            errors.add("referenced_id", MISSING_VALUE);
            None
        } else if referenced_id == resource.id {
            Some((resource.clone(), schema.clone()))
        } else {
            match self.store.resources().get_resource(referenced_id) {
                Ok(other) => {
                    let other_schema = parse_schema(&other)?;
                    Some((other, other_schema))
                }
                Err(StoreError::NotFound(_)) => {
                    errors.add("referenced_id", "Not found: Resource");
                    None
                }
                Err(e) => return Err(e.into()),
            }
        };

        let Some((other, other_schema)) = referenced else {
            return Ok(Reference {
                resource: String::new(),
                fields: input.referenced_fields.clone(),
            });
        };

        if other.package_id != resource.package_id {
            errors.add(
                "referenced_id",
                "Referenced resource must belong to the same dataset",
            );
        }
        for name in missing_fields(&other_schema, &input.referenced_fields) {
            errors.add(
                "referenced_field",
                format!("Field '{}' does not exist in the referenced resource", name),
            );
        }

        Ok(Reference {
            resource: other.name.clone().unwrap_or_else(|| other.id.clone()),
            fields: input.referenced_fields.clone(),
        })
    }
}

fn unknown_uid(uid: &str) -> ValidationError {
    ValidationError::single("fkey_uid", format!("No foreign key with uid '{}'", uid))
}
