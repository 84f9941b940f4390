//! Resource Schema Engine
//!
//! Create, show, update and delete the JSON Table Schema embedded in a
//! resource record, plus its primary and foreign keys.
//!
//! The schema lives as a JSON string in the resource's `schema` attribute.
//! Every operation reads that string, changes the document in memory and
//! writes the whole document back. Nothing is written unless validation
//! passes.
//!
//! # Modules
//!
//! - [`resource`]: the [`ResourceStore`] collaborator and its record type
//! - [`memory`], [`file_store`]: in-memory and JSON-file stores
//! - [`store`]: [`SchemaStore`], string ⇄ [`Schema`] with per-resource locking
//! - [`fields`], [`keys`]: field CRUD and key operations on [`SchemaEngine`]
//! - [`actions`]: name-addressed dispatch over flat JSON parameters
//! - [`naming`]: resource names derived from URLs

pub mod actions;
pub mod engine;
pub mod error;
pub mod fields;
pub mod file_store;
pub mod keys;
pub mod memory;
pub mod naming;
pub mod resource;
pub mod schema;
pub mod store;

pub use actions::{Action, ActionDispatcher};
pub use engine::SchemaEngine;
pub use error::{SchemaError, ValidationError, MISSING_VALUE};
pub use fields::{FieldInput, DUPLICATE_INDEX, DUPLICATE_NAME, NO_NEXT_INDEX};
pub use file_store::JsonFileResourceStore;
pub use keys::ForeignKeyInput;
pub use memory::MemoryResourceStore;
pub use naming::{suggest_resource_name, NamingError};
pub use resource::{Resource, ResourceStore, ResourceUpdate, StoreError};
pub use schema::{Field, ForeignKey, Reference, Schema};
pub use store::SchemaStore;
