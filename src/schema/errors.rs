//! # Schema Catalog Error Types
//!
//! Error handling for augmented-schema loading and validation.
//!
//! ## Error Categories
//!
//! - **Shape Errors**: a type or directive violating the augmented-schema
//!   contract (relationship type without `from`/`to`, `@MutationMeta` missing
//!   an argument, ...)
//! - **Reference Errors**: a field or directive naming a type that does not
//!   exist in the catalog
//! - **Configuration Errors**: document parsing failures during catalog
//!   loading
//!
//! All of these are fatal developer errors. The translator assumes a
//! validated catalog, so every malformed shape must be rejected here, at load
//! time, with enough context to find the offending declaration.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphSchemaError {
    #[error("No type named `{type_name}` in the schema catalog")]
    UnknownType { type_name: String },
    #[error("Type `{type_name}` has no field `{field_name}`")]
    UnknownField {
        type_name: String,
        field_name: String,
    },
    #[error("Relationship type `{type_name}` is missing its `{end}` field (a relationship payload type must declare both endpoints)")]
    MissingRelationshipEnd { type_name: String, end: String },
    #[error("Relationship type `{type_name}` is missing the type-level @relation directive")]
    MissingRelationDirective { type_name: String },
    #[error("Directive @{directive} on `{location}` is missing required argument `{argument}`")]
    MissingDirectiveArgument {
        directive: String,
        location: String,
        argument: String,
    },
    #[error("Field `{type_name}.{field_name}` references undeclared type `{referenced}`")]
    DanglingTypeReference {
        type_name: String,
        field_name: String,
        referenced: String,
    },
    #[error("@search index `{index}` is declared on more than one type ({first} and {second}); index names must be unique")]
    AmbiguousSearchIndex {
        index: String,
        first: String,
        second: String,
    },
    #[error("@search is not supported on list field `{type_name}.{field_name}`")]
    SearchOnListField {
        type_name: String,
        field_name: String,
    },
    #[error("Duplicate type declaration `{type_name}` in schema document")]
    DuplicateType { type_name: String },
    #[error("Failed to parse schema document: {error}")]
    DocumentParse { error: String },
    #[error("Schema error: {0}")]
    Other(String),
}

impl GraphSchemaError {
    /// Create an [`GraphSchemaError::Other`] with operational context.
    pub fn with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        GraphSchemaError::Other(format!("{}\n  Context: {}", message.into(), context.into()))
    }
}
