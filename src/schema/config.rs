//! Schema document loading.
//!
//! The augmented schema is produced by an external schema-generation step and
//! handed to this crate as a declarative document (YAML or JSON). This module
//! deserializes the document and runs it through the validator, producing a
//! [`SchemaCatalog`] the translator can trust blindly.
//!
//! Schema documents have the following structure:
//!
//! ```yaml
//! types:
//!   - name: Movie
//!     kind: node
//!     fields:
//!       - name: movieId
//!         type: { name: ID }
//!         directives: [{ name: id }]
//!       - name: title
//!         type: { name: String, non_null: true }
//!       - name: actors
//!         type: { name: Person, list: true }
//!         directives:
//!           - name: relation
//!             args: { name: ACTED_IN, direction: IN }
//!   - name: Rated
//!     kind: relationship_payload
//!     directives:
//!       - name: relation
//!         args: { name: RATED, from: User, to: Movie }
//!     fields:
//!       - name: from
//!         type: { name: User }
//!       - name: rating
//!         type: { name: Int }
//!       - name: to
//!         type: { name: Movie }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::catalog::SchemaCatalog;
use super::errors::GraphSchemaError;
use super::types::SchemaType;
use super::validator;

/// Top-level schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub version: Option<String>,
    pub types: Vec<SchemaType>,
}

impl SchemaDocument {
    pub fn from_yaml(source: &str) -> Result<Self, GraphSchemaError> {
        serde_yaml::from_str(source).map_err(|e| GraphSchemaError::DocumentParse {
            error: e.to_string(),
        })
    }

    pub fn from_json(source: &str) -> Result<Self, GraphSchemaError> {
        serde_json::from_str(source).map_err(|e| GraphSchemaError::DocumentParse {
            error: e.to_string(),
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, GraphSchemaError> {
        let source = fs::read_to_string(path.as_ref()).map_err(|e| {
            GraphSchemaError::with_context(
                format!("failed to read schema document: {}", e),
                path.as_ref().display().to_string(),
            )
        })?;
        Self::from_yaml(&source)
    }
}

impl SchemaCatalog {
    /// Load and validate a catalog from a YAML schema document.
    pub fn from_yaml(source: &str) -> Result<SchemaCatalog, GraphSchemaError> {
        Self::from_document(SchemaDocument::from_yaml(source)?)
    }

    /// Load and validate a catalog from a JSON schema document.
    pub fn from_json(source: &str) -> Result<SchemaCatalog, GraphSchemaError> {
        Self::from_document(SchemaDocument::from_json(source)?)
    }

    /// Build a validated catalog from an already-deserialized document.
    pub fn from_document(document: SchemaDocument) -> Result<SchemaCatalog, GraphSchemaError> {
        let catalog = SchemaCatalog::build(document.types)?;
        validator::validate(&catalog)?;
        Ok(catalog)
    }
}
