//! Typed model of the augmented GraphQL schema.
//!
//! An external augmentation step turns user type definitions into the full
//! CRUD+relationship API; this crate consumes the result as a declarative
//! schema document. [`SchemaCatalog`] is the validated, immutable type map
//! the translator reads: node types, relationship payload types, interfaces,
//! unions, and their `@relation`/`@cypher`/`@MutationMeta`/`@search`
//! metadata, resolved once into closed sum types.

pub mod catalog;
pub mod config;
pub mod directives;
pub mod errors;
pub mod types;
pub mod validator;

pub use catalog::SchemaCatalog;
pub use directives::{Direction, Directive, FieldRelation, MutationMeta, TypeRelation};
pub use errors::GraphSchemaError;
pub use types::{FieldDef, FieldKind, SchemaType, TypeKind, TypeRef};
