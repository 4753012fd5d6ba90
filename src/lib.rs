//! graphcypher - GraphQL-to-Cypher translation engine
//!
//! This crate turns resolved GraphQL operations into single parameterized
//! Cypher statements:
//! - Declarative augmented-schema catalog (YAML/JSON) with fail-fast validation
//! - Selection-set compilation to Cypher map projections
//! - Filter-argument compilation to parameter-referencing predicates
//! - Query, mutation, and nested-mutation translation
//!
//! The translator is pure and synchronous: no I/O, no shared mutable state,
//! byte-identical output for identical input.

pub mod schema;
pub mod translate;
pub mod utils;
pub mod values;

pub use schema::SchemaCatalog;
pub use translate::{translate, CypherStatement, Operation, ResolutionContext, Selection};
