//! Closed-sum model of the augmented schema.
//!
//! The translator never inspects raw AST dictionaries: every type and field
//! is resolved into these structs once, at catalog build time, and every
//! downstream decision is a `match` on an explicit variant.

use serde::{Deserialize, Serialize};

use super::directives::{
    self, Directive, FieldRelation, TypeRelation,
};
use super::errors::GraphSchemaError;

/// Built-in GraphQL scalar names.
const GRAPHQL_SCALARS: &[&str] = &["ID", "String", "Int", "Float", "Boolean"];

/// Temporal types and their Cypher constructor functions.
pub const TEMPORAL_TYPES: &[(&str, &str)] = &[
    ("Date", "date"),
    ("Time", "time"),
    ("LocalTime", "localtime"),
    ("DateTime", "datetime"),
    ("LocalDateTime", "localdatetime"),
];

/// Spatial types and their Cypher constructor functions.
pub const SPATIAL_TYPES: &[(&str, &str)] = &[("Point", "point")];

pub fn is_graphql_scalar(type_name: &str) -> bool {
    GRAPHQL_SCALARS.contains(&type_name)
}

pub fn is_temporal_type(type_name: &str) -> bool {
    TEMPORAL_TYPES.iter().any(|(name, _)| *name == type_name)
}

pub fn is_spatial_type(type_name: &str) -> bool {
    SPATIAL_TYPES.iter().any(|(name, _)| *name == type_name)
}

/// Cypher constructor for a temporal/spatial type name (`DateTime` → `datetime`).
pub fn type_constructor(type_name: &str) -> Option<&'static str> {
    TEMPORAL_TYPES
        .iter()
        .chain(SPATIAL_TYPES.iter())
        .find(|(name, _)| *name == type_name)
        .map(|(_, ctor)| *ctor)
}

/// What a declared type is, resolved once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A graph node type (has a label, can be matched).
    Node,
    /// A relationship type carrying properties, declared with a type-level
    /// `@relation(name, from, to)`.
    RelationshipPayload,
    Interface,
    Union,
    /// An object type standing in for a scalar-ish value (temporal/spatial
    /// component payloads).
    ScalarPayload,
}

/// A field's declared type with its List/NonNull wrappers recorded.
///
/// Wrappers decide `head()`/`collect()` semantics in generated Cypher, so
/// they are unwrapped exactly once, here, and consulted as plain booleans
/// everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub non_null: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            list: false,
            non_null: false,
        }
    }

    pub fn list_of(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            list: true,
            non_null: false,
        }
    }
}

/// One declared field on a schema type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Declared arguments. Only root operation fields (on the `Query` /
    /// `Mutation` types) carry these; the mutation translator consults them
    /// to tell property arguments from nested input objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<FieldDef>,
}

impl FieldDef {
    pub fn relation(&self, type_name: &str) -> Result<Option<FieldRelation>, GraphSchemaError> {
        directives::field_relation(
            &self.directives,
            &format!("{}.{}", type_name, self.name),
        )
    }

    pub fn cypher_statement(&self) -> Option<&str> {
        directives::cypher_statement(&self.directives)
    }

    pub fn is_id(&self) -> bool {
        directives::get_directive(&self.directives, "id").is_some()
    }

    pub fn has_directive(&self, name: &str) -> bool {
        directives::get_directive(&self.directives, name).is_some()
    }
}

/// A type in the augmented schema.
///
/// Fields are kept in declaration order: reflexive relationship types derive
/// their `from`/`to` direction positionally (first directed field is the
/// incoming end, second the outgoing end).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaType {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Interfaces this (node) type implements.
    #[serde(default)]
    pub implements: Vec<String>,
    /// Union member type names.
    #[serde(default)]
    pub members: Vec<String>,
    /// Concrete node types deriving from this interface/union. Precomputed at
    /// catalog build; empty for other kinds.
    #[serde(skip)]
    pub derived_types: Vec<String>,
}

impl SchemaType {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Type-level `@relation(name, from, to)` for relationship payload types.
    pub fn relation(&self) -> Result<Option<TypeRelation>, GraphSchemaError> {
        directives::type_relation(&self.directives, &self.name)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }

    /// The `from`/`to` endpoint fields of a relationship payload type, i.e.
    /// the fields whose type is a declared node/interface type. Returned in
    /// declaration order.
    pub fn endpoint_fields<'a>(
        &'a self,
        is_node_type: impl Fn(&str) -> bool,
    ) -> Vec<&'a FieldDef> {
        self.fields
            .iter()
            .filter(|f| is_node_type(&f.type_ref.name))
            .collect()
    }

}

/// Resolved classification of one selected field, computed against the
/// catalog before emission.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Plain scalar or enum property (`.name` shorthand).
    Scalar,
    /// The `_id` meta field (`ID(variable)`).
    IdMeta,
    /// Field with a `@cypher` directive (computed via apoc).
    Cypher,
    /// Temporal object value (`Date`, `DateTime`, ...).
    Temporal,
    /// Spatial object value (`Point`).
    Spatial,
    /// `@relation`-annotated field whose value type is a node type (or
    /// interface/union over node types).
    NodeRelation(FieldRelation),
    /// Field whose value type is itself a relationship payload type.
    PayloadRelation(TypeRelation),
    /// Endpoint field (`from`/`to` or their renamed equivalents) on a
    /// relationship payload type.
    Endpoint,
}
