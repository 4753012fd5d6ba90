//! Typed directive model for the augmented schema.
//!
//! Directives arrive as loosely-shaped `(name, args)` pairs in the schema
//! document; this module gives them closed types so the translator never
//! re-derives directive semantics from raw argument maps. Lookup is a
//! name-keyed linear scan — directive lists are tiny (≤5 entries).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::GraphSchemaError;

/// One declared directive, as loaded from the schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Map<String, Value>,
}

impl Directive {
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub fn string_argument(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }

    fn required_string(&self, name: &str, location: &str) -> Result<String, GraphSchemaError> {
        self.string_argument(name).map(str::to_string).ok_or_else(|| {
            GraphSchemaError::MissingDirectiveArgument {
                directive: self.name.clone(),
                location: location.to_string(),
                argument: name.to_string(),
            }
        })
    }
}

/// Find a directive by name.
pub fn get_directive<'a>(directives: &'a [Directive], name: &str) -> Option<&'a Directive> {
    directives.iter().find(|d| d.name == name)
}

/// Relationship traversal direction, from a field-level `@relation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Arrow pair for a path pattern: `(left)<-[..]-(right)` for IN,
    /// `(left)-[..]->(right)` for OUT, undirected when unspecified.
    pub fn arrows(direction: Option<Direction>) -> (&'static str, &'static str) {
        match direction {
            Some(Direction::In) => ("<-", "-"),
            Some(Direction::Out) => ("-", "->"),
            None => ("-", "-"),
        }
    }

}

/// Field-level `@relation(name, direction)` on a node type's field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRelation {
    /// Relationship type label in the graph (e.g. `ACTED_IN`).
    pub name: String,
    pub direction: Option<Direction>,
}

/// Type-level `@relation(name, from, to)` on a relationship payload type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRelation {
    pub name: String,
    pub from: String,
    pub to: String,
}

impl TypeRelation {
    /// A relationship type connecting a node type to itself.
    pub fn is_reflexive(&self) -> bool {
        self.from == self.to
    }
}

/// `@MutationMeta(relationship, from, to)` on a relationship mutation field.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationMeta {
    pub relationship: String,
    pub from: String,
    pub to: String,
}

/// Parse the field-level `@relation` off a directive list.
pub fn field_relation(
    directives: &[Directive],
    location: &str,
) -> Result<Option<FieldRelation>, GraphSchemaError> {
    let Some(directive) = get_directive(directives, "relation") else {
        return Ok(None);
    };
    let name = directive.required_string("name", location)?;
    let direction = match directive.string_argument("direction") {
        Some("IN") => Some(Direction::In),
        Some("OUT") => Some(Direction::Out),
        _ => None,
    };
    Ok(Some(FieldRelation { name, direction }))
}

/// Parse the type-level `@relation(name, from, to)` off a directive list.
pub fn type_relation(
    directives: &[Directive],
    location: &str,
) -> Result<Option<TypeRelation>, GraphSchemaError> {
    let Some(directive) = get_directive(directives, "relation") else {
        return Ok(None);
    };
    // A type-level @relation always carries endpoints; a bare name here is a
    // field-level directive that landed on the wrong location.
    Ok(Some(TypeRelation {
        name: directive.required_string("name", location)?,
        from: directive.required_string("from", location)?,
        to: directive.required_string("to", location)?,
    }))
}

/// Parse `@MutationMeta` off a mutation field's directive list.
pub fn mutation_meta(
    directives: &[Directive],
    location: &str,
) -> Result<Option<MutationMeta>, GraphSchemaError> {
    let Some(directive) = get_directive(directives, "MutationMeta") else {
        return Ok(None);
    };
    Ok(Some(MutationMeta {
        relationship: directive.required_string("relationship", location)?,
        from: directive.required_string("from", location)?,
        to: directive.required_string("to", location)?,
    }))
}

/// The statement string of a `@cypher` directive, if present.
pub fn cypher_statement(directives: &[Directive]) -> Option<&str> {
    get_directive(directives, "cypher").and_then(|d| d.string_argument("statement"))
}

/// The index name of a `@search` directive; `None` when the directive is
/// absent, `Some(None)` when present without an explicit index name.
pub fn search_index(directives: &[Directive]) -> Option<Option<&str>> {
    get_directive(directives, "search").map(|d| d.string_argument("index"))
}
