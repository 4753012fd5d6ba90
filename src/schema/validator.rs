//! Fail-fast schema-shape validation.
//!
//! The translator assumes a well-formed catalog: a relationship payload type
//! always has resolvable endpoints, every `@relation`/`@MutationMeta`
//! directive carries its required arguments, every referenced type exists.
//! Anything violating that contract is a developer error in the schema and
//! is rejected here, before any query is translated.

use super::catalog::SchemaCatalog;
use super::directives;
use super::errors::GraphSchemaError;
use super::types::{is_graphql_scalar, is_spatial_type, is_temporal_type, TypeKind};

/// Validate every type in the catalog. Returns the first violation found.
pub fn validate(catalog: &SchemaCatalog) -> Result<(), GraphSchemaError> {
    for t in catalog.types() {
        // Dangling references: every field's value type must be a scalar,
        // temporal/spatial, or declared type.
        for field in &t.fields {
            let name = field.type_ref.name.as_str();
            let known = is_graphql_scalar(name)
                || is_temporal_type(name)
                || is_spatial_type(name)
                || catalog.get(name).is_some();
            if !known {
                return Err(GraphSchemaError::DanglingTypeReference {
                    type_name: t.name.clone(),
                    field_name: field.name.clone(),
                    referenced: name.to_string(),
                });
            }
        }

        match t.kind {
            TypeKind::RelationshipPayload => {
                let relation = t.relation()?.ok_or_else(|| {
                    GraphSchemaError::MissingRelationDirective {
                        type_name: t.name.clone(),
                    }
                })?;
                for (end, node_type) in [("from", &relation.from), ("to", &relation.to)] {
                    if catalog.get(node_type).is_none() {
                        return Err(GraphSchemaError::DanglingTypeReference {
                            type_name: t.name.clone(),
                            field_name: end.to_string(),
                            referenced: node_type.clone(),
                        });
                    }
                }
                // Both endpoints, reflexive or not: `from`/`to`, their renamed
                // equivalents, or the two directed fields of a reflexive type.
                let endpoints = t.endpoint_fields(|name| catalog.is_node_like(name));
                if endpoints.len() < 2 {
                    let missing = if endpoints.is_empty() { "from" } else { "to" };
                    return Err(GraphSchemaError::MissingRelationshipEnd {
                        type_name: t.name.clone(),
                        end: missing.to_string(),
                    });
                }
            }
            TypeKind::Node => {
                for field in &t.fields {
                    // Node-valued fields need either @relation or @cypher.
                    if catalog.is_node_like(&field.type_ref.name)
                        && field.cypher_statement().is_none()
                        && field.relation(&t.name)?.is_none()
                    {
                        return Err(GraphSchemaError::with_context(
                            format!(
                                "field `{}.{}` references node type `{}` without @relation or @cypher",
                                t.name, field.name, field.type_ref.name
                            ),
                            "declare the traversal with @relation(name, direction)",
                        ));
                    }
                    // @MutationMeta arguments are checked wherever declared.
                    directives::mutation_meta(
                        &field.directives,
                        &format!("{}.{}", t.name, field.name),
                    )?;
                }
                for interface in &t.implements {
                    if catalog.get(interface).is_none() {
                        return Err(GraphSchemaError::DanglingTypeReference {
                            type_name: t.name.clone(),
                            field_name: "implements".to_string(),
                            referenced: interface.clone(),
                        });
                    }
                }
            }
            TypeKind::Union => {
                for member in &t.members {
                    if catalog.get(member).is_none() {
                        return Err(GraphSchemaError::DanglingTypeReference {
                            type_name: t.name.clone(),
                            field_name: "members".to_string(),
                            referenced: member.clone(),
                        });
                    }
                }
            }
            TypeKind::Interface | TypeKind::ScalarPayload => {}
        }
    }
    Ok(())
}
