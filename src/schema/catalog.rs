//! The schema catalog: every declared type, indexed by name, with
//! interface/union derived types and full-text indexes precomputed.

use std::collections::HashMap;

use super::directives;
use super::errors::GraphSchemaError;
use super::types::{
    is_graphql_scalar, is_spatial_type, is_temporal_type, FieldDef, FieldKind, SchemaType,
    TypeKind,
};

/// Validated, immutable type map for one augmented schema.
///
/// Built once (see [`super::config`]) and shared by reference across
/// translations; all lookups are read-only.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    types: HashMap<String, SchemaType>,
    /// Full-text index name → owning node type name.
    search_indexes: HashMap<String, String>,
}

impl SchemaCatalog {
    /// Assemble a catalog from declared types. Precomputes derived-type lists
    /// and the search-index registry; rejects duplicate types and ambiguous
    /// indexes. Shape validation beyond that lives in [`super::validator`].
    pub fn build(declared: Vec<SchemaType>) -> Result<Self, GraphSchemaError> {
        let mut types: HashMap<String, SchemaType> = HashMap::new();
        for t in declared {
            if types.contains_key(&t.name) {
                return Err(GraphSchemaError::DuplicateType { type_name: t.name });
            }
            types.insert(t.name.clone(), t);
        }

        // Interface derived types: every node type listing the interface in
        // `implements`. Union derived types: the declared members.
        let mut derived: HashMap<String, Vec<String>> = HashMap::new();
        for t in types.values() {
            if t.kind == TypeKind::Node {
                for interface in &t.implements {
                    derived
                        .entry(interface.clone())
                        .or_default()
                        .push(t.name.clone());
                }
            }
            if t.kind == TypeKind::Union {
                derived.insert(t.name.clone(), t.members.clone());
            }
        }
        for (name, mut concrete) in derived {
            concrete.sort();
            if let Some(t) = types.get_mut(&name) {
                t.derived_types = concrete;
            }
        }

        let mut search_indexes: HashMap<String, String> = HashMap::new();
        let names: Vec<String> = types.keys().cloned().collect();
        for name in names {
            let t = &types[&name];
            if t.kind != TypeKind::Node {
                continue;
            }
            for field in &t.fields {
                let Some(index) = directives::search_index(&field.directives) else {
                    continue;
                };
                if field.type_ref.list {
                    return Err(GraphSchemaError::SearchOnListField {
                        type_name: t.name.clone(),
                        field_name: field.name.clone(),
                    });
                }
                let index_name = index
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}Search", t.name));
                if let Some(owner) = search_indexes.get(&index_name) {
                    if owner != &t.name {
                        return Err(GraphSchemaError::AmbiguousSearchIndex {
                            index: index_name,
                            first: owner.clone(),
                            second: t.name.clone(),
                        });
                    }
                } else {
                    search_indexes.insert(index_name, t.name.clone());
                }
            }
        }

        Ok(SchemaCatalog {
            types,
            search_indexes,
        })
    }

    pub fn get(&self, name: &str) -> Option<&SchemaType> {
        self.types.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&SchemaType, GraphSchemaError> {
        self.types.get(name).ok_or_else(|| GraphSchemaError::UnknownType {
            type_name: name.to_string(),
        })
    }

    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.values()
    }

    /// Full-text index declared by a node type, if any.
    pub fn search_index_for(&self, type_name: &str) -> Option<&str> {
        self.search_indexes
            .iter()
            .find(|(_, owner)| owner.as_str() == type_name)
            .map(|(index, _)| index.as_str())
    }

    /// Whether `name` refers to a node, interface, or union type — i.e. a
    /// value the graph can bind a node variable to.
    pub fn is_node_like(&self, name: &str) -> bool {
        matches!(
            self.types.get(name).map(|t| t.kind),
            Some(TypeKind::Node | TypeKind::Interface | TypeKind::Union)
        )
    }

    pub fn is_relationship_payload(&self, name: &str) -> bool {
        matches!(
            self.types.get(name).map(|t| t.kind),
            Some(TypeKind::RelationshipPayload)
        )
    }

    /// Classify one selected field of `parent`. The classification drives
    /// every emission decision in the selection-set and filter compilers.
    pub fn classify_field<'t>(
        &self,
        parent: &'t SchemaType,
        field_name: &str,
    ) -> Result<(Option<&'t FieldDef>, FieldKind), GraphSchemaError> {
        if field_name == "_id" {
            return Ok((None, FieldKind::IdMeta));
        }
        let field = parent.field(field_name).ok_or_else(|| {
            GraphSchemaError::UnknownField {
                type_name: parent.name.clone(),
                field_name: field_name.to_string(),
            }
        })?;
        let kind = self.classify(parent, field)?;
        Ok((Some(field), kind))
    }

    fn classify(
        &self,
        parent: &SchemaType,
        field: &FieldDef,
    ) -> Result<FieldKind, GraphSchemaError> {
        if field.cypher_statement().is_some() {
            return Ok(FieldKind::Cypher);
        }
        let type_name = field.type_ref.name.as_str();
        if is_temporal_type(type_name) {
            return Ok(FieldKind::Temporal);
        }
        if is_spatial_type(type_name) {
            return Ok(FieldKind::Spatial);
        }
        if is_graphql_scalar(type_name) {
            return Ok(FieldKind::Scalar);
        }
        match self.types.get(type_name).map(|t| t.kind) {
            Some(TypeKind::RelationshipPayload) => {
                let target = &self.types[type_name];
                let relation = target.relation()?.ok_or_else(|| {
                    GraphSchemaError::MissingRelationDirective {
                        type_name: target.name.clone(),
                    }
                })?;
                Ok(FieldKind::PayloadRelation(relation))
            }
            Some(TypeKind::Node | TypeKind::Interface | TypeKind::Union)
                if parent.kind == TypeKind::RelationshipPayload =>
            {
                Ok(FieldKind::Endpoint)
            }
            Some(TypeKind::Node | TypeKind::Interface | TypeKind::Union) => {
                let relation = field.relation(&parent.name)?.ok_or_else(|| {
                    GraphSchemaError::with_context(
                        format!(
                            "field `{}.{}` of node type `{}` has no @relation directive",
                            parent.name, field.name, type_name
                        ),
                        "node-valued fields must declare how to traverse to the value",
                    )
                })?;
                Ok(FieldKind::NodeRelation(relation))
            }
            Some(TypeKind::ScalarPayload) | None => Ok(FieldKind::Scalar),
        }
    }
}
