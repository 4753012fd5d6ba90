//! Selection-set compiler.
//!
//! Recursively walks a GraphQL selection set against a schema type and
//! produces a Cypher map-projection fragment (`{ .field, nested: [...] }`),
//! accumulating parameters for any arguments encountered on nested fields.
//! Pure function of (schema type, selection set, ambient variable name);
//! recursion depth is bounded by the query's own nesting.

pub mod cypher_field;
pub mod fragments;
pub mod temporal;

use serde_json::{Map, Value};

use crate::schema::directives::Direction;
use crate::schema::types::TypeKind;
use crate::schema::{FieldDef, FieldKind, GraphSchemaError, SchemaType, TypeRelation};
use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::translate::filter::operators::parse_filter_key;
use crate::translate::filter::{compile_filter, payload_direction};
use crate::translate::Selection;
use crate::utils::naming::{
    child_variable, derived_types_param, escape, param_name, relation_variable,
};

/// What `FRAGMENT_TYPE` to inject into a projection.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionTag {
    /// Concrete type: no pseudo-field needed.
    None,
    /// Fragment-narrowed projection: a literal type name.
    Literal(String),
    /// Abstract selection without fragments: derive from the node's labels.
    Derived,
}

/// List-field arguments the compiler consumes itself.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub filter: Option<Map<String, Value>>,
    pub order_by: Vec<String>,
    pub first: Option<i64>,
    pub offset: Option<i64>,
}

impl ListArgs {
    pub fn parse(
        selection: &Selection,
        variables: &Map<String, Value>,
    ) -> Result<Self, TranslationError> {
        let mut args = ListArgs::default();
        if let Some(filter) = selection.arg("filter", variables)? {
            let object = filter.as_object().cloned().ok_or_else(|| {
                TranslationError::MalformedFilter {
                    field: selection.name.clone(),
                    reason: "filter must be an input object".to_string(),
                }
            })?;
            if !object.is_empty() {
                args.filter = Some(object);
            }
        }
        if let Some(order) = selection.arg("orderBy", variables)? {
            args.order_by = match order {
                Value::String(s) => vec![s],
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                _ => vec![],
            };
        }
        args.first = selection
            .arg("first", variables)?
            .and_then(|v| v.as_i64());
        args.offset = selection
            .arg("offset", variables)?
            .and_then(|v| v.as_i64());
        Ok(args)
    }
}

/// Compile a full map-projection body (`{ ... }`) for `selections` against
/// `schema_type`, with `variable` bound to the projected entity.
pub fn compile_projection(
    ctx: &mut TranslationContext,
    schema_type: &SchemaType,
    variable: &str,
    selections: &[Selection],
    variables: &Map<String, Value>,
    tag: ProjectionTag,
) -> Result<String, TranslationError> {
    let mut entries = Vec::new();

    match tag {
        ProjectionTag::None => {}
        ProjectionTag::Literal(type_name) => {
            entries.push(format!("FRAGMENT_TYPE: \"{}\"", type_name));
        }
        ProjectionTag::Derived => {
            let param = derived_types_param(&schema_type.name);
            ctx.add_named_param(
                param.clone(),
                Value::Array(
                    schema_type
                        .derived_types
                        .iter()
                        .map(|t| Value::String(t.clone()))
                        .collect(),
                ),
            );
            entries.push(format!(
                "FRAGMENT_TYPE: head([ x IN labels({}) WHERE x IN ${} ])",
                escape(variable),
                param
            ));
        }
    }

    for selection in selections {
        if selection.name == "__typename" {
            continue;
        }
        entries.push(compile_field(ctx, schema_type, variable, selection, variables)?);
    }

    if entries.is_empty() {
        Ok("{ }".to_string())
    } else {
        Ok(format!("{{ {} }}", entries.join(", ")))
    }
}

/// One selected field → one map-projection entry.
fn compile_field(
    ctx: &mut TranslationContext,
    parent: &SchemaType,
    variable: &str,
    selection: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let catalog = ctx.catalog;
    let (field, kind) = catalog.classify_field(parent, &selection.name)?;
    let key = selection.output_key();
    let unknown = || {
        TranslationError::Schema(GraphSchemaError::UnknownField {
            type_name: parent.name.clone(),
            field_name: selection.name.clone(),
        })
    };

    match kind {
        FieldKind::IdMeta => Ok(format!("{}: ID({})", key, escape(variable))),
        FieldKind::Scalar => {
            if key == selection.name {
                Ok(format!(".{}", selection.name))
            } else {
                Ok(format!("{}: {}.{}", key, escape(variable), selection.name))
            }
        }
        FieldKind::Temporal | FieldKind::Spatial => Ok(temporal::compile_temporal_field(
            field.ok_or_else(unknown)?,
            variable,
            selection,
        )),
        FieldKind::Cypher => cypher_field::compile_cypher_field(
            ctx,
            field.ok_or_else(unknown)?,
            variable,
            selection,
            variables,
        ),
        FieldKind::NodeRelation(relation) => {
            let field = field.ok_or_else(unknown)?;
            let fragment = compile_node_relation_field(
                ctx,
                field,
                &relation.name,
                relation.direction,
                variable,
                selection,
                variables,
            )?;
            Ok(format!("{}: {}", key, fragment))
        }
        FieldKind::PayloadRelation(relation) => {
            let field = field.ok_or_else(unknown)?;
            let fragment = compile_payload_relation_field(
                ctx, parent, field, &relation, variable, selection, variables,
            )?;
            Ok(format!("{}: {}", key, fragment))
        }
        FieldKind::Endpoint => {
            // Endpoint fields are compiled by the payload path, which has the
            // pattern in scope; a bare endpoint projection has no traversal.
            Err(TranslationError::UnsupportedArgument {
                field: selection.name.clone(),
                reason: "endpoint fields can only be selected inside their relationship field"
                    .to_string(),
            })
        }
    }
}

/// `@relation`-field comprehension:
/// `[(parent)-[:REL]->(child:Label) WHERE ... | child { ... }]`, wrapped in
/// ordering/slice/head as the arguments and return cardinality demand.
#[allow(clippy::too_many_arguments)]
fn compile_node_relation_field(
    ctx: &mut TranslationContext,
    field: &FieldDef,
    rel_name: &str,
    direction: Option<Direction>,
    variable: &str,
    selection: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let catalog = ctx.catalog;
    let target = catalog.require(&field.type_ref.name)?;
    let path = child_variable(variable, selection.output_key());
    let args = ListArgs::parse(selection, variables)?;
    let (left, right) = Direction::arrows(direction);

    let mut predicates = Vec::new();
    if let Some(filter) = &args.filter {
        let index = ctx.claim_param_index();
        let name = param_name(index, "filter");
        let compiled = compile_filter(ctx, target, &path, &format!("${}", name), filter)?;
        ctx.add_named_param(name, compiled.serialized);
        predicates.extend(compiled.predicates);
    }

    let list = if target.is_abstract() && !selection.fragments.is_empty() {
        fragments::compile_fragmented_comprehension(
            ctx, target, variable, &path, rel_name, (left, right), &predicates, selection,
            variables,
        )?
    } else {
        let label = match target.kind {
            TypeKind::Union => {
                let param = derived_types_param(&target.name);
                ctx.add_named_param(
                    param.clone(),
                    Value::Array(
                        target
                            .derived_types
                            .iter()
                            .map(|t| Value::String(t.clone()))
                            .collect(),
                    ),
                );
                predicates.push(format!(
                    "(ANY(x IN labels({}) WHERE x IN ${}))",
                    escape(&path),
                    param
                ));
                String::new()
            }
            _ => format!(":{}", escape(&target.name)),
        };
        let tag = if target.is_abstract() {
            ProjectionTag::Derived
        } else {
            ProjectionTag::None
        };
        let projection =
            compile_projection(ctx, target, &path, &selection.selections, variables, tag)?;
        let where_clause = if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        };
        format!(
            "[({}){}[:{}]{}({}{}){} | {} {}]",
            escape(variable),
            left,
            escape(rel_name),
            right,
            escape(&path),
            label,
            where_clause,
            escape(&path),
            projection
        )
    };

    Ok(shape_list(list, &args, field.type_ref.list))
}

/// Relationship-payload comprehension: binds both the relationship variable
/// and the far endpoint node, projects from the relationship.
fn compile_payload_relation_field(
    ctx: &mut TranslationContext,
    parent: &SchemaType,
    field: &FieldDef,
    relation: &TypeRelation,
    variable: &str,
    selection: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let catalog = ctx.catalog;
    let payload = catalog.require(&field.type_ref.name)?;

    if relation.is_reflexive() {
        return compile_reflexive_payload_field(
            ctx,
            payload,
            relation,
            variable,
            selection,
            variables,
            field.type_ref.list,
        );
    }

    let node_path = child_variable(variable, selection.output_key());
    let rel_var = relation_variable(&node_path);
    let endpoints = payload.endpoint_fields(|name| catalog.is_node_like(name));
    let (direction, other_end) = payload_direction(parent, relation, &endpoints, None);
    let (left, right) = Direction::arrows(Some(direction));
    let other_ep = endpoints
        .iter()
        .find(|e| e.type_ref.name == other_end)
        .copied();
    let node_var = child_variable(
        &node_path,
        other_ep.map(|e| e.name.as_str()).unwrap_or("node"),
    );

    let args = ListArgs::parse(selection, variables)?;
    let predicates = if let Some(filter) = &args.filter {
        let index = ctx.claim_param_index();
        let name = param_name(index, "filter");
        let (predicates, serialized) = compile_payload_inline_filter(
            ctx,
            payload,
            &endpoints,
            &rel_var,
            &node_var,
            &other_end,
            &format!("${}", name),
            filter,
        )?;
        ctx.add_named_param(name, serialized);
        predicates
    } else {
        Vec::new()
    };

    let mut entries = Vec::new();
    for sub in &selection.selections {
        if sub.name == "__typename" {
            continue;
        }
        let endpoint = endpoints.iter().find(|e| e.name == sub.name).copied();
        if let Some(endpoint_field) = endpoint {
            let endpoint_type = catalog.require(&endpoint_field.type_ref.name)?;
            let bound = if endpoint_field.type_ref.name == other_end {
                node_var.clone()
            } else {
                // Selecting back toward the anchoring side projects the
                // parent binding itself.
                variable.to_string()
            };
            let projection = compile_projection(
                ctx,
                endpoint_type,
                &bound,
                &sub.selections,
                variables,
                ProjectionTag::None,
            )?;
            entries.push(format!(
                "{}: {} {}",
                sub.output_key(),
                escape(&bound),
                projection
            ));
        } else {
            entries.push(compile_field(ctx, payload, &rel_var, sub, variables)?);
        }
    }
    let projection = if entries.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{ {} }}", entries.join(", "))
    };

    let where_clause = if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    };
    let list = format!(
        "[({}){}[{}:{}]{}({}:{}){} | {} {}]",
        escape(variable),
        left,
        escape(&rel_var),
        escape(&relation.name),
        right,
        escape(&node_var),
        escape(&other_end),
        where_clause,
        escape(&rel_var),
        projection
    );
    Ok(shape_list(list, &args, field.type_ref.list))
}

/// Reflexive payload fields project a directional object: the first declared
/// endpoint field traverses incoming, the second outgoing. The outer field's
/// cardinality governs each direction.
#[allow(clippy::too_many_arguments)]
fn compile_reflexive_payload_field(
    ctx: &mut TranslationContext,
    payload: &SchemaType,
    relation: &TypeRelation,
    variable: &str,
    selection: &Selection,
    variables: &Map<String, Value>,
    is_list: bool,
) -> Result<String, TranslationError> {
    let catalog = ctx.catalog;
    let endpoints = payload.endpoint_fields(|name| catalog.is_node_like(name));
    let node_path = child_variable(variable, selection.output_key());

    let mut parts = Vec::new();
    for sub in &selection.selections {
        if sub.name == "__typename" {
            continue;
        }
        let position = endpoints.iter().position(|e| e.name == sub.name);
        let Some(position) = position else {
            return Err(TranslationError::UnsupportedArgument {
                field: selection.name.clone(),
                reason: format!(
                    "reflexive relationship fields select their directed ends ({})",
                    endpoints
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        };
        let direction = if position == 0 {
            Direction::In
        } else {
            Direction::Out
        };
        let (left, right) = Direction::arrows(Some(direction));
        let dir_path = child_variable(&node_path, &sub.name);
        let rel_var = relation_variable(&dir_path);
        let endpoint_field = endpoints[position];
        let endpoint_type = catalog.require(&endpoint_field.type_ref.name)?;

        let args = ListArgs::parse(sub, variables)?;
        let predicates = if let Some(filter) = &args.filter {
            let index = ctx.claim_param_index();
            let name = param_name(index, "filter");
            let (predicates, serialized) = compile_payload_inline_filter(
                ctx,
                payload,
                &endpoints,
                &rel_var,
                &dir_path,
                &relation.from,
                &format!("${}", name),
                filter,
            )?;
            ctx.add_named_param(name, serialized);
            predicates
        } else {
            Vec::new()
        };

        let mut entries = Vec::new();
        for inner in &sub.selections {
            if inner.name == "__typename" {
                continue;
            }
            // The connected node is addressed by the node type's name (the
            // reflexive payload collapses from/to into one field name).
            if inner.name == endpoint_type.name || inner.name == endpoint_field.name {
                let projection = compile_projection(
                    ctx,
                    endpoint_type,
                    &dir_path,
                    &inner.selections,
                    variables,
                    ProjectionTag::None,
                )?;
                entries.push(format!(
                    "{}: {} {}",
                    inner.output_key(),
                    escape(&dir_path),
                    projection
                ));
            } else {
                entries.push(compile_field(ctx, payload, &rel_var, inner, variables)?);
            }
        }
        let projection = if entries.is_empty() {
            "{ }".to_string()
        } else {
            format!("{{ {} }}", entries.join(", "))
        };

        let where_clause = if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        };
        let list = format!(
            "[({}){}[{}:{}]{}({}:{}){} | {} {}]",
            escape(variable),
            left,
            escape(&rel_var),
            escape(&relation.name),
            right,
            escape(&dir_path),
            escape(&relation.from),
            where_clause,
            escape(&rel_var),
            projection
        );
        parts.push(format!(
            "{}: {}",
            sub.output_key(),
            shape_list(list, &args, is_list)
        ));
    }

    Ok(format!("{{ {} }}", parts.join(", ")))
}

/// Inline filter on a payload field: property keys predicate the
/// relationship variable, endpoint keys the pattern-bound node (or the
/// anchoring parent).
#[allow(clippy::too_many_arguments)]
fn compile_payload_inline_filter(
    ctx: &mut TranslationContext,
    payload: &SchemaType,
    endpoints: &[&FieldDef],
    rel_var: &str,
    node_var: &str,
    far_end_type: &str,
    param_path: &str,
    filter: &Map<String, Value>,
) -> Result<(Vec<String>, Value), TranslationError> {
    let catalog = ctx.catalog;
    let mut predicates = Vec::new();
    let mut serialized = Map::new();

    for (key, value) in filter {
        let (field_name, _) = parse_filter_key(key);
        let endpoint = endpoints
            .iter()
            .find(|e| e.name == field_name || e.name == *key)
            .copied();
        if let Some(endpoint_field) = endpoint {
            if endpoint_field.type_ref.name != far_end_type {
                return Err(TranslationError::MalformedFilter {
                    field: key.clone(),
                    reason: "only the traversed endpoint can be filtered inline".to_string(),
                });
            }
            let endpoint_type = catalog.require(&endpoint_field.type_ref.name)?;
            let object = value.as_object().ok_or_else(|| {
                TranslationError::MalformedFilter {
                    field: key.clone(),
                    reason: "endpoint filters expect a nested filter object".to_string(),
                }
            })?;
            let compiled = compile_filter(
                ctx,
                endpoint_type,
                node_var,
                &format!("{}.{}", param_path, key),
                object,
            )?;
            predicates.extend(compiled.predicates);
            serialized.insert(key.clone(), compiled.serialized);
        } else {
            let compiled = compile_filter(
                ctx,
                payload,
                rel_var,
                param_path,
                &one_entry(key, value),
            )?;
            predicates.extend(compiled.predicates);
            if let Value::Object(map) = compiled.serialized {
                for (k, v) in map {
                    serialized.insert(k, v);
                }
            }
        }
    }
    Ok((predicates, Value::Object(serialized)))
}

pub(crate) fn one_entry(key: &str, value: &Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.clone());
    map
}

/// Apply `orderBy` (apoc.coll.sortMulti), `first`/`offset` (list slice), and
/// cardinality (`head(...)` for singular fields) to a comprehension.
pub fn shape_list(list: String, args: &ListArgs, is_list: bool) -> String {
    let mut expr = list;

    if !args.order_by.is_empty() {
        let keys: Vec<String> = args
            .order_by
            .iter()
            .map(|spec| {
                // sortMulti sorts descending by default; '^' reverses.
                match spec.rsplit_once('_') {
                    Some((field, "asc")) => format!("'^{}'", field),
                    Some((field, "desc")) => format!("'{}'", field),
                    _ => format!("'{}'", spec),
                }
            })
            .collect();
        expr = format!("apoc.coll.sortMulti({}, [{}])", expr, keys.join(", "));
    }

    if is_list {
        expr = match (args.offset, args.first) {
            (Some(offset), Some(first)) if offset > 0 => {
                format!("{}[{}..{}]", expr, offset, offset + first)
            }
            (_, Some(first)) => format!("{}[..{}]", expr, first),
            (Some(offset), None) if offset > 0 => format!("{}[{}..]", expr, offset),
            _ => expr,
        };
        expr
    } else {
        format!("head({})", expr)
    }
}
