//! Filter argument compiler.
//!
//! Turns a nested `filter` input object into a list of Cypher boolean
//! predicates plus the serialized parameter value the predicates reference.
//! The caller joins predicates with `AND` and stores the serialized value
//! under the parameter name it chose (`$filter`, `$1_filter`, ...).
//!
//! The serialized value is not a verbatim copy of the argument: `null`
//! leaves become `true` (Cypher existential checks cannot bind a null
//! parameter portably), `_in` scalars are coerced to one-element arrays, and
//! numbers destined for Int-typed properties are normalized to 64-bit
//! integers.

pub mod operators;

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::schema::directives::Direction;
use crate::schema::types::{is_spatial_type, is_temporal_type, type_constructor};
use crate::schema::{FieldDef, FieldKind, SchemaType, TypeRelation};
use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::utils::naming::{child_variable, escape, relation_variable};
use crate::values::encode_integer;

use operators::{parse_filter_key, FilterOp};

/// Result of compiling one filter object.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    /// Parenthesized predicate strings; join with ` AND `.
    pub predicates: Vec<String>,
    /// Parameter value to serialize under the filter's parameter name.
    pub serialized: Value,
}

impl CompiledFilter {
    /// The predicates joined into one `WHERE`-ready expression.
    pub fn joined(&self) -> String {
        self.predicates.join(" AND ")
    }
}

/// Compile a filter object against `schema_type`, with `variable` as the
/// bound Cypher entity and `param_path` the parameter expression the
/// predicates dereference (`$filter`, `$1_filter`, `_AND`, ...).
pub fn compile_filter(
    ctx: &mut TranslationContext,
    schema_type: &SchemaType,
    variable: &str,
    param_path: &str,
    filter: &Map<String, Value>,
) -> Result<CompiledFilter, TranslationError> {
    let mut predicates = Vec::new();
    let mut serialized = Map::new();

    for (key, value) in filter {
        if key == "AND" || key == "OR" {
            let (predicate, value) =
                compile_boolean_list(ctx, schema_type, variable, param_path, key, value)?;
            predicates.push(predicate);
            serialized.insert(key.clone(), value);
            continue;
        }
        let (predicate, value) =
            compile_entry(ctx, schema_type, variable, param_path, key, value)?;
        if let Some(predicate) = predicate {
            predicates.push(predicate);
        }
        serialized.insert(key.clone(), value);
    }

    Ok(CompiledFilter {
        predicates,
        serialized: Value::Object(serialized),
    })
}

/// `AND`/`OR` lists combine sibling filter objects with `ALL`/`ANY` over the
/// parameter list itself. The predicate body is compiled once from the union
/// of keys across all elements, each key guarded with an `IS NULL` check so
/// heterogeneous elements share it. A key that some element sets to `null`
/// keeps its existential meaning: `null` serializes to `true`, so the shared
/// body dispatches on that sentinel to the `EXISTS`/`NOT EXISTS` branch.
fn compile_boolean_list(
    ctx: &mut TranslationContext,
    schema_type: &SchemaType,
    variable: &str,
    param_path: &str,
    key: &str,
    value: &Value,
) -> Result<(String, Value), TranslationError> {
    let items = value.as_array().ok_or_else(|| TranslationError::MalformedFilter {
        field: key.to_string(),
        reason: "AND/OR expects a list of filter objects".to_string(),
    })?;

    let iterator = format!("_{}", key);
    // One exemplar per key (first non-null occurrence), plus the set of keys
    // some element nulls out.
    let mut merged: Map<String, Value> = Map::new();
    let mut nulled: HashSet<String> = HashSet::new();
    let mut serialized_items = Vec::with_capacity(items.len());
    for item in items {
        let object = item.as_object().ok_or_else(|| TranslationError::MalformedFilter {
            field: key.to_string(),
            reason: "AND/OR list elements must be filter objects".to_string(),
        })?;
        let compiled = compile_filter(ctx, schema_type, variable, &iterator, object)?;
        serialized_items.push(compiled.serialized);
        for (k, v) in object {
            if v.is_null() {
                nulled.insert(k.clone());
                merged.entry(k.clone()).or_insert(Value::Null);
            } else if matches!(merged.get(k), None | Some(Value::Null)) {
                merged.insert(k.clone(), v.clone());
            }
        }
    }

    let mut guarded = Vec::new();
    for (sub_key, exemplar) in &merged {
        let predicate = if sub_key == "AND" || sub_key == "OR" {
            let (p, _) =
                compile_boolean_list(ctx, schema_type, variable, &iterator, sub_key, exemplar)?;
            Some(p)
        } else {
            let mut branches = Vec::new();
            if nulled.contains(sub_key.as_str()) {
                let existential =
                    compile_entry(ctx, schema_type, variable, &iterator, sub_key, &Value::Null)?.0;
                if let Some(existential) = existential {
                    if exemplar.is_null() {
                        branches.push(existential);
                    } else {
                        branches.push(format!(
                            "({}.{} = true AND {})",
                            iterator, sub_key, existential
                        ));
                    }
                }
            }
            if !exemplar.is_null() {
                if let Some(p) =
                    compile_entry(ctx, schema_type, variable, &iterator, sub_key, exemplar)?.0
                {
                    branches.push(p);
                }
            }
            if branches.is_empty() {
                None
            } else {
                Some(branches.join(" OR "))
            }
        };
        if let Some(predicate) = predicate {
            guarded.push(format!(
                "({}.{} IS NULL OR {})",
                iterator, sub_key, predicate
            ));
        }
    }

    let quantifier = if key == "AND" { "ALL" } else { "ANY" };
    let predicate = format!(
        "({}({} IN {}.{} WHERE {}))",
        quantifier,
        iterator,
        param_path,
        key,
        guarded.join(" AND ")
    );
    Ok((predicate, Value::Array(serialized_items)))
}

/// Compile one `key: value` filter entry. Returns `(predicate, serialized)`;
/// the predicate is `None` only when a nested filter object is empty (an
/// empty filter imposes nothing).
fn compile_entry(
    ctx: &mut TranslationContext,
    schema_type: &SchemaType,
    variable: &str,
    param_path: &str,
    key: &str,
    value: &Value,
) -> Result<(Option<String>, Value), TranslationError> {
    let catalog = ctx.catalog;
    let (field_name, mut op) = parse_filter_key(key);
    // A property literally named with an operator-looking suffix takes
    // priority over suffix parsing.
    let lookup = if schema_type.field(field_name).is_none() && schema_type.field(key).is_some() {
        op = FilterOp::Eq;
        key
    } else {
        field_name
    };
    let (field, kind) = catalog.classify_field(schema_type, lookup)?;
    let field = field.ok_or_else(|| TranslationError::MalformedFilter {
        field: key.to_string(),
        reason: "the _id meta field cannot be filtered".to_string(),
    })?;
    let param_ref = format!("{}.{}", param_path, key);
    let property = format!("{}.{}", escape(variable), field.name);

    match kind {
        FieldKind::NodeRelation(relation) => {
            let target = catalog.require(&field.type_ref.name)?;
            compile_node_relation_entry(
                ctx,
                field,
                &relation.name,
                relation.direction,
                target,
                variable,
                &param_ref,
                key,
                op,
                value,
            )
        }
        FieldKind::PayloadRelation(relation) => {
            let payload = catalog.require(&field.type_ref.name)?;
            compile_payload_relation_entry(
                ctx, schema_type, field, &relation, payload, variable, &param_ref, key, op, value,
            )
        }
        FieldKind::Temporal | FieldKind::Spatial => Ok((
            Some(compile_neo4j_type_entry(field, &property, &param_ref, op, value)?),
            value.clone(),
        )),
        FieldKind::Scalar => compile_scalar_entry(field, &property, &param_ref, op, value),
        FieldKind::IdMeta | FieldKind::Cypher => Err(TranslationError::MalformedFilter {
            field: key.to_string(),
            reason: "computed and meta fields cannot be filtered".to_string(),
        }),
        // Endpoint sub-filters are split off by the payload path before
        // entries are compiled; reaching one here means the filter sits on a
        // payload type with no pattern in scope.
        FieldKind::Endpoint => Err(TranslationError::MalformedFilter {
            field: key.to_string(),
            reason: "endpoint fields are filtered through their relationship field".to_string(),
        }),
    }
}

/// Scalar/enum leaf comparisons, including null existentials and list-typed
/// property quantification.
fn compile_scalar_entry(
    field: &FieldDef,
    property: &str,
    param_ref: &str,
    op: FilterOp,
    value: &Value,
) -> Result<(Option<String>, Value), TranslationError> {
    // Null equality is an existence check; the parameter value serializes to
    // `true`, never `null`. `{f: null}` and `{f_not: null}` are the one
    // existential case spelled two ways.
    if value.is_null() {
        let predicate = match op {
            FilterOp::Eq => format!("(NOT EXISTS({}))", property),
            FilterOp::Not => format!("(EXISTS({}))", property),
            _ => {
                return Err(TranslationError::MalformedFilter {
                    field: field.name.clone(),
                    reason: format!(
                        "null is only meaningful with the bare key or _not, not {:?}",
                        op
                    ),
                })
            }
        };
        return Ok((Some(predicate), Value::Bool(true)));
    }

    let serialized = serialize_scalar(field, op, value)?;

    // List-typed properties have no native membership operator with the
    // desired subset semantics; quantify over the stored list instead.
    if field.type_ref.list {
        let predicate = match op {
            FilterOp::In => format!("(ANY(x IN {} WHERE x IN {}))", property, param_ref),
            FilterOp::NotIn => format!("(NONE(x IN {} WHERE x IN {}))", property, param_ref),
            FilterOp::Eq => format!("({} = {})", property, param_ref),
            FilterOp::Not => format!("(NOT {} = {})", property, param_ref),
            _ => {
                return Err(TranslationError::MalformedFilter {
                    field: field.name.clone(),
                    reason: format!("{:?} is not supported on list properties", op),
                })
            }
        };
        return Ok((Some(predicate), serialized));
    }

    let comparison = op.comparison().ok_or_else(|| TranslationError::MalformedFilter {
        field: field.name.clone(),
        reason: format!("{:?} is not valid on a scalar field", op),
    })?;
    let core = format!("{} {} {}", property, comparison, param_ref);
    let predicate = if op.negated() {
        format!("(NOT {})", core)
    } else {
        format!("({})", core)
    };
    Ok((Some(predicate), serialized))
}

/// Temporal/spatial comparisons: the right-hand side goes through the type's
/// Cypher constructor, or `toString()` on the left when only `formatted` is
/// supplied. `_distance*` compares `distance(property, point(...))`.
fn compile_neo4j_type_entry(
    field: &FieldDef,
    property: &str,
    param_ref: &str,
    op: FilterOp,
    value: &Value,
) -> Result<String, TranslationError> {
    let type_name = field.type_ref.name.as_str();

    if op.is_distance() {
        if !is_spatial_type(type_name) {
            return Err(TranslationError::MalformedFilter {
                field: field.name.clone(),
                reason: "_distance filters apply to Point fields only".to_string(),
            });
        }
        let comparison = op.comparison().unwrap_or("=");
        return Ok(format!(
            "(distance({}, point({}.point)) {} {}.distance)",
            property, param_ref, comparison, param_ref
        ));
    }

    let comparison = op.comparison().ok_or_else(|| TranslationError::MalformedFilter {
        field: field.name.clone(),
        reason: format!("{:?} is not valid on a {} field", op, type_name),
    })?;
    let formatted_only = is_temporal_type(type_name)
        && value
            .as_object()
            .map(|o| o.len() == 1 && o.contains_key("formatted"))
            .unwrap_or(false);

    let core = if formatted_only {
        format!("toString({}) {} {}.formatted", property, comparison, param_ref)
    } else {
        let constructor = type_constructor(type_name).unwrap_or("datetime");
        format!("{} {} {}({})", property, comparison, constructor, param_ref)
    };
    Ok(if op.negated() {
        format!("(NOT {})", core)
    } else {
        format!("({})", core)
    })
}

/// Relation filters quantify a sub-filter over a path-pattern comprehension:
/// `ALL(x IN [(var)-[:REL]->(x:Label) | x] WHERE <sub>)`.
#[allow(clippy::too_many_arguments)]
fn compile_node_relation_entry(
    ctx: &mut TranslationContext,
    field: &FieldDef,
    rel_name: &str,
    direction: Option<Direction>,
    target: &SchemaType,
    variable: &str,
    param_ref: &str,
    key: &str,
    op: FilterOp,
    value: &Value,
) -> Result<(Option<String>, Value), TranslationError> {
    let (left, right) = Direction::arrows(direction);
    let label = escape(&target.name);

    if value.is_null() {
        let pattern = format!(
            "({}){}[:{}]{}(:{})",
            escape(variable),
            left,
            escape(rel_name),
            right,
            label
        );
        let predicate = match op {
            FilterOp::Eq => format!("(NOT EXISTS({}))", pattern),
            FilterOp::Not => format!("(EXISTS({}))", pattern),
            _ => {
                return Err(TranslationError::MalformedFilter {
                    field: key.to_string(),
                    reason: "null relation filters take only the bare key or _not".to_string(),
                })
            }
        };
        return Ok((Some(predicate), Value::Bool(true)));
    }

    let quantifier = op.quantifier().ok_or_else(|| TranslationError::MalformedFilter {
        field: key.to_string(),
        reason: format!("{:?} is not a relation quantifier", op),
    })?;
    let sub_object = value.as_object().ok_or_else(|| TranslationError::MalformedFilter {
        field: key.to_string(),
        reason: "relation filters expect a nested filter object".to_string(),
    })?;

    let iterator = field.name.as_str();
    let sub = compile_filter(ctx, target, iterator, param_ref, sub_object)?;
    if sub.predicates.is_empty() {
        return Ok((None, sub.serialized));
    }
    let predicate = format!(
        "({}({} IN [({}){}[:{}]{}({}:{}) | {}] WHERE {}))",
        quantifier,
        escape(iterator),
        escape(variable),
        left,
        escape(rel_name),
        right,
        escape(iterator),
        label,
        escape(iterator),
        sub.joined()
    );
    Ok((Some(predicate), sub.serialized))
}

/// Relationship-payload filters bind the relationship: property predicates
/// apply to the quantified relationship variable, endpoint-node sub-filters
/// move into the pattern comprehension's own `WHERE`, where the endpoint
/// node is in scope.
#[allow(clippy::too_many_arguments)]
fn compile_payload_relation_entry(
    ctx: &mut TranslationContext,
    parent: &SchemaType,
    field: &FieldDef,
    relation: &TypeRelation,
    payload: &SchemaType,
    variable: &str,
    param_ref: &str,
    key: &str,
    op: FilterOp,
    value: &Value,
) -> Result<(Option<String>, Value), TranslationError> {
    let quantifier = op.quantifier().ok_or_else(|| TranslationError::MalformedFilter {
        field: key.to_string(),
        reason: format!("{:?} is not a relation quantifier", op),
    })?;
    let sub_object = value.as_object().ok_or_else(|| TranslationError::MalformedFilter {
        field: key.to_string(),
        reason: "relationship filters expect a nested filter object".to_string(),
    })?;

    let catalog = ctx.catalog;
    let endpoints = payload.endpoint_fields(|name| catalog.is_node_like(name));
    let (direction, other_end) = payload_direction(parent, relation, &endpoints, None);
    let (left, right) = Direction::arrows(Some(direction));

    let rel_binding = relation_variable(&field.name);
    let node_binding = child_variable(&field.name, "node");

    let mut rel_predicates = Vec::new();
    let mut node_predicates = Vec::new();
    let mut serialized = Map::new();

    for (sub_key, sub_value) in sub_object {
        let (sub_field_name, _) = parse_filter_key(sub_key);
        let endpoint = endpoints
            .iter()
            .find(|e| e.name == sub_field_name || e.name == *sub_key);
        if let Some(endpoint_field) = endpoint {
            let endpoint_type = catalog.require(&endpoint_field.type_ref.name)?;
            let sub_obj = sub_value.as_object().ok_or_else(|| {
                TranslationError::MalformedFilter {
                    field: sub_key.clone(),
                    reason: "endpoint filters expect a nested filter object".to_string(),
                }
            })?;
            let compiled = compile_filter(
                ctx,
                endpoint_type,
                &node_binding,
                &format!("{}.{}", param_ref, sub_key),
                sub_obj,
            )?;
            node_predicates.extend(compiled.predicates);
            serialized.insert(sub_key.clone(), compiled.serialized);
        } else {
            let (predicate, value) =
                compile_entry(ctx, payload, &rel_binding, param_ref, sub_key, sub_value)?;
            if let Some(predicate) = predicate {
                rel_predicates.push(predicate);
            }
            serialized.insert(sub_key.clone(), value);
        }
    }

    if rel_predicates.is_empty() && node_predicates.is_empty() {
        return Ok((None, Value::Object(serialized)));
    }

    let pattern_where = if node_predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", node_predicates.join(" AND "))
    };
    let list = format!(
        "[({}){}[{}:{}]{}({}:{}){} | {}]",
        escape(variable),
        left,
        escape(&rel_binding),
        escape(&relation.name),
        right,
        escape(&node_binding),
        escape(&other_end),
        pattern_where,
        escape(&rel_binding)
    );
    let inner = if rel_predicates.is_empty() {
        // The pattern WHERE did all the work; the quantifier still needs a body.
        "TRUE".to_string()
    } else {
        rel_predicates.join(" AND ")
    };
    let predicate = format!(
        "({}({} IN {} WHERE {}))",
        quantifier,
        escape(&rel_binding),
        list,
        inner
    );
    Ok((Some(predicate), Value::Object(serialized)))
}

/// Traversal direction for a payload-typed field seen from `parent`.
///
/// Non-reflexive: a parent on the `from` side traverses OUT toward `to`, and
/// vice versa. Reflexive: positional — the first declared endpoint field is
/// the incoming end, the second the outgoing end; `selected_endpoint` names
/// the one being traversed (None defaults to outgoing).
pub fn payload_direction(
    parent: &SchemaType,
    relation: &TypeRelation,
    endpoints: &[&FieldDef],
    selected_endpoint: Option<&str>,
) -> (Direction, String) {
    if relation.is_reflexive() {
        let incoming = endpoints.first().map(|f| f.name.as_str());
        match selected_endpoint {
            Some(name) if Some(name) == incoming => (Direction::In, relation.from.clone()),
            Some(_) => (Direction::Out, relation.to.clone()),
            None => (Direction::Out, relation.to.clone()),
        }
    } else if parent.name == relation.from || parent.implements.contains(&relation.from) {
        (Direction::Out, relation.to.clone())
    } else {
        (Direction::In, relation.from.clone())
    }
}

/// Serialize a scalar leaf: `_in`/`_not_in` scalars coerce to one-element
/// arrays, list values on other operators against non-list fields are
/// rejected, Int-typed values are 64-bit normalized.
fn serialize_scalar(
    field: &FieldDef,
    op: FilterOp,
    value: &Value,
) -> Result<Value, TranslationError> {
    let membership = matches!(op, FilterOp::In | FilterOp::NotIn);
    let value = if membership && !value.is_array() {
        Value::Array(vec![value.clone()])
    } else if !membership && !field.type_ref.list && value.is_array() {
        return Err(TranslationError::MalformedFilter {
            field: field.name.clone(),
            reason: "a list value requires an _in/_not_in operator".to_string(),
        });
    } else {
        value.clone()
    };

    if field.type_ref.name == "Int" {
        return match &value {
            Value::Array(items) => {
                let encoded: Result<Vec<Value>, _> = items.iter().map(encode_integer).collect();
                Ok(Value::Array(encoded?))
            }
            other => encode_integer(other),
        };
    }
    Ok(value)
}
