//! Relationship mutations: `@MutationMeta(relationship, from, to)` fields.
//!
//! All three shapes share the endpoint-binding preamble: one `MATCH` per
//! endpoint, keyed by the `from`/`to` argument's properties, or constrained
//! by a `where` filter argument when the caller supplies one instead.

use serde_json::{Map, Value};

use crate::schema::{MutationMeta, SchemaType};
use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::translate::filter::compile_filter;
use crate::translate::selection::{compile_projection, ProjectionTag};
use crate::translate::{ResolutionContext, Selection};
use crate::utils::naming::{endpoint_variable, escape, relation_variable, root_variable};

pub fn translate_add(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
    meta: &MutationMeta,
) -> Result<String, TranslationError> {
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let (from_var, to_var) = endpoint_vars(meta);
    let rel_var = relation_variable(&root_variable(&meta.relationship));

    let mut clauses = endpoint_matches(ctx, meta, field, variables)?;
    clauses.push(format!(
        "CREATE ({})-[{}:{}{}]->({})",
        escape(&from_var),
        escape(&rel_var),
        escape(&meta.relationship),
        data_properties(ctx, field, variables)?,
        escape(&to_var)
    ));
    clauses.push(payload_return(
        ctx,
        meta,
        Some(&rel_var),
        (&from_var, &to_var),
        field,
        variables,
    )?);
    Ok(clauses.join(" "))
}

pub fn translate_remove(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
    meta: &MutationMeta,
) -> Result<String, TranslationError> {
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let (from_var, to_var) = endpoint_vars(meta);
    // The relationship binding only lives until DELETE; its name is the
    // concatenated endpoint variables.
    let rel_var = format!("{}{}", from_var, to_var);

    let mut clauses = endpoint_matches(ctx, meta, field, variables)?;
    clauses.push(format!(
        "OPTIONAL MATCH ({})-[{}:{}]->({})",
        escape(&from_var),
        escape(&rel_var),
        escape(&meta.relationship),
        escape(&to_var)
    ));
    clauses.push(format!("DELETE {}", escape(&rel_var)));
    // Endpoints survive the delete under shielded aliases; COUNT(*) collapses
    // the cardinality back to one row.
    clauses.push(format!(
        "WITH COUNT(*) AS scope, {} AS {}, {} AS {}",
        escape(&from_var),
        escape(&format!("_{}", from_var)),
        escape(&to_var),
        escape(&format!("_{}", to_var))
    ));
    clauses.push(payload_return(
        ctx,
        meta,
        None,
        (&format!("_{}", from_var), &format!("_{}", to_var)),
        field,
        variables,
    )?);
    Ok(clauses.join(" "))
}

pub fn translate_merge_update(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
    meta: &MutationMeta,
    merge: bool,
) -> Result<String, TranslationError> {
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let (from_var, to_var) = endpoint_vars(meta);
    let rel_var = relation_variable(&root_variable(&meta.relationship));

    let mut clauses = endpoint_matches(ctx, meta, field, variables)?;
    clauses.push(format!(
        "{} ({})-[{}:{}]->({})",
        if merge { "MERGE" } else { "MATCH" },
        escape(&from_var),
        escape(&rel_var),
        escape(&meta.relationship),
        escape(&to_var)
    ));
    if let Some(data) = field.arg("data", variables)? {
        if data.as_object().map(|m| !m.is_empty()).unwrap_or(false) {
            let props = data_property_entries(&data);
            ctx.add_named_param("data", data);
            clauses.push(format!(
                "SET {} += {{{}}}",
                escape(&rel_var),
                props.join(", ")
            ));
        }
    }
    clauses.push(payload_return(
        ctx,
        meta,
        Some(&rel_var),
        (&from_var, &to_var),
        field,
        variables,
    )?);
    Ok(clauses.join(" "))
}

fn endpoint_vars(meta: &MutationMeta) -> (String, String) {
    (
        endpoint_variable(&meta.from, "from"),
        endpoint_variable(&meta.to, "to"),
    )
}

/// One `MATCH` per endpoint. A `where: { from/to: {...} }` argument replaces
/// the keyed property match with compiled filter predicates for that end.
fn endpoint_matches(
    ctx: &mut TranslationContext,
    meta: &MutationMeta,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<Vec<String>, TranslationError> {
    let where_arg = field
        .arg("where", variables)?
        .and_then(|v| v.as_object().cloned());

    let mut clauses = Vec::new();
    let mut serialized_where = Map::new();
    for (end, type_name) in [("from", &meta.from), ("to", &meta.to)] {
        let target = ctx.catalog.require(type_name)?;
        let variable = endpoint_variable(type_name, end);
        let where_end = where_arg.as_ref().and_then(|w| w.get(end));
        if let Some(Value::Object(filter)) = where_end {
            let compiled = compile_filter(
                ctx,
                target,
                &variable,
                &format!("$where.{}", end),
                filter,
            )?;
            let joined = compiled.joined();
            serialized_where.insert(end.to_string(), compiled.serialized);
            clauses.push(format!(
                "MATCH ({}:{}) WHERE {}",
                escape(&variable),
                escape(&target.name),
                joined
            ));
        } else {
            let keys = field
                .arg(end, variables)?
                .ok_or_else(|| TranslationError::MissingArgument {
                    field: field.name.clone(),
                    argument: end.to_string(),
                })?;
            let entries: Vec<String> = keys
                .as_object()
                .map(|m| m.keys().map(|k| format!("{}:${}.{}", k, end, k)).collect())
                .unwrap_or_default();
            ctx.add_named_param(end, keys);
            clauses.push(format!(
                "MATCH ({}:{} {{{}}})",
                escape(&variable),
                escape(&target.name),
                entries.join(", ")
            ));
        }
    }
    if !serialized_where.is_empty() {
        ctx.add_named_param("where", Value::Object(serialized_where));
    }
    Ok(clauses)
}

/// Inline `{since:$data.since, ...}` property map for CREATE, empty string
/// when the mutation carries no `data` argument.
fn data_properties(
    ctx: &mut TranslationContext,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    match field.arg("data", variables)? {
        Some(data) if data.as_object().map(|m| !m.is_empty()).unwrap_or(false) => {
            let entries = data_property_entries(&data);
            ctx.add_named_param("data", data);
            Ok(format!(" {{{}}}", entries.join(", ")))
        }
        _ => Ok(String::new()),
    }
}

fn data_property_entries(data: &Value) -> Vec<String> {
    data.as_object()
        .map(|m| m.keys().map(|k| format!("{}:$data.{}", k, k)).collect())
        .unwrap_or_default()
}

/// The payload projection: `from`/`to` selections project the bound endpoint
/// nodes, everything else reads off the relationship variable (or is dropped
/// for Remove, where the relationship no longer exists).
fn payload_return(
    ctx: &mut TranslationContext,
    meta: &MutationMeta,
    rel_var: Option<&str>,
    (from_var, to_var): (&str, &str),
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let alias = format!("_{}Payload", field.name);
    let mut entries = Vec::new();
    for selection in &field.selections {
        match selection.name.as_str() {
            "__typename" => continue,
            "from" | "to" => {
                let (type_name, variable) = if selection.name == "from" {
                    (&meta.from, from_var)
                } else {
                    (&meta.to, to_var)
                };
                let target: &SchemaType = ctx.catalog.require(type_name)?;
                let projection = compile_projection(
                    ctx,
                    target,
                    variable,
                    &selection.selections,
                    variables,
                    ProjectionTag::None,
                )?;
                entries.push(format!(
                    "{}: {} {}",
                    selection.output_key(),
                    escape(variable),
                    projection
                ));
            }
            "_id" if rel_var.is_some() => {
                entries.push(format!(
                    "{}: ID({})",
                    selection.output_key(),
                    escape(rel_var.unwrap_or_default())
                ));
            }
            name => {
                if rel_var.is_none() {
                    continue;
                }
                if selection.output_key() == name {
                    entries.push(format!(".{}", name));
                } else {
                    entries.push(format!(
                        "{}: {}.{}",
                        selection.output_key(),
                        escape(rel_var.unwrap_or_default()),
                        name
                    ));
                }
            }
        }
    }

    let body = if entries.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{ {} }}", entries.join(", "))
    };
    let projected = match rel_var {
        Some(rel) => format!("{} {}", escape(rel), body),
        None => body,
    };
    Ok(format!("RETURN {} AS {}", projected, escape(&alias)))
}
