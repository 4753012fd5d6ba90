//! Query translator: one resolved root field → one read statement.
//!
//! Three root shapes exist: a plain `MATCH` on the return type's label,
//! full-text lookup via `db.index.fulltext.queryNodes` when the field carries
//! a `search` argument, and `apoc.cypher.runFirstColumn` when the root field
//! declares `@cypher`. Everything after the root binding is shared: filter
//! predicates, ordering, the selection-set projection, pagination.

use serde_json::{Map, Value};

use crate::schema::types::TypeKind;
use crate::schema::{FieldKind, SchemaType};
use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::translate::filter::compile_filter;
use crate::translate::selection::{self, fragments, ProjectionTag};
use crate::translate::{ResolutionContext, Selection};
use crate::utils::naming::{derived_types_param, escape, root_variable};

/// Arguments every root field owns; anything else is a property equality
/// match (or, under `@cypher`, a statement parameter).
const ROOT_ARGS: &[&str] = &["filter", "orderBy", "first", "offset", "search", "threshold"];

pub fn translate_query(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
) -> Result<String, TranslationError> {
    let catalog = ctx.catalog;
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let target = catalog.require(&resolution.return_type)?;
    let variable = root_variable(&target.name);

    let root_cypher = catalog
        .get("Query")
        .and_then(|q| q.field(&field.name))
        .and_then(|f| f.cypher_statement())
        .map(str::to_string);

    let mut clauses: Vec<String> = Vec::new();
    let mut predicates: Vec<String> = Vec::new();

    if let Some(statement) = root_cypher {
        clauses.push(root_cypher_clause(ctx, &statement, &variable, field, variables)?);
    } else if let Some(search) = field.arg("search", variables)? {
        clauses.push(fulltext_clause(ctx, target, &variable, field, variables, search)?);
        if let Some(threshold) = field.arg("threshold", variables)? {
            ctx.add_named_param("threshold", threshold);
            predicates.push("score >= $threshold".to_string());
        }
        predicates.extend(property_arg_predicates(ctx, &variable, field, variables)?);
    } else {
        clauses.push(match_clause(ctx, target, &variable, field, variables)?);
    }

    if let Some(filter) = field.arg("filter", variables)? {
        let object = filter
            .as_object()
            .cloned()
            .ok_or_else(|| TranslationError::MalformedFilter {
                field: field.name.clone(),
                reason: "filter must be an input object".to_string(),
            })?;
        if !object.is_empty() {
            let compiled = compile_filter(ctx, target, &variable, "$filter", &object)?;
            ctx.add_named_param("filter", compiled.serialized);
            predicates.extend(compiled.predicates);
        }
    }

    if !predicates.is_empty() {
        clauses.push(format!("WHERE {}", predicates.join(" AND ")));
    }

    // Plain property keys order before the projection; temporal/spatial keys
    // only gain a sortable scalar after it.
    let (early_order, late_order) = split_order_by(ctx, target, &variable, field, variables)?;
    if !early_order.is_empty() {
        clauses.push(format!(
            "WITH {} ORDER BY {}",
            escape(&variable),
            early_order.join(", ")
        ));
    }

    let projection = if target.is_abstract() && !field.fragments.is_empty() {
        fragments::compile_root_fragments(ctx, &variable, field, variables)?
    } else {
        let tag = if target.is_abstract() {
            ProjectionTag::Derived
        } else {
            ProjectionTag::None
        };
        let body =
            selection::compile_projection(ctx, target, &variable, &field.selections, variables, tag)?;
        format!("{} {}", escape(&variable), body)
    };
    let mut tail = format!("RETURN {} AS {}", projection, escape(&variable));

    if !late_order.is_empty() {
        tail.push_str(&format!(" ORDER BY {}", late_order.join(", ")));
    }

    let first = field.arg("first", variables)?.and_then(|v| v.as_i64()).unwrap_or(-1);
    let offset = field.arg("offset", variables)?.and_then(|v| v.as_i64()).unwrap_or(0);
    ctx.add_named_param("first", Value::from(first));
    ctx.add_named_param("offset", Value::from(offset));
    if offset > 0 {
        tail.push_str(" SKIP toInteger($offset)");
    }
    if first > -1 {
        tail.push_str(" LIMIT toInteger($first)");
    }
    clauses.push(tail);

    Ok(clauses.join(" "))
}

/// `MATCH (`movie`:`Movie` {title:$title})` — property arguments inline.
fn match_clause(
    ctx: &mut TranslationContext,
    target: &SchemaType,
    variable: &str,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let mut properties = Vec::new();
    for (name, value) in field.args_except(ROOT_ARGS, variables)? {
        ctx.add_named_param(name.clone(), value);
        properties.push(format!("{}:${}", name, name));
    }
    let props = if properties.is_empty() {
        String::new()
    } else {
        format!(" {{{}}}", properties.join(", "))
    };

    let clause = match target.kind {
        TypeKind::Union => {
            // Unions have no shared label; constrain by the derived set.
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
            format!(
                "MATCH ({}{}) WHERE ANY(x IN labels({}) WHERE x IN ${})",
                escape(variable),
                props,
                escape(variable),
                param
            )
        }
        _ => format!("MATCH ({}:{}{})", escape(variable), escape(&target.name), props),
    };
    Ok(clause)
}

/// `CALL db.index.fulltext.queryNodes("MovieSearch", $search) YIELD node AS `movie`, score`
fn fulltext_clause(
    ctx: &mut TranslationContext,
    target: &SchemaType,
    variable: &str,
    field: &Selection,
    _variables: &Map<String, Value>,
    search: Value,
) -> Result<String, TranslationError> {
    let index = ctx
        .catalog
        .search_index_for(&target.name)
        .ok_or_else(|| TranslationError::UnsupportedArgument {
            field: field.name.clone(),
            reason: format!("type `{}` declares no @search index", target.name),
        })?
        .to_string();
    ctx.add_named_param("search", search);
    Ok(format!(
        "CALL db.index.fulltext.queryNodes(\"{}\", $search) YIELD node AS {}, score",
        index,
        escape(variable)
    ))
}

/// Property equality arguments rendered as `WHERE` predicates (used by the
/// full-text root, whose binding clause cannot carry an inline property map).
fn property_arg_predicates(
    ctx: &mut TranslationContext,
    variable: &str,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<Vec<String>, TranslationError> {
    let mut predicates = Vec::new();
    for (name, value) in field.args_except(ROOT_ARGS, variables)? {
        ctx.add_named_param(name.clone(), value);
        predicates.push(format!("({}.{} = ${})", escape(variable), name, name));
    }
    Ok(predicates)
}

/// `WITH apoc.cypher.runFirstColumn("stmt", {...}, true) AS x UNWIND x AS `movie``
fn root_cypher_clause(
    ctx: &mut TranslationContext,
    statement: &str,
    variable: &str,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let mut apoc_args = Vec::new();
    for (name, value) in field.args_except(ROOT_ARGS, variables)? {
        ctx.add_named_param(name.clone(), value);
        apoc_args.push(format!("{}: ${}", name, name));
    }
    apoc_args.push(format!("cypherParams: {}", ctx.bind_cypher_params()));
    Ok(format!(
        "WITH apoc.cypher.runFirstColumn(\"{}\", {{{}}}, true) AS x UNWIND x AS {}",
        selection::cypher_field::quote_statement(statement),
        apoc_args.join(", "),
        escape(variable)
    ))
}

/// Split `orderBy` specs into pre-projection (plain properties) and
/// post-projection (temporal/spatial `formatted`) ORDER BY expressions.
fn split_order_by(
    ctx: &mut TranslationContext,
    target: &SchemaType,
    variable: &str,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<(Vec<String>, Vec<String>), TranslationError> {
    let specs = match field.arg("orderBy", variables)? {
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => vec![],
    };

    let mut early = Vec::new();
    let mut late = Vec::new();
    for spec in specs {
        let (prop, sort) = match spec.rsplit_once('_') {
            Some((p, "asc")) => (p.to_string(), "ASC"),
            Some((p, "desc")) => (p.to_string(), "DESC"),
            _ => (spec.clone(), "ASC"),
        };
        let (_, kind) = ctx.catalog.classify_field(target, &prop)?;
        match kind {
            FieldKind::Temporal | FieldKind::Spatial => late.push(format!(
                "{}.{}.formatted {}",
                escape(variable),
                prop,
                sort
            )),
            _ => early.push(format!("{}.{} {}", escape(variable), prop, sort)),
        }
    }
    Ok((early, late))
}
