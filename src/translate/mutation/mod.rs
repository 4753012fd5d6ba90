//! Mutation translator: one resolved root mutation field → one write
//! statement.
//!
//! The mutation kind is computed once up front into a [`MutationPlan`] and
//! dispatched by pattern match: a `@cypher` directive wins, then
//! `@MutationMeta` (relationship mutations), then the
//! `Create|Update|Merge|Delete` naming convention against a declared type.
//! Anything else is an [`TranslationError::UnrecognizedMutation`] — loudly,
//! never a silent no-op.

pub mod nested;
pub mod relationship;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::types::{type_constructor, TypeKind};
use crate::schema::{FieldDef, MutationMeta, SchemaCatalog, SchemaType};
use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::translate::selection::cypher_field::quote_statement;
use crate::translate::selection::{compile_projection, ProjectionTag};
use crate::translate::{ResolutionContext, Selection};
use crate::utils::naming::{escape, root_variable, to_delete_alias};
use crate::values::encode_integer_fields;

lazy_static! {
    static ref MUTATION_NAME: Regex =
        Regex::new(r"^(Create|Update|Merge|Delete|Add|Remove)([A-Z]\w*)$").unwrap();
}

/// The mutation strategy, decided once per translation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationPlan {
    Create { target: String },
    Update { target: String },
    Merge { target: String },
    Delete { target: String },
    RelationAdd { meta: MutationMeta },
    RelationRemove { meta: MutationMeta },
    RelationMergeUpdate { meta: MutationMeta, merge: bool },
    Custom { statement: String },
}

/// Classify a root mutation field. Directives on the `Mutation` type's
/// declaration take priority over the naming convention.
pub fn plan_mutation(
    catalog: &SchemaCatalog,
    field_name: &str,
) -> Result<MutationPlan, TranslationError> {
    let declaration = catalog.get("Mutation").and_then(|m| m.field(field_name));
    if let Some(declaration) = declaration {
        if let Some(statement) = declaration.cypher_statement() {
            return Ok(MutationPlan::Custom {
                statement: statement.to_string(),
            });
        }
        if let Some(meta) = crate::schema::directives::mutation_meta(
            &declaration.directives,
            &format!("Mutation.{}", field_name),
        )? {
            let plan = match MUTATION_NAME.captures(field_name).map(|c| c[1].to_string()) {
                Some(prefix) if prefix == "Add" => MutationPlan::RelationAdd { meta },
                Some(prefix) if prefix == "Remove" => MutationPlan::RelationRemove { meta },
                Some(prefix) if prefix == "Merge" => {
                    MutationPlan::RelationMergeUpdate { meta, merge: true }
                }
                Some(prefix) if prefix == "Update" => {
                    MutationPlan::RelationMergeUpdate { meta, merge: false }
                }
                _ => {
                    return Err(TranslationError::UnrecognizedMutation {
                        field: field_name.to_string(),
                    })
                }
            };
            return Ok(plan);
        }
    }

    let captures = MUTATION_NAME
        .captures(field_name)
        .ok_or_else(|| TranslationError::UnrecognizedMutation {
            field: field_name.to_string(),
        })?;
    let target = captures[2].to_string();
    if catalog.get(&target).map(|t| t.kind) != Some(TypeKind::Node) {
        return Err(TranslationError::UnrecognizedMutation {
            field: field_name.to_string(),
        });
    }
    match &captures[1] {
        "Create" => Ok(MutationPlan::Create { target }),
        "Update" => Ok(MutationPlan::Update { target }),
        "Merge" => Ok(MutationPlan::Merge { target }),
        "Delete" => Ok(MutationPlan::Delete { target }),
        // Add/Remove without @MutationMeta: nothing says which relationship.
        _ => Err(TranslationError::UnrecognizedMutation {
            field: field_name.to_string(),
        }),
    }
}

pub fn translate_mutation(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
) -> Result<String, TranslationError> {
    match plan_mutation(ctx.catalog, &resolution.field.name)? {
        MutationPlan::Create { target } => write_node(ctx, resolution, &target, WriteKind::Create),
        MutationPlan::Update { target } => write_node(ctx, resolution, &target, WriteKind::Update),
        MutationPlan::Merge { target } => write_node(ctx, resolution, &target, WriteKind::Merge),
        MutationPlan::Delete { target } => delete_node(ctx, resolution, &target),
        MutationPlan::RelationAdd { meta } => relationship::translate_add(ctx, resolution, &meta),
        MutationPlan::RelationRemove { meta } => {
            relationship::translate_remove(ctx, resolution, &meta)
        }
        MutationPlan::RelationMergeUpdate { meta, merge } => {
            relationship::translate_merge_update(ctx, resolution, &meta, merge)
        }
        MutationPlan::Custom { statement } => custom_mutation(ctx, resolution, &statement),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WriteKind {
    Create,
    Update,
    Merge,
}

/// Create/Update/Merge share a skeleton: bind or create the node, apply
/// properties from `$params`, splice nested blocks, project.
fn write_node(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
    target_name: &str,
    kind: WriteKind,
) -> Result<String, TranslationError> {
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let target = ctx.catalog.require(target_name)?;
    let variable = root_variable(&target.name);
    let declaration = mutation_declaration(ctx.catalog, &field.name);

    let (properties, params) = split_params(ctx.catalog, target, declaration, field, variables)?;
    let blocks = match declaration {
        Some(decl) => nested::compile_nested_blocks(ctx.catalog, decl, &params)?,
        None => Vec::new(),
    };
    ctx.add_named_param("params", Value::Object(params));

    let mut clauses = Vec::new();
    match kind {
        WriteKind::Create => {
            clauses.push(format!(
                "CREATE ({}:{} {{{}}})",
                escape(&variable),
                escape(&target.name),
                properties.join(", ")
            ));
        }
        WriteKind::Update | WriteKind::Merge => {
            if properties.is_empty() {
                return Err(TranslationError::MissingArgument {
                    field: field.name.clone(),
                    argument: "a key property".to_string(),
                });
            }
            // The @id field keys the match; first argument as a fallback.
            let key_index = target
                .fields
                .iter()
                .find(|f| f.is_id())
                .and_then(|id| {
                    properties
                        .iter()
                        .position(|p| p.starts_with(&format!("{}:", id.name)))
                })
                .unwrap_or(0);
            let key = properties[key_index].clone();
            let rest: Vec<String> = properties
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != key_index)
                .map(|(_, p)| p.clone())
                .collect();
            let verb = if kind == WriteKind::Merge { "MERGE" } else { "MATCH" };
            clauses.push(format!(
                "{} ({}:{} {{{}}})",
                verb,
                escape(&variable),
                escape(&target.name),
                key
            ));
            if !rest.is_empty() {
                clauses.push(format!(
                    "SET {} += {{{}}}",
                    escape(&variable),
                    rest.join(", ")
                ));
            }
        }
    }

    for block in blocks {
        clauses.push("WITH *".to_string());
        clauses.push(block);
    }

    let projection = compile_projection(
        ctx,
        target,
        &variable,
        &field.selections,
        variables,
        ProjectionTag::None,
    )?;
    clauses.push(format!(
        "RETURN {} {} AS {}",
        escape(&variable),
        projection,
        escape(&variable)
    ));
    Ok(clauses.join(" "))
}

/// Delete projects the node BEFORE detaching it; the bound variable is
/// re-aliased so the map projection survives the delete. Input-object
/// arguments never key the MATCH; they feed the nested blocks, which run
/// while the node still exists.
fn delete_node(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
    target_name: &str,
) -> Result<String, TranslationError> {
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let target = ctx.catalog.require(target_name)?;
    let variable = root_variable(&target.name);
    let alias = to_delete_alias(&variable);
    let declaration = mutation_declaration(ctx.catalog, &field.name);

    let mut properties = Vec::new();
    let mut params = Map::new();
    for (name, value) in field.args_except(&[], variables)? {
        let declared = declaration.and_then(|d| d.args.iter().find(|a| a.name == name));
        let is_nested = declared
            .map(|a| nested::input_object_type(ctx.catalog, a).is_some())
            .unwrap_or(false);
        if !is_nested {
            ctx.add_named_param(name.clone(), value.clone());
            properties.push(format!("{}:${}", name, name));
        }
        params.insert(name, value);
    }
    let blocks = match declaration {
        Some(decl) => nested::compile_nested_blocks(ctx.catalog, decl, &params)?,
        None => Vec::new(),
    };
    if !blocks.is_empty() {
        ctx.add_named_param("params", Value::Object(params));
    }

    let mut clauses = vec![format!(
        "MATCH ({}:{} {{{}}})",
        escape(&variable),
        escape(&target.name),
        properties.join(", ")
    )];
    for block in blocks {
        clauses.push("WITH *".to_string());
        clauses.push(block);
    }

    let projection = compile_projection(
        ctx,
        target,
        &variable,
        &field.selections,
        variables,
        ProjectionTag::None,
    )?;
    clauses.push(format!(
        "WITH {} AS {}, {} {} AS {} DETACH DELETE {} RETURN {}",
        escape(&variable),
        escape(&alias),
        escape(&variable),
        projection,
        escape(&variable),
        escape(&alias),
        escape(&variable)
    ));
    Ok(clauses.join(" "))
}

/// `@cypher` root mutation: run the statement through `apoc.cypher.doIt`,
/// unwrap its first returned column, then behave like any other mutation
/// tail (nested blocks, projection).
fn custom_mutation(
    ctx: &mut TranslationContext,
    resolution: &ResolutionContext,
    statement: &str,
) -> Result<String, TranslationError> {
    let field = &resolution.field;
    let variables = &resolution.variable_values;
    let target = ctx.catalog.require(&resolution.return_type)?;
    let variable = root_variable(&target.name);
    let declaration = mutation_declaration(ctx.catalog, &field.name);

    let mut apoc_args = Vec::new();
    for (name, value) in field.args_except(&[], variables)? {
        ctx.add_named_param(name.clone(), value);
        apoc_args.push(format!("{}: ${}", name, name));
    }
    apoc_args.push(format!("cypherParams: {}", ctx.bind_cypher_params()));

    let mut clauses = vec![
        format!(
            "CALL apoc.cypher.doIt(\"{}\", {{{}}}) YIELD value",
            quote_statement(statement),
            apoc_args.join(", ")
        ),
        format!(
            "WITH apoc.map.values(value, [keys(value)[0]])[0] AS {}",
            escape(&variable)
        ),
    ];

    if let Some(decl) = declaration {
        let args: Map<String, Value> = field
            .args_except(&[], variables)?
            .into_iter()
            .collect();
        let blocks = nested::compile_nested_blocks(ctx.catalog, decl, &args)?;
        if !blocks.is_empty() {
            ctx.add_named_param("params", Value::Object(args));
        }
        for block in blocks {
            clauses.push("WITH *".to_string());
            clauses.push(block);
        }
    }

    let projection = compile_projection(
        ctx,
        target,
        &variable,
        &field.selections,
        variables,
        ProjectionTag::None,
    )?;
    clauses.push(format!(
        "RETURN {} {} AS {}",
        escape(&variable),
        projection,
        escape(&variable)
    ));
    Ok(clauses.join(" "))
}

fn mutation_declaration<'c>(catalog: &'c SchemaCatalog, field_name: &str) -> Option<&'c FieldDef> {
    catalog.get("Mutation").and_then(|m| m.field(field_name))
}

/// Partition resolved arguments into inline property fragments
/// (`name:$params.name`, with temporal/spatial constructor wrapping and
/// integer normalization) and the serialized `$params` map. Arguments
/// declared as input objects are serialized but never rendered as node
/// properties; the nested compiler owns them.
fn split_params(
    catalog: &SchemaCatalog,
    target: &SchemaType,
    declaration: Option<&FieldDef>,
    field: &Selection,
    variables: &Map<String, Value>,
) -> Result<(Vec<String>, Map<String, Value>), TranslationError> {
    let mut properties = Vec::new();
    let mut params = Map::new();
    for (name, value) in field.args_except(&[], variables)? {
        let declared = declaration.and_then(|d| d.args.iter().find(|a| a.name == name));
        let is_nested = declared
            .map(|a| nested::input_object_type(catalog, a).is_some())
            .unwrap_or(false);
        if !is_nested {
            let rendered = match target
                .field(&name)
                .map(|f| type_constructor(&f.type_ref.name))
            {
                Some(Some(constructor)) => {
                    format!("{}:{}($params.{})", name, constructor, name)
                }
                _ => format!("{}:$params.{}", name, name),
            };
            properties.push(rendered);
        }
        params.insert(name, value);
    }
    // Numbers headed for Int-typed properties are normalized to 64-bit.
    let integer_fields: Vec<&str> = target
        .fields
        .iter()
        .filter(|f| f.type_ref.name == "Int")
        .map(|f| f.name.as_str())
        .collect();
    let params = match encode_integer_fields(&Value::Object(params), &integer_fields)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok((properties, params))
}
