//! `@cypher`-directive field projection.
//!
//! The directive's statement runs through `apoc.cypher.runFirstColumn` with
//! `this` bound to the enclosing entity and the field's GraphQL arguments
//! passed in the apoc parameter map. The ambient `cypherParams` value rides
//! along in every invocation so custom statements can reference request
//! context uniformly.

use serde_json::{Map, Value};

use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::translate::selection::{compile_projection, ProjectionTag};
use crate::schema::{FieldDef, TypeKind};
use crate::translate::Selection;
use crate::utils::naming::{child_variable, escape};

/// Escape a statement for embedding inside a double-quoted Cypher string.
pub fn quote_statement(statement: &str) -> String {
    statement.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Compile a `name: [ x IN apoc.cypher.runFirstColumn(...) | x ]` entry,
/// re-projecting recursively when the field returns an object type and
/// collapsing with `head(...)` when it is singular.
pub fn compile_cypher_field(
    ctx: &mut TranslationContext,
    field: &FieldDef,
    variable: &str,
    selection: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let statement = field
        .cypher_statement()
        .map(str::to_string)
        .unwrap_or_default();
    let cypher_params = ctx.bind_cypher_params();

    let mut apoc_args = vec![
        format!("this: {}", escape(variable)),
        format!("cypherParams: {}", cypher_params),
    ];
    let resolved = selection.args_except(&[], variables)?;
    if !resolved.is_empty() {
        let index = ctx.claim_param_index();
        for (arg, value) in resolved {
            let name = ctx.add_param(index, &arg, value);
            apoc_args.push(format!("{}: ${}", arg, name));
        }
    }

    let call = format!(
        "apoc.cypher.runFirstColumn(\"{}\", {{{}}}, true)",
        quote_statement(&statement),
        apoc_args.join(", ")
    );

    let is_object = ctx
        .catalog
        .get(&field.type_ref.name)
        .map(|t| {
            matches!(
                t.kind,
                TypeKind::Node | TypeKind::Interface | TypeKind::Union | TypeKind::ScalarPayload
            )
        })
        .unwrap_or(false);

    let list = if is_object && !selection.selections.is_empty() {
        let target = ctx.catalog.require(&field.type_ref.name)?;
        let iter = child_variable(variable, selection.output_key());
        let tag = if target.is_abstract() {
            ProjectionTag::Derived
        } else {
            ProjectionTag::None
        };
        let projection =
            compile_projection(ctx, target, &iter, &selection.selections, variables, tag)?;
        format!(
            "[{} IN {} | {} {}]",
            escape(&iter),
            call,
            escape(&iter),
            projection
        )
    } else {
        format!("[ x IN {} | x ]", call)
    };

    let fragment = if field.type_ref.list {
        list
    } else {
        format!("head({})", list)
    };
    Ok(format!("{}: {}", selection.output_key(), fragment))
}
