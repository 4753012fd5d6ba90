//! Inline-fragment handling for interface and union fields.
//!
//! A fragmented abstract selection compiles to one pattern comprehension per
//! concrete type condition, each guarded by a label-membership predicate and
//! injecting a literal `FRAGMENT_TYPE`, concatenated with `+`. Selections
//! outside any fragment (the abstract type's own fields) are repeated inside
//! every branch so each concrete projection is self-contained.

use serde_json::{Map, Value};

use crate::schema::types::TypeKind;
use crate::schema::SchemaType;
use crate::translate::ctx::TranslationContext;
use crate::translate::errors::TranslationError;
use crate::translate::selection::{compile_projection, ProjectionTag};
use crate::translate::Selection;
use crate::utils::naming::escape;

/// Compile `[(...) WHERE "X" IN labels(v) ... | v {FRAGMENT_TYPE:"X", ...}] +
/// [...]` for a node-relation field whose target is abstract and whose
/// selection carries inline fragments.
#[allow(clippy::too_many_arguments)]
pub fn compile_fragmented_comprehension(
    ctx: &mut TranslationContext,
    target: &SchemaType,
    variable: &str,
    path: &str,
    rel_name: &str,
    arrows: (&str, &str),
    predicates: &[String],
    selection: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let (left, right) = arrows;
    // Interfaces label the pattern with the interface name; unions cannot.
    let label = match target.kind {
        TypeKind::Interface => format!(":{}", escape(&target.name)),
        _ => String::new(),
    };

    let mut branches = Vec::new();
    for fragment in &selection.fragments {
        let concrete = ctx.catalog.require(&fragment.type_condition)?;
        let mut branch_predicates = vec![format!(
            "(\"{}\" IN labels({}))",
            concrete.name,
            escape(path)
        )];
        branch_predicates.extend_from_slice(predicates);

        // Shared selections first, then the fragment's own.
        let mut selections: Vec<Selection> = selection.selections.clone();
        selections.extend(fragment.selections.iter().cloned());

        let projection = compile_projection(
            ctx,
            concrete,
            path,
            &selections,
            variables,
            ProjectionTag::Literal(concrete.name.clone()),
        )?;
        branches.push(format!(
            "[({}){}[:{}]{}({}{}) WHERE {} | {} {}]",
            escape(variable),
            left,
            escape(rel_name),
            right,
            escape(path),
            label,
            branch_predicates.join(" AND "),
            escape(path),
            projection
        ));
    }

    Ok(branches.join(" + "))
}

/// Root-level fragments have no traversal pattern to guard, so each branch
/// quantifies over the single bound variable:
/// `[`v` IN [`v`] WHERE "X" IN labels(`v`) | `v` {FRAGMENT_TYPE:"X", ...}] + ...`,
/// collapsed with `head(...)` by the caller per row.
pub fn compile_root_fragments(
    ctx: &mut TranslationContext,
    variable: &str,
    selection: &Selection,
    variables: &Map<String, Value>,
) -> Result<String, TranslationError> {
    let mut branches = Vec::new();
    for fragment in &selection.fragments {
        let concrete = ctx.catalog.require(&fragment.type_condition)?;
        let mut selections: Vec<Selection> = selection.selections.clone();
        selections.extend(fragment.selections.iter().cloned());
        let projection = compile_projection(
            ctx,
            concrete,
            variable,
            &selections,
            variables,
            ProjectionTag::Literal(concrete.name.clone()),
        )?;
        branches.push(format!(
            "[{} IN [{}] WHERE \"{}\" IN labels({}) | {} {}]",
            escape(variable),
            escape(variable),
            concrete.name,
            escape(variable),
            escape(variable),
            projection
        ));
    }
    Ok(format!("head({})", branches.join(" + ")))
}
