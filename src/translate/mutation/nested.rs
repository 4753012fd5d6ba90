//! Nested-mutation block compiler.
//!
//! A mutation argument may be an input object whose fields declare `@cypher`
//! write statements (`liked: { create: [...] }`). Each such field becomes a
//! `CALL { WITH * UNWIND $params.<path> AS <InputType> <stmt> RETURN COUNT(*)
//! AS _<path>_ }` subquery spliced into the generated statement, in
//! declaration order. The declared statement's own `WITH` clauses get
//! surgically extended so the `UNWIND` variable survives into nested blocks;
//! that surgery runs on a top-level clause scan, never on a regex, because
//! `WITH` can legitimately appear inside string literals and subquery braces.

use serde_json::{Map, Value};

use crate::schema::{FieldDef, SchemaCatalog, SchemaType};
use crate::translate::errors::TranslationError;
use crate::utils::naming::{nested_block_alias, unwind_export_alias};

/// Clause keywords that terminate a `WITH` item list at nesting depth zero.
const CLAUSE_KEYWORDS: &[&str] = &[
    "MATCH", "OPTIONAL", "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "WITH", "UNWIND",
    "RETURN", "CALL", "FOREACH", "WHERE", "ORDER", "SKIP", "LIMIT", "UNION",
];

/// Scan a Cypher statement for top-level clause keywords: byte offset plus
/// the uppercased keyword. Keywords inside string literals, backtick-quoted
/// identifiers, or any bracket/brace/paren nesting are not clause boundaries.
pub fn scan_top_level_clauses(statement: &str) -> Vec<(usize, String)> {
    let bytes = statement.as_bytes();
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' && q != b'`' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' | b'`' => {
                quote = Some(c);
                i += 1;
                continue;
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
                continue;
            }
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                i += 1;
                continue;
            }
            _ => {}
        }
        if c.is_ascii_alphabetic() {
            let boundary = i == 0 || (!is_word_byte(bytes[i - 1]) && bytes[i - 1] != b'.');
            let mut j = i;
            while j < bytes.len() && is_word_byte(bytes[j]) {
                j += 1;
            }
            if depth == 0 && boundary {
                let word = statement[i..j].to_ascii_uppercase();
                if CLAUSE_KEYWORDS.contains(&word.as_str()) {
                    out.push((i, word));
                }
            }
            i = j;
            continue;
        }
        i += 1;
    }
    out
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Extend a declared statement's `WITH` clauses so `variable` stays in scope:
/// zero `WITH`s appends an export clause, a leading `WITH` gets the variable
/// appended to its import items, a trailing `WITH` gets an export alias, and
/// with two or more the first imports and the last exports. Returns the
/// rewritten statement and whether the `_<variable>` export alias exists.
pub fn rewrite_with_clauses(statement: &str, variable: &str) -> (String, bool) {
    let statement = statement.trim();
    let clauses = scan_top_level_clauses(statement);
    let withs: Vec<usize> = clauses
        .iter()
        .enumerate()
        .filter(|(_, (_, kw))| kw == "WITH")
        .map(|(idx, _)| idx)
        .collect();

    let export = format!(", {} AS {}", variable, unwind_export_alias(variable));
    if withs.is_empty() {
        return (
            format!("{} WITH *{}", statement, export),
            true,
        );
    }

    // End of a clause's item list: the next clause keyword, trailing
    // whitespace excluded.
    let span_end = |clause_idx: usize| -> usize {
        let mut end = clauses
            .get(clause_idx + 1)
            .map(|(start, _)| *start)
            .unwrap_or(statement.len());
        while end > 0 && statement.as_bytes()[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        end
    };

    let first = withs[0];
    let last = *withs.last().unwrap();
    let first_at_start = clauses[first].0 == 0;
    let last_at_end = span_end(last) == statement.len();

    let (import_at, export_at) = if withs.len() >= 2 {
        (Some(span_end(first)), Some(span_end(last)))
    } else if first_at_start {
        (Some(span_end(first)), None)
    } else if last_at_end {
        (None, Some(span_end(last)))
    } else {
        (None, None)
    };

    let mut rewritten = statement.to_string();
    let mut exported = false;
    // Back-to-front so earlier offsets stay valid.
    if let Some(at) = export_at {
        rewritten.insert_str(at, &export);
        exported = true;
    }
    if let Some(at) = import_at {
        rewritten.insert_str(at, &format!(", {}", variable));
    }
    (rewritten, exported)
}

/// Compile every nested block of a mutation, in argument declaration order.
/// `decl` is the root mutation field's declaration; `args` the resolved
/// argument values. Blocks are self-contained `CALL { ... }` strings, ready
/// to chain with `WITH *`.
pub fn compile_nested_blocks(
    catalog: &SchemaCatalog,
    decl: &FieldDef,
    args: &Map<String, Value>,
) -> Result<Vec<String>, TranslationError> {
    let mut blocks = Vec::new();
    for arg in &decl.args {
        let Some(input_type) = input_object_type(catalog, arg) else {
            continue;
        };
        let Some(value) = args.get(&arg.name) else {
            continue;
        };
        descend(catalog, input_type, value, &mut vec![arg.name.clone()], &mut blocks)?;
    }
    Ok(blocks)
}

/// Whether an argument's declared type is an input object the nested
/// compiler should walk.
pub fn input_object_type<'c>(catalog: &'c SchemaCatalog, arg: &FieldDef) -> Option<&'c SchemaType> {
    let t = catalog.get(&arg.type_ref.name)?;
    if catalog.is_node_like(&t.name) || catalog.is_relationship_payload(&t.name) {
        return None;
    }
    Some(t)
}

fn descend(
    catalog: &SchemaCatalog,
    input_type: &SchemaType,
    value: &Value,
    path: &mut Vec<String>,
    blocks: &mut Vec<String>,
) -> Result<(), TranslationError> {
    for field in &input_type.fields {
        if !value_has_key(value, &field.name) {
            continue;
        }
        path.push(field.name.clone());
        if field.cypher_statement().is_some() {
            let field_value = value_for_key(value, &field.name);
            blocks.push(compile_call_block(catalog, field, field_value.as_ref(), path)?);
        } else if let Some(nested) = input_object_type(catalog, field) {
            // The wrapper value may itself be a list of objects.
            if let Some(inner) = value_for_key(value, &field.name) {
                descend(catalog, nested, &inner, path, blocks)?;
            }
        }
        path.pop();
    }
    Ok(())
}

/// One `CALL { WITH * UNWIND $params.<path> AS <V> <stmt> <children> RETURN
/// COUNT(*) AS _<path>_ }` block. Scalar nested values UNWIND the same way
/// lists do (UNWIND of a map yields one row).
fn compile_call_block(
    catalog: &SchemaCatalog,
    field: &FieldDef,
    field_value: Option<&Value>,
    path: &[String],
) -> Result<String, TranslationError> {
    let unwind_var = field.type_ref.name.clone();
    let statement = field.cypher_statement().unwrap_or_default();
    let (rewritten, exported) = rewrite_with_clauses(statement, &unwind_var);
    let parent_ref = if exported {
        unwind_export_alias(&unwind_var)
    } else {
        unwind_var.clone()
    };

    let mut body = format!(
        "WITH * UNWIND $params.{} AS {} {}",
        path.join("."),
        unwind_var,
        rewritten
    );
    if let Some(element_type) = catalog.get(&field.type_ref.name) {
        let children = compile_child_blocks(catalog, element_type, field_value, &parent_ref)?;
        for child in children {
            body.push(' ');
            body.push_str(&child);
        }
    }

    let parts: Vec<&str> = path.iter().map(String::as_str).collect();
    Ok(format!(
        "CALL {{ {} RETURN COUNT(*) AS {} }}",
        body,
        nested_block_alias(&parts)
    ))
}

/// Blocks for `@cypher` input fields of the element type itself, UNWINDing
/// from the parent variable rather than `$params`.
fn compile_child_blocks(
    catalog: &SchemaCatalog,
    element_type: &SchemaType,
    value: Option<&Value>,
    parent_ref: &str,
) -> Result<Vec<String>, TranslationError> {
    let mut out = Vec::new();
    for field in &element_type.fields {
        let present = value.map(|v| value_has_key(v, &field.name)).unwrap_or(false);
        if !present || field.cypher_statement().is_none() {
            continue;
        }
        let child_var = field.type_ref.name.clone();
        let statement = field.cypher_statement().unwrap_or_default();
        let (rewritten, exported) = rewrite_with_clauses(statement, &child_var);
        let child_ref = if exported {
            unwind_export_alias(&child_var)
        } else {
            child_var.clone()
        };
        let mut block = format!(
            "UNWIND {}.{} AS {} {}",
            parent_ref, field.name, child_var, rewritten
        );
        if let Some(grandchild_type) = catalog.get(&field.type_ref.name) {
            let inner = value
                .and_then(|v| value_for_key(v, &field.name));
            for grandchild in
                compile_child_blocks(catalog, grandchild_type, inner.as_ref(), &child_ref)?
            {
                block.push(' ');
                block.push_str(&grandchild);
            }
        }
        out.push(block);
    }
    Ok(out)
}

/// Key presence across both value shapes: an object's own keys, or the union
/// of keys over a list of objects.
fn value_has_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map.contains_key(key),
        Value::Array(items) => items.iter().any(|v| value_has_key(v, key)),
        _ => false,
    }
}

fn value_for_key(value: &Value, key: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get(key).cloned(),
        Value::Array(items) => items.iter().find_map(|v| value_for_key(v, key)),
        _ => None,
    }
}
