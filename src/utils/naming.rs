//! Centralized naming utilities for generated Cypher identifiers and parameters.
//!
//! **CRITICAL**: every generated variable and parameter name MUST come from
//! these functions. Uniqueness of Cypher bindings within one statement is
//! guaranteed by path-based naming, not by a counter, so any divergence in how
//! two call sites derive a name from the same GraphQL path breaks the
//! statement (a binding is emitted under one name and referenced under
//! another).
//!
//! ## Naming Convention
//! - Root variable: lowercased type name (`Movie` → `movie`)
//! - Nested variable: `{parent}_{fieldName}` (`movie` + `actors` → `movie_actors`)
//! - Relationship binding: node-path name + `_relation` suffix
//! - Nested parameter: `{index}_{argName}` (`1_filter`), root arguments unprefixed
//!
//! Examples:
//! - path `a` → `bArray` → `B` → `cArray` binds the relationship
//!   `a_bArray_B_cArray_relation`

/// Escape an identifier for safe embedding in Cypher.
///
/// Backticks delimit, embedded backticks are doubled.
///
/// # Examples
/// ```
/// use graphcypher::utils::naming::escape;
///
/// assert_eq!(escape("movie"), "`movie`");
/// assert_eq!(escape("weird`name"), "`weird``name`");
/// ```
pub fn escape(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Root Cypher variable for a schema type: the type name lowercased.
///
/// # Examples
/// ```
/// use graphcypher::utils::naming::root_variable;
///
/// assert_eq!(root_variable("Movie"), "movie");
/// assert_eq!(root_variable("FilmGenre"), "filmgenre");
/// ```
pub fn root_variable(type_name: &str) -> String {
    type_name.to_lowercase()
}

/// Variable for a nested field: `{parent}_{field}`.
///
/// # Examples
/// ```
/// use graphcypher::utils::naming::child_variable;
///
/// assert_eq!(child_variable("movie", "actors"), "movie_actors");
/// assert_eq!(child_variable("a_bArray", "B"), "a_bArray_B");
/// ```
pub fn child_variable(parent: &str, field_name: &str) -> String {
    format!("{}_{}", parent, field_name)
}

/// Variable bound to a relationship rather than a node.
///
/// # Examples
/// ```
/// use graphcypher::utils::naming::relation_variable;
///
/// assert_eq!(relation_variable("a_bArray"), "a_bArray_relation");
/// ```
pub fn relation_variable(node_path: &str) -> String {
    format!("{}_relation", node_path)
}

/// Parameter name for an argument at a nesting level.
///
/// Index 0 is the root field: arguments keep their bare names. Any deeper
/// level prefixes the traversal-order index (`1_filter`, `2_orderBy`, ...).
///
/// # Examples
/// ```
/// use graphcypher::utils::naming::param_name;
///
/// assert_eq!(param_name(0, "filter"), "filter");
/// assert_eq!(param_name(1, "filter"), "1_filter");
/// assert_eq!(param_name(3, "orderBy"), "3_orderBy");
/// ```
pub fn param_name(index: usize, arg_name: &str) -> String {
    if index == 0 {
        arg_name.to_string()
    } else {
        format!("{}_{}", index, arg_name)
    }
}

/// Parameter name holding the precomputed concrete types of an interface or
/// union (`$Person_derivedTypes`).
pub fn derived_types_param(type_name: &str) -> String {
    format!("{}_derivedTypes", type_name)
}

/// Alias under which a mutation's bound node survives `DETACH DELETE`.
pub fn to_delete_alias(variable: &str) -> String {
    format!("{}_toDelete", variable)
}

/// Endpoint variables for relationship mutations (`movie_from`, `genre_to`).
pub fn endpoint_variable(type_name: &str, end: &str) -> String {
    format!("{}_{}", root_variable(type_name), end)
}

/// `RETURN COUNT(*) AS _liked_create_` alias for one nested mutation block.
pub fn nested_block_alias(path: &[&str]) -> String {
    format!("_{}_", path.join("_"))
}

/// Export alias shielding an UNWIND variable from a same-named deeper UNWIND.
pub fn unwind_export_alias(input_type: &str) -> String {
    format!("_{}", input_type)
}
