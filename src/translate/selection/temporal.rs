//! Temporal and spatial field projection.
//!
//! Neo4j stores these as native values; GraphQL exposes them as objects
//! (`{ year, month, formatted, ... }` or `{ x, y, crs }`). Each selected
//! component reads straight off the stored value, except `formatted`, which
//! stringifies the whole value.

use crate::schema::FieldDef;
use crate::translate::Selection;
use crate::utils::naming::escape;

/// `released: { year: `movie`.released.year, formatted: toString(`movie`.released) }`
pub fn compile_temporal_field(field: &FieldDef, variable: &str, selection: &Selection) -> String {
    let access = format!("{}.{}", escape(variable), field.name);
    let mut entries = Vec::new();
    for sub in &selection.selections {
        if sub.name == "__typename" {
            continue;
        }
        let value = if sub.name == "formatted" {
            format!("toString({})", access)
        } else {
            format!("{}.{}", access, sub.name)
        };
        entries.push(format!("{}: {}", sub.output_key(), value));
    }
    if entries.is_empty() {
        // No components selected: fall back to the stringified value.
        format!("{}: toString({})", selection.output_key(), access)
    } else {
        format!("{}: {{ {} }}", selection.output_key(), entries.join(", "))
    }
}
