//! Parameter values and wire encoding.
//!
//! Translation produces a `(statement, parameters)` pair. Parameters are
//! carried as [`serde_json::Value`] (with `preserve_order` enabled, so a bag
//! serializes identically across runs — determinism is a tested property).
//!
//! ## Integer Encoding
//!
//! Values destined for integer-typed graph properties MUST travel as 64-bit
//! integers, never IEEE-754 doubles: above 2^53 a double silently loses
//! precision, which corrupts IDs and counters on the way to the database.
//! [`encode_integer`] is the single choke point for that conversion. A whole
//! double inside the safe range is coerced (GraphQL transports sometimes hand
//! us `3.0` for an Int); anything else is an error, not a truncation.

use serde_json::{Map, Value};

use crate::translate::errors::TranslationError;

/// Largest double that still round-trips to the same i64 (2^53).
const MAX_SAFE_DOUBLE: f64 = 9_007_199_254_740_992.0;

/// Insertion-ordered collection of named parameter values.
///
/// Built incrementally as the recursion unwinds; entries are merged, never
/// overwritten. Path-based parameter naming makes collisions impossible for
/// well-formed input, so an attempted overwrite indicates a translator bug
/// and panics in debug builds only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    entries: Map<String, Value>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one parameter. First writer wins.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if self.entries.contains_key(&name) {
            debug_assert!(
                self.entries.get(&name) == Some(&value),
                "parameter `{}` rebound with a different value",
                name
            );
            return;
        }
        self.entries.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// View as a JSON object, ready to hand to a driver session.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Consume into the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.entries
    }
}

impl From<ParameterBag> for Value {
    fn from(bag: ParameterBag) -> Value {
        Value::Object(bag.entries)
    }
}

/// Normalize a JSON number destined for an integer-typed property to i64.
///
/// Accepts native integers and whole doubles within ±2^53. Fractional or
/// out-of-range doubles fail with [`TranslationError::IntegerOverflow`].
pub fn encode_integer(value: &Value) -> Result<Value, TranslationError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::from(i));
            }
            if let Some(u) = n.as_u64() {
                // u64 beyond i64::MAX cannot ride the wire as a signed integer
                return i64::try_from(u).map(Value::from).map_err(|_| {
                    TranslationError::IntegerOverflow {
                        value: value.to_string(),
                    }
                });
            }
            let f = n.as_f64().unwrap_or(f64::NAN);
            if f.fract() == 0.0 && f.abs() <= MAX_SAFE_DOUBLE {
                Ok(Value::from(f as i64))
            } else {
                Err(TranslationError::IntegerOverflow {
                    value: value.to_string(),
                })
            }
        }
        _ => Err(TranslationError::IntegerOverflow {
            value: value.to_string(),
        }),
    }
}

/// Recursively normalize every number in `value` that sits under a key named
/// in `integer_fields` (used when serializing property maps whose schema
/// declares Int fields).
pub fn encode_integer_fields(
    value: &Value,
    integer_fields: &[&str],
) -> Result<Value, TranslationError> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                if integer_fields.contains(&k.as_str()) && v.is_number() {
                    out.insert(k.clone(), encode_integer(v)?);
                } else {
                    out.insert(k.clone(), encode_integer_fields(v, integer_fields)?);
                }
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let encoded: Result<Vec<Value>, _> = items
                .iter()
                .map(|v| encode_integer_fields(v, integer_fields))
                .collect();
            Ok(Value::Array(encoded?))
        }
        other => Ok(other.clone()),
    }
}
