//! Filter operator vocabulary and suffix parsing.
//!
//! Filter keys carry their operation as a suffix (`name_not_in`). Parsing is
//! a longest-suffix match against a fixed vocabulary so `_not_in` wins over
//! `_in`, `_distance_lt` over `_lt`, and a property that merely ends in
//! `in` (`origin`) is never misread.

use lazy_static::lazy_static;

/// Comparison/operation carried by a filter key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Bare key, no suffix: equality (or quantified ALL for relation fields).
    Eq,
    Not,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    Lt,
    Lte,
    Gt,
    Gte,
    Regexp,
    Distance,
    DistanceLt,
    DistanceLte,
    DistanceGt,
    DistanceGte,
    /// Relation quantifiers.
    Some,
    None,
    Single,
    Every,
}

impl FilterOp {
    /// Cypher comparison operator for scalar leaves; `None` for shapes that
    /// are not plain binary comparisons.
    pub fn comparison(self) -> Option<&'static str> {
        match self {
            FilterOp::Eq | FilterOp::Not => Some("="),
            FilterOp::In | FilterOp::NotIn => Some("IN"),
            FilterOp::Contains | FilterOp::NotContains => Some("CONTAINS"),
            FilterOp::StartsWith | FilterOp::NotStartsWith => Some("STARTS WITH"),
            FilterOp::EndsWith | FilterOp::NotEndsWith => Some("ENDS WITH"),
            FilterOp::Lt | FilterOp::DistanceLt => Some("<"),
            FilterOp::Lte | FilterOp::DistanceLte => Some("<="),
            FilterOp::Gt | FilterOp::DistanceGt => Some(">"),
            FilterOp::Gte | FilterOp::DistanceGte => Some(">="),
            FilterOp::Regexp => Some("=~"),
            FilterOp::Distance => Some("="),
            _ => None,
        }
    }

    /// Whether the comparison is negated (`NOT <expr>`).
    pub fn negated(self) -> bool {
        matches!(
            self,
            FilterOp::Not
                | FilterOp::NotIn
                | FilterOp::NotContains
                | FilterOp::NotStartsWith
                | FilterOp::NotEndsWith
        )
    }

    pub fn is_distance(self) -> bool {
        matches!(
            self,
            FilterOp::Distance
                | FilterOp::DistanceLt
                | FilterOp::DistanceLte
                | FilterOp::DistanceGt
                | FilterOp::DistanceGte
        )
    }

    /// Cypher predicate function for relation-field quantification.
    pub fn quantifier(self) -> Option<&'static str> {
        match self {
            FilterOp::Some => Some("ANY"),
            FilterOp::None | FilterOp::Not => Some("NONE"),
            FilterOp::Single => Some("SINGLE"),
            FilterOp::Every | FilterOp::Eq => Some("ALL"),
            _ => Option::None,
        }
    }
}

lazy_static! {
    /// Suffix vocabulary ordered longest-first so iteration order alone
    /// implements longest-suffix matching.
    static ref SUFFIXES: Vec<(&'static str, FilterOp)> = {
        let mut v: Vec<(&'static str, FilterOp)> = vec![
            ("_not_starts_with", FilterOp::NotStartsWith),
            ("_not_ends_with", FilterOp::NotEndsWith),
            ("_not_contains", FilterOp::NotContains),
            ("_distance_lte", FilterOp::DistanceLte),
            ("_distance_gte", FilterOp::DistanceGte),
            ("_distance_lt", FilterOp::DistanceLt),
            ("_distance_gt", FilterOp::DistanceGt),
            ("_starts_with", FilterOp::StartsWith),
            ("_ends_with", FilterOp::EndsWith),
            ("_distance", FilterOp::Distance),
            ("_contains", FilterOp::Contains),
            ("_not_in", FilterOp::NotIn),
            ("_regexp", FilterOp::Regexp),
            ("_single", FilterOp::Single),
            ("_every", FilterOp::Every),
            ("_some", FilterOp::Some),
            ("_none", FilterOp::None),
            ("_not", FilterOp::Not),
            ("_lte", FilterOp::Lte),
            ("_gte", FilterOp::Gte),
            ("_in", FilterOp::In),
            ("_lt", FilterOp::Lt),
            ("_gt", FilterOp::Gt),
        ];
        // Defensive ordering independent of the literal list above.
        v.sort_by_key(|(suffix, _)| std::cmp::Reverse(suffix.len()));
        v
    };
}

/// Split a filter key into `(field_name, op)` by longest-suffix match.
///
/// A key that consists only of a suffix (`"_not"`) is a field named that
/// way, not an operation on an empty field name.
pub fn parse_filter_key(key: &str) -> (&str, FilterOp) {
    for (suffix, op) in SUFFIXES.iter() {
        if let Some(field) = key.strip_suffix(suffix) {
            if !field.is_empty() {
                return (field, *op);
            }
        }
    }
    (key, FilterOp::Eq)
}
