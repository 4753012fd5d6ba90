//! Filter compiler tests: one filter object in, predicate strings plus the
//! serialized parameter value out. The serialized value is part of the
//! contract (null existentials become `true`, `_in` scalars become lists,
//! Int-bound numbers are 64-bit normalized).

#[cfg(test)]
mod filter_compilation_tests {
    use graphcypher::schema::SchemaCatalog;
    use graphcypher::translate::ctx::TranslationContext;
    use graphcypher::translate::errors::TranslationError;
    use graphcypher::translate::filter::{compile_filter, CompiledFilter};
    use serde_json::{json, Value};
    use test_case::test_case;

    const SCHEMA: &str = r#"
version: 1
types:
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
      - name: year
        type: { name: Int }
      - name: tags
        type: { name: String, list: true }
      - name: released
        type: { name: DateTime }
      - name: location
        type: { name: Point }
      - name: genre
        type: { name: Genre }
        directives:
          - name: relation
            args: { name: IN_GENRE, direction: OUT }
  - name: Genre
    kind: node
    fields:
      - name: name
        type: { name: String }
"#;

    fn compile(filter: Value) -> CompiledFilter {
        let catalog = SchemaCatalog::from_yaml(SCHEMA).unwrap();
        let mut ctx = TranslationContext::new(&catalog, None);
        let movie = catalog.require("Movie").unwrap();
        let object = filter.as_object().cloned().unwrap_or_default();
        compile_filter(&mut ctx, movie, "movie", "$filter", &object).unwrap()
    }

    fn compile_err(filter: Value) -> TranslationError {
        let catalog = SchemaCatalog::from_yaml(SCHEMA).unwrap();
        let mut ctx = TranslationContext::new(&catalog, None);
        let movie = catalog.require("Movie").unwrap();
        let object = filter.as_object().cloned().unwrap_or_default();
        compile_filter(&mut ctx, movie, "movie", "$filter", &object).unwrap_err()
    }

    #[test_case("title_contains", "(`movie`.title CONTAINS $filter.title_contains)"; "contains")]
    #[test_case("title_not_contains", "(NOT `movie`.title CONTAINS $filter.title_not_contains)"; "not contains")]
    #[test_case("title_starts_with", "(`movie`.title STARTS WITH $filter.title_starts_with)"; "starts with")]
    #[test_case("title_ends_with", "(`movie`.title ENDS WITH $filter.title_ends_with)"; "ends with")]
    #[test_case("title_regexp", "(`movie`.title =~ $filter.title_regexp)"; "regexp")]
    #[test_case("title_not", "(NOT `movie`.title = $filter.title_not)"; "not")]
    fn test_string_operator(key: &str, expected: &str) {
        let out = compile(json!({ key: "x" }));
        assert_eq!(out.predicates, vec![expected.to_string()]);
    }

    #[test]
    fn test_int_comparison_normalizes_value() {
        // GraphQL transports sometimes hand over 2000.0 for an Int.
        let out = compile(json!({"year_gte": 2000.0}));
        assert_eq!(out.predicates, vec!["(`movie`.year >= $filter.year_gte)"]);
        assert_eq!(out.serialized, json!({"year_gte": 2000}));
    }

    #[test]
    fn test_null_existential_pair() {
        let eq = compile(json!({"title": null}));
        assert_eq!(eq.predicates, vec!["(NOT EXISTS(`movie`.title))"]);
        assert_eq!(eq.serialized, json!({"title": true}));

        let not = compile(json!({"title_not": null}));
        assert_eq!(not.predicates, vec!["(EXISTS(`movie`.title))"]);
        assert_eq!(not.serialized, json!({"title_not": true}));
    }

    #[test]
    fn test_in_scalar_coerced_to_list() {
        let out = compile(json!({"year_in": 1999}));
        assert_eq!(out.predicates, vec!["(`movie`.year IN $filter.year_in)"]);
        assert_eq!(out.serialized, json!({"year_in": [1999]}));
    }

    #[test]
    fn test_list_property_membership_quantifies() {
        let out = compile(json!({"tags_in": ["noir"]}));
        assert_eq!(
            out.predicates,
            vec!["(ANY(x IN `movie`.tags WHERE x IN $filter.tags_in))"]
        );
        let out = compile(json!({"tags_not_in": ["noir"]}));
        assert_eq!(
            out.predicates,
            vec!["(NONE(x IN `movie`.tags WHERE x IN $filter.tags_not_in))"]
        );
    }

    #[test]
    fn test_list_value_on_scalar_field_rejected() {
        let err = compile_err(json!({"year": [1999, 2000]}));
        assert!(matches!(err, TranslationError::MalformedFilter { .. }));
    }

    #[test]
    fn test_and_list_guards_heterogeneous_elements() {
        let out = compile(json!({"AND": [{"year_gt": 1999}, {"title": "Heat"}]}));
        assert_eq!(
            out.predicates,
            vec![
                "(ALL(_AND IN $filter.AND WHERE \
                 (_AND.year_gt IS NULL OR (`movie`.year > _AND.year_gt)) AND \
                 (_AND.title IS NULL OR (`movie`.title = _AND.title))))"
            ]
        );
        assert_eq!(
            out.serialized,
            json!({"AND": [{"year_gt": 1999}, {"title": "Heat"}]})
        );
    }

    /// A `null` element inside an `AND` list keeps its existence-check
    /// meaning. The serialized sentinel is `true`, so the shared body
    /// dispatches on it before falling back to the equality branch.
    #[test]
    fn test_and_list_null_element_keeps_existential() {
        let out = compile(json!({"AND": [{"title": "Heat"}, {"title": null}]}));
        assert_eq!(
            out.predicates,
            vec![
                "(ALL(_AND IN $filter.AND WHERE \
                 (_AND.title IS NULL OR \
                 (_AND.title = true AND (NOT EXISTS(`movie`.title))) OR \
                 (`movie`.title = _AND.title))))"
            ]
        );
        assert_eq!(
            out.serialized,
            json!({"AND": [{"title": "Heat"}, {"title": true}]})
        );
    }

    #[test]
    fn test_or_list_all_null_key_compiles_existential_only() {
        let out = compile(json!({"OR": [{"title_not": null}, {"year": 2000}]}));
        assert_eq!(
            out.predicates,
            vec![
                "(ANY(_OR IN $filter.OR WHERE \
                 (_OR.title_not IS NULL OR (EXISTS(`movie`.title))) AND \
                 (_OR.year IS NULL OR (`movie`.year = _OR.year))))"
            ]
        );
        assert_eq!(
            out.serialized,
            json!({"OR": [{"title_not": true}, {"year": 2000}]})
        );
    }

    #[test]
    fn test_node_relation_subfilter_quantifies_pattern() {
        let out = compile(json!({"genre": {"name": "Drama"}}));
        assert_eq!(
            out.predicates,
            vec![
                "(ALL(`genre` IN [(`movie`)-[:`IN_GENRE`]->(`genre`:`Genre`) | `genre`] \
                 WHERE (`genre`.name = $filter.genre.name)))"
            ]
        );
    }

    #[test]
    fn test_node_relation_null_is_pattern_existential() {
        let out = compile(json!({"genre": null}));
        assert_eq!(
            out.predicates,
            vec!["(NOT EXISTS((`movie`)-[:`IN_GENRE`]->(:`Genre`)))"]
        );
        assert_eq!(out.serialized, json!({"genre": true}));
    }

    #[test]
    fn test_temporal_formatted_only_compares_strings() {
        let out = compile(json!({"released": {"formatted": "2020-01-01T00:00:00Z"}}));
        assert_eq!(
            out.predicates,
            vec!["(toString(`movie`.released) = $filter.released.formatted)"]
        );
    }

    #[test]
    fn test_temporal_components_go_through_constructor() {
        let out = compile(json!({"released_gt": {"year": 1999}}));
        assert_eq!(
            out.predicates,
            vec!["(`movie`.released > datetime($filter.released_gt))"]
        );
    }

    #[test]
    fn test_distance_filter() {
        let filter = json!({
            "location_distance_lt": {
                "point": {"longitude": 13.4, "latitude": 52.5},
                "distance": 5000
            }
        });
        let out = compile(filter);
        assert_eq!(
            out.predicates,
            vec![
                "(distance(`movie`.location, point($filter.location_distance_lt.point)) \
                 < $filter.location_distance_lt.distance)"
            ]
        );
    }

    #[test]
    fn test_empty_nested_relation_filter_imposes_nothing() {
        let out = compile(json!({"genre": {}}));
        assert!(out.predicates.is_empty());
        assert_eq!(out.serialized, json!({"genre": {}}));
    }

    #[test]
    fn test_unknown_filter_field_rejected() {
        let err = compile_err(json!({"budget_gt": 1}));
        assert!(matches!(err, TranslationError::Schema(_)));
    }
}
