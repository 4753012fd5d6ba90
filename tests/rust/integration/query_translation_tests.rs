//! Read-path translation: root binding shapes, nested relationship
//! projections, fragments, and full-text search.

#[cfg(test)]
mod query_translation_tests {
    use graphcypher::schema::SchemaCatalog;
    use graphcypher::translate::{translate, Fragment, ResolutionContext, Selection};
    use serde_json::{json, Value};

    const SCHEMA: &str = r#"
version: 1
types:
  - name: A
    kind: node
    fields:
      - name: id
        type: { name: ID }
        directives: [{ name: id }]
      - name: bArray
        type: { name: A_B_Relation, list: true, non_null: true }
  - name: B
    kind: node
    fields:
      - name: id
        type: { name: ID }
      - name: cArray
        type: { name: B_C_Relation, list: true, non_null: true }
  - name: C
    kind: node
    fields:
      - name: id
        type: { name: ID }
  - name: A_B_Relation
    kind: relationship_payload
    directives:
      - name: relation
        args: { name: A_TO_B, from: A, to: B }
    fields:
      - name: A
        type: { name: A }
      - name: B
        type: { name: B }
  - name: B_C_Relation
    kind: relationship_payload
    directives:
      - name: relation
        args: { name: B_TO_C, from: B, to: C }
    fields:
      - name: B
        type: { name: B }
      - name: C
        type: { name: C }
      - name: active
        type: { name: Boolean }
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
        directives: [{ name: search }]
      - name: year
        type: { name: Int }
  - name: Person
    kind: interface
    fields:
      - name: name
        type: { name: String }
  - name: Actor
    kind: node
    implements: [Person]
    fields:
      - name: name
        type: { name: String }
      - name: awards
        type: { name: Int }
  - name: Director
    kind: node
    implements: [Person]
    fields:
      - name: name
        type: { name: String }
  - name: Query
    kind: scalar_payload
    fields:
      - name: recommendations
        type: { name: Movie, list: true }
        directives:
          - name: cypher
            args: { statement: "MATCH (m:Movie) RETURN m LIMIT $limit" }
"#;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_yaml(SCHEMA).unwrap()
    }

    /// The committed deep-traversal shape: each hop binds the relationship
    /// under its path name, the nested filter claims `$1_filter`, and
    /// `first`/`offset` ride along with their defaults.
    #[test]
    fn test_deep_payload_traversal() {
        let catalog = catalog();
        let field = Selection::new("A").with_selections(vec![Selection::new("bArray")
            .with_selections(vec![Selection::new("B").with_selections(vec![
                Selection::new("cArray")
                    .with_args(vec![("filter".to_string(), json!({"active": true}).into())])
                    .with_selections(vec![
                        Selection::new("C").with_selections(vec![Selection::new("id")])
                    ]),
            ])])]);
        let out = translate(&catalog, &ResolutionContext::query(field, "A")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`a`:`A`) RETURN `a` { bArray: [(`a`)-[`a_bArray_relation`:`A_TO_B`]->\
             (`a_bArray_B`:`B`) | `a_bArray_relation` { B: `a_bArray_B` { cArray: \
             [(`a_bArray_B`)-[`a_bArray_B_cArray_relation`:`B_TO_C`]->\
             (`a_bArray_B_cArray_C`:`C`) \
             WHERE (`a_bArray_B_cArray_relation`.active = $1_filter.active) \
             | `a_bArray_B_cArray_relation` { C: `a_bArray_B_cArray_C` { .id } }] } }] } \
             AS `a`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"1_filter": {"active": true}, "first": -1, "offset": 0})
        );
    }

    #[test]
    fn test_interface_root_derives_fragment_type_from_labels() {
        let catalog = catalog();
        let field = Selection::new("Person").with_selections(vec![Selection::new("name")]);
        let out = translate(&catalog, &ResolutionContext::query(field, "Person")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`person`:`Person`) RETURN `person` \
             { FRAGMENT_TYPE: head([ x IN labels(`person`) WHERE x IN $Person_derivedTypes ]), \
             .name } AS `person`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"Person_derivedTypes": ["Actor", "Director"], "first": -1, "offset": 0})
        );
    }

    #[test]
    fn test_interface_root_with_fragments_branches_per_condition() {
        let catalog = catalog();
        let field = Selection::new("Person")
            .with_selections(vec![Selection::new("name")])
            .with_fragments(vec![
                Fragment {
                    type_condition: "Actor".to_string(),
                    selections: vec![Selection::new("awards")],
                },
                Fragment {
                    type_condition: "Director".to_string(),
                    selections: vec![],
                },
            ]);
        let out = translate(&catalog, &ResolutionContext::query(field, "Person")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`person`:`Person`) RETURN head(\
             [`person` IN [`person`] WHERE \"Actor\" IN labels(`person`) | `person` \
             { FRAGMENT_TYPE: \"Actor\", .name, .awards }] + \
             [`person` IN [`person`] WHERE \"Director\" IN labels(`person`) | `person` \
             { FRAGMENT_TYPE: \"Director\", .name }]) AS `person`"
        );
    }

    #[test]
    fn test_fulltext_search_with_property_argument() {
        let catalog = catalog();
        let field = Selection::new("Movie")
            .with_args(vec![
                ("search".to_string(), json!("river~").into()),
                ("threshold".to_string(), json!(0.7).into()),
                ("year".to_string(), json!(1999).into()),
            ])
            .with_selections(vec![Selection::new("title")]);
        let out = translate(&catalog, &ResolutionContext::query(field, "Movie")).unwrap();
        assert_eq!(
            out.statement,
            "CALL db.index.fulltext.queryNodes(\"MovieSearch\", $search) \
             YIELD node AS `movie`, score \
             WHERE score >= $threshold AND (`movie`.year = $year) \
             RETURN `movie` { .title } AS `movie`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"search": "river~", "threshold": 0.7, "year": 1999,
                   "first": -1, "offset": 0})
        );
    }

    #[test]
    fn test_root_cypher_declaration_unwinds_first_column() {
        let catalog = catalog();
        let field = Selection::new("recommendations")
            .with_args(vec![("limit".to_string(), json!(5).into())])
            .with_selections(vec![Selection::new("title")]);
        let resolution = ResolutionContext::query(field, "Movie")
            .with_cypher_params(json!({"userId": "u-1"}));
        let out = translate(&catalog, &resolution).unwrap();
        assert_eq!(
            out.statement,
            "WITH apoc.cypher.runFirstColumn(\"MATCH (m:Movie) RETURN m LIMIT $limit\", \
             {limit: $limit, cypherParams: $cypherParams}, true) AS x UNWIND x AS `movie` \
             RETURN `movie` { .title } AS `movie`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"limit": 5, "cypherParams": {"userId": "u-1"},
                   "first": -1, "offset": 0})
        );
    }

    #[test]
    fn test_variable_arguments_resolve_against_operation_variables() {
        let catalog = catalog();
        let field = Selection::new("Movie")
            .with_args(vec![(
                "filter".to_string(),
                graphcypher::translate::ArgValue::Variable("f".to_string()),
            )])
            .with_selections(vec![Selection::new("title")]);
        let variables = json!({"f": {"year_gt": 1990}})
            .as_object()
            .cloned()
            .unwrap();
        let resolution = ResolutionContext::query(field, "Movie").with_variables(variables);
        let out = translate(&catalog, &resolution).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`movie`:`Movie`) WHERE (`movie`.year > $filter.year_gt) \
             RETURN `movie` { .title } AS `movie`"
        );
        assert_eq!(
            out.parameters.get("filter"),
            Some(&json!({"year_gt": 1990}))
        );
    }
}
