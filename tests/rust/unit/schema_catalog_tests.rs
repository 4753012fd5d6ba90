//! Catalog construction tests: duplicate detection, derived-type
//! precomputation, and the full-text index registry.

#[cfg(test)]
mod schema_catalog_tests {
    use graphcypher::schema::{GraphSchemaError, SchemaCatalog};

    #[test]
    fn test_duplicate_type_rejected() {
        let doc = r#"
types:
  - name: Movie
    kind: node
    fields: []
  - name: Movie
    kind: node
    fields: []
"#;
        let err = SchemaCatalog::from_yaml(doc).unwrap_err();
        assert_eq!(
            err,
            GraphSchemaError::DuplicateType {
                type_name: "Movie".into()
            }
        );
    }

    #[test]
    fn test_interface_derived_types_sorted() {
        let doc = r#"
types:
  - name: Person
    kind: interface
    fields:
      - name: name
        type: { name: String }
  - name: Zookeeper
    kind: node
    implements: [Person]
    fields:
      - name: name
        type: { name: String }
  - name: Actor
    kind: node
    implements: [Person]
    fields:
      - name: name
        type: { name: String }
"#;
        let catalog = SchemaCatalog::from_yaml(doc).unwrap();
        let person = catalog.get("Person").unwrap();
        // Sorted, not declaration-ordered: the list feeds a parameter value
        // and must serialize identically across runs.
        assert_eq!(person.derived_types, vec!["Actor", "Zookeeper"]);
    }

    #[test]
    fn test_union_members_are_derived_types() {
        let doc = r#"
types:
  - name: Movie
    kind: node
    fields: []
  - name: Genre
    kind: node
    fields: []
  - name: SearchResult
    kind: union
    members: [Movie, Genre]
"#;
        let catalog = SchemaCatalog::from_yaml(doc).unwrap();
        let union = catalog.get("SearchResult").unwrap();
        assert_eq!(union.derived_types, vec!["Genre", "Movie"]);
        assert!(catalog.is_node_like("SearchResult"));
    }

    #[test]
    fn test_search_index_defaults_to_type_name() {
        let doc = r#"
types:
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
        directives: [{ name: search }]
"#;
        let catalog = SchemaCatalog::from_yaml(doc).unwrap();
        assert_eq!(catalog.search_index_for("Movie"), Some("MovieSearch"));
    }

    #[test]
    fn test_search_index_explicit_name() {
        let doc = r#"
types:
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
        directives: [{ name: search, args: { index: FullText } }]
"#;
        let catalog = SchemaCatalog::from_yaml(doc).unwrap();
        assert_eq!(catalog.search_index_for("Movie"), Some("FullText"));
    }

    #[test]
    fn test_search_index_shared_across_types_rejected() {
        let doc = r#"
types:
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
        directives: [{ name: search, args: { index: Shared } }]
  - name: Genre
    kind: node
    fields:
      - name: name
        type: { name: String }
        directives: [{ name: search, args: { index: Shared } }]
"#;
        let err = SchemaCatalog::from_yaml(doc).unwrap_err();
        assert!(matches!(err, GraphSchemaError::AmbiguousSearchIndex { .. }));
    }

    #[test]
    fn test_search_on_list_field_rejected() {
        let doc = r#"
types:
  - name: Movie
    kind: node
    fields:
      - name: tags
        type: { name: String, list: true }
        directives: [{ name: search }]
"#;
        let err = SchemaCatalog::from_yaml(doc).unwrap_err();
        assert_eq!(
            err,
            GraphSchemaError::SearchOnListField {
                type_name: "Movie".into(),
                field_name: "tags".into(),
            }
        );
    }

    #[test]
    fn test_require_reports_unknown_type() {
        let catalog = SchemaCatalog::from_yaml("types: []").unwrap();
        let err = catalog.require("Ghost").unwrap_err();
        assert_eq!(
            err,
            GraphSchemaError::UnknownType {
                type_name: "Ghost".into()
            }
        );
    }
}
