//! Cross-cutting guarantees of the translator: determinism, cardinality
//! handling, existential filter symmetry, and reflexive direction mirroring.

#[cfg(test)]
mod translation_property_tests {
    use graphcypher::schema::SchemaCatalog;
    use graphcypher::translate::{translate, ResolutionContext, Selection};
    use serde_json::json;

    const SCHEMA: &str = r#"
version: 1
types:
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
      - name: genre
        type: { name: Genre }
        directives:
          - name: relation
            args: { name: IN_GENRE, direction: OUT }
      - name: actors
        type: { name: Actor, list: true }
        directives:
          - name: relation
            args: { name: ACTED_IN, direction: IN }
  - name: Genre
    kind: node
    fields:
      - name: name
        type: { name: String }
  - name: Actor
    kind: node
    fields:
      - name: name
        type: { name: String }
  - name: User
    kind: node
    fields:
      - name: idField
        type: { name: ID }
        directives: [{ name: id }]
      - name: friends
        type: { name: FriendOf, list: true }
  - name: FriendOf
    kind: relationship_payload
    directives:
      - name: relation
        args: { name: FRIEND_OF, from: User, to: User }
    fields:
      - name: from
        type: { name: User }
      - name: to
        type: { name: User }
      - name: since
        type: { name: Int }
"#;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_yaml(SCHEMA).unwrap()
    }

    #[test]
    fn test_translation_is_deterministic() {
        let _ = env_logger::builder().is_test(true).try_init();
        let catalog = catalog();
        let run = || {
            let field = Selection::new("Movie")
                .with_args(vec![
                    ("filter".to_string(), json!({"title_contains": "He"}).into()),
                    ("first".to_string(), json!(10).into()),
                ])
                .with_selections(vec![
                    Selection::new("title"),
                    Selection::new("actors")
                        .with_args(vec![("filter".to_string(), json!({"name": "K"}).into())])
                        .with_selections(vec![Selection::new("name")]),
                ]);
            translate(&catalog, &ResolutionContext::query(field, "Movie")).unwrap()
        };
        assert_eq!(run(), run());
    }

    /// Singular relation fields collapse with `head(...)`; list fields stay
    /// comprehensions. The wrapper tracks the declared cardinality exactly.
    #[test]
    fn test_cardinality_drives_head_wrapping() {
        let catalog = catalog();
        let field = Selection::new("Movie").with_selections(vec![
            Selection::new("genre").with_selections(vec![Selection::new("name")]),
            Selection::new("actors").with_selections(vec![Selection::new("name")]),
        ]);
        let out = translate(&catalog, &ResolutionContext::query(field, "Movie")).unwrap();
        assert!(out.statement.contains("genre: head([(`movie`)"));
        assert!(out.statement.contains("actors: [(`movie`)"));
        // Exactly one head(): the list field never gains one.
        assert_eq!(out.statement.matches("head(").count(), 1);
    }

    /// `{f: null}` and `{f_not: null}` are the same existential spelled two
    /// ways; both serialize the parameter as `true`, never `null`.
    #[test]
    fn test_null_filter_existential_symmetry() {
        let catalog = catalog();
        for (key, fragment) in [
            ("title", "WHERE (NOT EXISTS(`movie`.title))"),
            ("title_not", "WHERE (EXISTS(`movie`.title))"),
        ] {
            let field = Selection::new("Movie")
                .with_args(vec![("filter".to_string(), json!({ key: null }).into())])
                .with_selections(vec![Selection::new("title")]);
            let out = translate(&catalog, &ResolutionContext::query(field, "Movie")).unwrap();
            assert!(out.statement.contains(fragment), "{}", out.statement);
            assert_eq!(out.parameters.get("filter"), Some(&json!({ key: true })));
        }
    }

    /// On a reflexive relationship type the two directed fields compile to
    /// mirrored patterns: same relationship type, opposite arrows, distinct
    /// path-derived bindings.
    #[test]
    fn test_reflexive_directions_mirror() {
        let catalog = catalog();
        let field = Selection::new("User").with_selections(vec![Selection::new("friends")
            .with_selections(vec![
                Selection::new("from").with_selections(vec![
                    Selection::new("since"),
                    Selection::new("User").with_selections(vec![Selection::new("idField")]),
                ]),
                Selection::new("to").with_selections(vec![
                    Selection::new("since"),
                    Selection::new("User").with_selections(vec![Selection::new("idField")]),
                ]),
            ])]);
        let out = translate(&catalog, &ResolutionContext::query(field, "User")).unwrap();
        assert!(out
            .statement
            .contains("(`user`)<-[`user_friends_from_relation`:`FRIEND_OF`]-(`user_friends_from`:`User`)"));
        assert!(out
            .statement
            .contains("(`user`)-[`user_friends_to_relation`:`FRIEND_OF`]->(`user_friends_to`:`User`)"));
    }

    /// Re-translating is idempotent; nothing in the pair depends on ambient
    /// state left behind by an earlier translation.
    #[test]
    fn test_no_state_leaks_between_translations() {
        let catalog = catalog();
        let filtered = Selection::new("Movie")
            .with_selections(vec![Selection::new("actors")
                .with_args(vec![("filter".to_string(), json!({"name": "K"}).into())])
                .with_selections(vec![Selection::new("name")])]);
        let plain = Selection::new("Movie").with_selections(vec![Selection::new("title")]);

        let first = translate(&catalog, &ResolutionContext::query(filtered, "Movie")).unwrap();
        let second = translate(&catalog, &ResolutionContext::query(plain, "Movie")).unwrap();
        assert!(first.parameters.contains("1_filter"));
        assert!(!second.parameters.contains("1_filter"));
    }
}
