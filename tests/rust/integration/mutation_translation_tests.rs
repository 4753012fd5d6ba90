//! Write-path translation: node writes with nested `@cypher` blocks,
//! relationship mutations declared through `@MutationMeta`, and custom
//! `@cypher` root mutations.

#[cfg(test)]
mod mutation_translation_tests {
    use graphcypher::schema::SchemaCatalog;
    use graphcypher::translate::{translate, ResolutionContext, Selection};
    use serde_json::{json, Value};

    const SCHEMA: &str = r#"
version: 1
types:
  - name: User
    kind: node
    fields:
      - name: idField
        type: { name: ID }
        directives: [{ name: id }]
      - name: name
        type: { name: String }
  - name: Movie
    kind: node
    fields:
      - name: title
        type: { name: String }
      - name: year
        type: { name: Int }
  - name: Genre
    kind: node
    fields:
      - name: name
        type: { name: String }
  - name: MovieCreate
    kind: scalar_payload
    fields:
      - name: id
        type: { name: ID }
      - name: title
        type: { name: String }
  - name: MovieWhere
    kind: scalar_payload
    fields:
      - name: id
        type: { name: ID }
  - name: UserLikedInput
    kind: scalar_payload
    fields:
      - name: create
        type: { name: MovieCreate, list: true }
        directives:
          - name: cypher
            args: { statement: "CREATE (`movie`:`Movie` {id: MovieCreate.id, title: MovieCreate.title})" }
      - name: connect
        type: { name: MovieWhere, list: true }
        directives:
          - name: cypher
            args: { statement: "MATCH (`m`:`Movie` {id: MovieWhere.id}) MERGE (`user`)-[:`LIKED`]->(`m`)" }
  - name: Mutation
    kind: scalar_payload
    fields:
      - name: CreateUser
        type: { name: User }
        args:
          - name: idField
            type: { name: ID }
          - name: liked
            type: { name: UserLikedInput }
      - name: DeleteUser
        type: { name: User }
        args:
          - name: idField
            type: { name: ID }
          - name: liked
            type: { name: UserLikedInput }
      - name: AddMovieGenre
        type: { name: Movie }
        directives:
          - name: MutationMeta
            args: { relationship: IN_GENRE, from: Movie, to: Genre }
      - name: RemoveMovieGenre
        type: { name: Movie }
        directives:
          - name: MutationMeta
            args: { relationship: IN_GENRE, from: Movie, to: Genre }
      - name: UpdateMovieGenre
        type: { name: Movie }
        directives:
          - name: MutationMeta
            args: { relationship: IN_GENRE, from: Movie, to: Genre }
      - name: promoteUser
        type: { name: User }
        directives:
          - name: cypher
            args: { statement: "MATCH (u:User {idField: $id}) SET u.rank = coalesce(u.rank, 0) + 1 RETURN u" }
"#;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::from_yaml(SCHEMA).unwrap()
    }

    /// The committed create-with-nested-block shape: node properties come
    /// from `$params`, the nested `@cypher` runs in a `CALL` subquery that
    /// `UNWIND`s the input list under its declared type name, and the export
    /// alias shields the variable for deeper blocks.
    #[test]
    fn test_create_with_nested_cypher_block() {
        let catalog = catalog();
        let field = Selection::new("CreateUser")
            .with_args(vec![
                ("idField".to_string(), json!("user-1").into()),
                (
                    "liked".to_string(),
                    json!({"create": [{"id": "movie-1", "title": "title-1"}]}).into(),
                ),
            ])
            .with_selections(vec![Selection::new("idField")]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "User")).unwrap();
        assert_eq!(
            out.statement,
            "CREATE (`user`:`User` {idField:$params.idField}) \
             WITH * CALL { WITH * UNWIND $params.liked.create AS MovieCreate \
             CREATE (`movie`:`Movie` {id: MovieCreate.id, title: MovieCreate.title}) \
             WITH *, MovieCreate AS _MovieCreate \
             RETURN COUNT(*) AS _liked_create_ } \
             RETURN `user` { .idField } AS `user`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"params": {
                "idField": "user-1",
                "liked": {"create": [{"id": "movie-1", "title": "title-1"}]}
            }})
        );
    }

    /// Sibling nested blocks are emitted in schema declaration order, not in
    /// the order the argument value happens to list them.
    #[test]
    fn test_nested_blocks_follow_declaration_order() {
        let catalog = catalog();
        let field = Selection::new("CreateUser")
            .with_args(vec![
                ("idField".to_string(), json!("user-1").into()),
                (
                    "liked".to_string(),
                    json!({
                        "connect": [{"id": "movie-2"}],
                        "create": [{"id": "movie-1", "title": "title-1"}]
                    })
                    .into(),
                ),
            ])
            .with_selections(vec![Selection::new("idField")]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "User")).unwrap();
        let create_at = out.statement.find("_liked_create_").unwrap();
        let connect_at = out.statement.find("_liked_connect_").unwrap();
        assert!(create_at < connect_at);
    }

    /// Delete runs nested blocks while the node still exists, keys the MATCH
    /// on the property arguments only, and projects before DETACH DELETE.
    #[test]
    fn test_delete_with_nested_cypher_block() {
        let catalog = catalog();
        let field = Selection::new("DeleteUser")
            .with_args(vec![
                ("idField".to_string(), json!("user-1").into()),
                (
                    "liked".to_string(),
                    json!({"create": [{"id": "movie-1", "title": "title-1"}]}).into(),
                ),
            ])
            .with_selections(vec![Selection::new("idField")]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "User")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`user`:`User` {idField:$idField}) \
             WITH * CALL { WITH * UNWIND $params.liked.create AS MovieCreate \
             CREATE (`movie`:`Movie` {id: MovieCreate.id, title: MovieCreate.title}) \
             WITH *, MovieCreate AS _MovieCreate \
             RETURN COUNT(*) AS _liked_create_ } \
             WITH `user` AS `user_toDelete`, `user` { .idField } AS `user` \
             DETACH DELETE `user_toDelete` RETURN `user`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({
                "idField": "user-1",
                "params": {
                    "idField": "user-1",
                    "liked": {"create": [{"id": "movie-1", "title": "title-1"}]}
                }
            })
        );
    }

    #[test]
    fn test_add_relationship_mutation() {
        let catalog = catalog();
        let field = Selection::new("AddMovieGenre")
            .with_args(vec![
                ("from".to_string(), json!({"title": "Heat"}).into()),
                ("to".to_string(), json!({"name": "Crime"}).into()),
            ])
            .with_selections(vec![
                Selection::new("from").with_selections(vec![Selection::new("title")]),
                Selection::new("to").with_selections(vec![Selection::new("name")]),
                Selection::new("_id"),
            ]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "Movie")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`movie_from`:`Movie` {title:$from.title}) \
             MATCH (`genre_to`:`Genre` {name:$to.name}) \
             CREATE (`movie_from`)-[`in_genre_relation`:`IN_GENRE`]->(`genre_to`) \
             RETURN `in_genre_relation` { from: `movie_from` { .title }, \
             to: `genre_to` { .name }, _id: ID(`in_genre_relation`) } \
             AS `_AddMovieGenrePayload`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"from": {"title": "Heat"}, "to": {"name": "Crime"}})
        );
    }

    /// Remove binds the relationship under a throwaway name, shields the
    /// endpoints across the DELETE, and never projects relationship
    /// properties (the relationship no longer exists).
    #[test]
    fn test_remove_relationship_shields_endpoints() {
        let catalog = catalog();
        let field = Selection::new("RemoveMovieGenre")
            .with_args(vec![
                ("from".to_string(), json!({"title": "Heat"}).into()),
                ("to".to_string(), json!({"name": "Crime"}).into()),
            ])
            .with_selections(vec![
                Selection::new("from").with_selections(vec![Selection::new("title")]),
                Selection::new("to").with_selections(vec![Selection::new("name")]),
            ]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "Movie")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`movie_from`:`Movie` {title:$from.title}) \
             MATCH (`genre_to`:`Genre` {name:$to.name}) \
             OPTIONAL MATCH (`movie_from`)-[`movie_fromgenre_to`:`IN_GENRE`]->(`genre_to`) \
             DELETE `movie_fromgenre_to` \
             WITH COUNT(*) AS scope, `movie_from` AS `_movie_from`, `genre_to` AS `_genre_to` \
             RETURN { from: `_movie_from` { .title }, to: `_genre_to` { .name } } \
             AS `_RemoveMovieGenrePayload`"
        );
    }

    /// A `where` argument replaces the keyed endpoint match with compiled
    /// filter predicates for that end only.
    #[test]
    fn test_where_filter_replaces_keyed_endpoint_match() {
        let catalog = catalog();
        let field = Selection::new("UpdateMovieGenre").with_args(vec![
            (
                "where".to_string(),
                json!({"from": {"title_contains": "Hea"}}).into(),
            ),
            ("to".to_string(), json!({"name": "Crime"}).into()),
            ("data".to_string(), json!({"weight": 5}).into()),
        ]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "Movie")).unwrap();
        assert_eq!(
            out.statement,
            "MATCH (`movie_from`:`Movie`) \
             WHERE (`movie_from`.title CONTAINS $where.from.title_contains) \
             MATCH (`genre_to`:`Genre` {name:$to.name}) \
             MATCH (`movie_from`)-[`in_genre_relation`:`IN_GENRE`]->(`genre_to`) \
             SET `in_genre_relation` += {weight:$data.weight} \
             RETURN `in_genre_relation` { } AS `_UpdateMovieGenrePayload`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"to": {"name": "Crime"},
                   "where": {"from": {"title_contains": "Hea"}},
                   "data": {"weight": 5}})
        );
    }

    #[test]
    fn test_custom_cypher_mutation_unwraps_first_column() {
        let catalog = catalog();
        let field = Selection::new("promoteUser")
            .with_args(vec![("id".to_string(), json!("user-1").into())])
            .with_selections(vec![Selection::new("name")]);
        let out = translate(&catalog, &ResolutionContext::mutation(field, "User")).unwrap();
        assert_eq!(
            out.statement,
            "CALL apoc.cypher.doIt(\
             \"MATCH (u:User {idField: $id}) SET u.rank = coalesce(u.rank, 0) + 1 RETURN u\", \
             {id: $id, cypherParams: $cypherParams}) YIELD value \
             WITH apoc.map.values(value, [keys(value)[0]])[0] AS `user` \
             RETURN `user` { .name } AS `user`"
        );
        assert_eq!(
            Value::from(out.parameters),
            json!({"id": "user-1", "cypherParams": null})
        );
    }
}
