//! The query & visitor compiler (§3 C6): an immutable query builder over a
//! [`Registry`](ento_model::Registry), auto-join discovery for dotted
//! attribute paths, nested relation loading, and a PostgreSQL-dialect SQL
//! compiler producing `(sql_text, params)`.

mod compile;
mod load;
mod query;
mod sql_builder;

pub use compile::compile_expr;
pub use load::LoadSpec;
pub use query::{ForUpdateSpec, JoinClause, LockStrength, LockWait, Query};
pub use sql_builder::SqlBuilder;

#[cfg(test)]
mod tests {
    use super::*;
    use ento_core::{FieldImpl, IntBits, Value};
    use ento_expr::Expr;
    use ento_model::{Entity, EntityBuilder, Extension, Field, JoinSpec, Loading, Registry, Relation, RelationKind};

    fn registry_with_author_book() -> (Registry, ento_model::EntityId, ento_model::EntityId) {
        let author = EntityBuilder::new("Author")
            .schema("public")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32)).with_extension(Extension::PrimaryKey),
            )
            .field(Field::new("name", FieldImpl::String).not_null())
            .build();

        let book = EntityBuilder::new("Book")
            .schema("public")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32)).with_extension(Extension::PrimaryKey),
            )
            .field(Field::new("title", FieldImpl::String).not_null())
            .field(Field::new("author_id", FieldImpl::Int(IntBits::B32)))
            .relation(Relation::new(
                "author",
                RelationKind::One {
                    remote_entity: "Author".to_string(),
                    join: JoinSpec::SelfForeignKey("author_id".to_string()),
                    loading: Loading::Lazy,
                },
            ))
            .build();

        let mut registry = Registry::new();
        let author_id = registry.add_entity(author);
        let book_id = registry.add_entity(book);
        (registry, author_id, book_id)
    }

    fn entity_ref(entity: &Entity, alias: &str) -> ento_expr::EntityRef {
        ento_expr::EntityRef::new(entity.schema.clone(), entity.display_name()).with_alias(alias.to_string())
    }

    #[test]
    fn compiles_plain_select_with_predicate() {
        let (registry, _author_id, book_id) = registry_with_author_book();
        let book = registry.by_id(book_id);

        let predicate = Expr::Column(ento_expr::ColumnRef::new(entity_ref(book, "t0"), "title".to_string()))
            .eq(Expr::Const(Value::Text("Dune".to_string())));

        let query = Query::new(book_id).filter(predicate);
        let (sql, params) = query.compile(&registry).unwrap();

        assert_eq!(
            sql,
            r#"SELECT "t0"."id", "t0"."title", "t0"."author_id" FROM "public"."Book" AS "t0" WHERE "t0"."title" = $1"#
        );
        assert_eq!(params, vec![Value::Text("Dune".to_string())]);
    }

    #[test]
    fn resolve_path_auto_joins_relation() {
        let (registry, _author_id, book_id) = registry_with_author_book();
        let mut query = Query::new(book_id);
        let expr = query
            .resolve_path(&["author".to_string(), "name".to_string()], &registry)
            .unwrap();
        let query = query.filter(expr.eq(Expr::Const(Value::Text("Le Guin".to_string()))));

        assert_eq!(query.joins.len(), 1);
        assert_eq!(query.joins[0].alias, "t1");

        let (sql, _) = query.compile(&registry).unwrap();
        assert!(sql.contains(r#"LEFT JOIN "public"."Author" AS "t1" ON "t0"."author_id" = "t1"."id""#));
        assert!(sql.contains(r#""t1"."name" = $1"#));
    }

    #[test]
    fn resolve_path_reuses_join_for_repeated_relation() {
        let (registry, _author_id, book_id) = registry_with_author_book();
        let mut query = Query::new(book_id);
        let _ = query
            .resolve_path(&["author".to_string(), "name".to_string()], &registry)
            .unwrap();
        let _ = query
            .resolve_path(&["author".to_string(), "id".to_string()], &registry)
            .unwrap();
        assert_eq!(query.joins.len(), 1);
    }

    #[test]
    fn load_one_compiles_to_correlated_json_subquery() {
        let (registry, _author_id, book_id) = registry_with_author_book();
        let book = registry.by_id(book_id);
        let relation = book.relation_by_key("author").unwrap();

        let mut query = Query::new(book_id);
        let spec = LoadSpec::for_relation(&mut query, &registry, relation).unwrap();
        let query = query.load(spec);

        let (sql, _) = query.compile(&registry).unwrap();
        assert!(sql.contains("json_build_object("));
        assert!(sql.contains(r#"AS "author""#));
        assert!(sql.contains("LIMIT 1"));
    }
}
