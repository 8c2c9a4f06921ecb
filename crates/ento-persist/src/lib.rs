//! The save/load planner (C10, §10): turns a nested instance tree into a
//! dependency-ordered write plan, executes it against a [`Connection`],
//! and hydrates query results back into instances. [`Session`] is the
//! facade most callers use directly; [`save_operations`]/[`execute_plan`]
//! are exposed separately for callers that want to inspect or replay a
//! plan without going through it.

mod execute;
mod load;
mod node;
mod plan;
mod session;

pub use execute::execute_plan;
pub use load::{hydrate_instance, hydrate_node};
pub use node::{InstanceNode, RelationInstances};
pub use plan::{save_operations, ColumnValue, PersistOp, SavePlan};
pub use session::Session;

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use ento_core::{Connection, EntityResult, FieldImpl, IntBits, Row, Transaction, Value};
    use ento_model::{EntityBuilder, Extension, Field, JoinSpec, Loading, Registry, Relation, RelationKind};

    /// Replays one canned `RETURNING` row per `Insert`/`Update`/`Delete` step,
    /// in call order, and records the SQL + params it was asked to run —
    /// enough to exercise `execute_plan`'s `GeneratedBy` threading without a
    /// real database.
    #[derive(Default)]
    struct MockConnection {
        returning: Mutex<Vec<Vec<Value>>>,
        calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    #[async_trait::async_trait]
    impl Connection for MockConnection {
        async fn execute(&self, sql: &str, params: &[Value]) -> EntityResult<u64> {
            self.calls.lock().unwrap().push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        async fn fetch(&self, sql: &str, params: &[Value]) -> EntityResult<Vec<Row>> {
            self.calls.lock().unwrap().push((sql.to_string(), params.to_vec()));
            let row = self.returning.lock().unwrap().remove(0);
            Ok(vec![Row::new(vec![("id".to_string(), row[0].clone())])])
        }

        async fn transaction<'a>(&'a self) -> EntityResult<Box<dyn Transaction + 'a>> {
            unimplemented!("not exercised by these tests")
        }
    }

    fn registry_with_author_book() -> (Registry, ento_model::EntityId, ento_model::EntityId) {
        let author = EntityBuilder::new("Author")
            .schema("public")
            .field(Field::new("id", FieldImpl::Serial(IntBits::B32)).with_extension(Extension::PrimaryKey))
            .field(Field::new("name", FieldImpl::String).not_null())
            .relation(Relation::new(
                "books",
                RelationKind::Many {
                    remote_entity: "Book".to_string(),
                    join: JoinSpec::RemoteForeignKey("author_id".to_string()),
                    loading: Loading::Lazy,
                },
            ))
            .build();

        let book = EntityBuilder::new("Book")
            .schema("public")
            .field(Field::new("id", FieldImpl::Serial(IntBits::B32)).with_extension(Extension::PrimaryKey))
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

    #[test]
    fn new_one_relation_is_inserted_before_its_owner() {
        let (registry, author_id, book_id) = registry_with_author_book();

        let mut author_node = InstanceNode::new(author_id);
        author_node.instance.state.set("name", Value::Text("Le Guin".to_string()));

        let mut book_node = InstanceNode::new(book_id);
        book_node.instance.state.set("title", Value::Text("The Dispossessed".to_string()));
        let book_node = book_node.attach_one("author", author_node);

        let plan = save_operations(&registry, &book_node);

        assert_eq!(plan.ops.len(), 2);
        match &plan.ops[0] {
            PersistOp::Insert { table, .. } => assert_eq!(table, "Author"),
            other => panic!("expected an Author insert first, got {other:?}"),
        }
        match &plan.ops[1] {
            PersistOp::Insert { table, columns, .. } => {
                assert_eq!(table, "Book");
                assert_eq!(columns.get("author_id"), Some(&ColumnValue::GeneratedBy(0)));
            }
            other => panic!("expected a Book insert second, got {other:?}"),
        }
    }

    #[test]
    fn many_relation_is_inserted_after_its_owner() {
        let (registry, author_id, book_id) = registry_with_author_book();

        let mut author_node = InstanceNode::new(author_id);
        author_node.instance.state.set("name", Value::Text("Le Guin".to_string()));

        let mut book_node = InstanceNode::new(book_id);
        book_node.instance.state.set("title", Value::Text("The Left Hand of Darkness".to_string()));

        let author_node = author_node.attach_many("books", vec![book_node]);

        let plan = save_operations(&registry, &author_node);

        assert_eq!(plan.ops.len(), 2);
        match &plan.ops[0] {
            PersistOp::Insert { table, .. } => assert_eq!(table, "Author"),
            other => panic!("expected an Author insert first, got {other:?}"),
        }
        match &plan.ops[1] {
            PersistOp::Insert { table, .. } => assert_eq!(table, "Book"),
            other => panic!("expected a Book insert second, got {other:?}"),
        }
    }

    #[test]
    fn update_on_a_persisted_instance_with_no_changes_plans_nothing() {
        let (registry, author_id, _book_id) = registry_with_author_book();
        let author = ento_model::Instance::from_loaded(author_id, vec![("name".to_string(), Value::Text("Le Guin".to_string()))]);
        let node = InstanceNode::from_instance(author);

        let plan = save_operations(&registry, &node);
        assert!(plan.ops.is_empty());
    }

    #[tokio::test]
    async fn execute_plan_threads_a_generated_author_id_into_the_book_insert() {
        let (registry, author_id, book_id) = registry_with_author_book();

        let mut author_node = InstanceNode::new(author_id);
        author_node.instance.state.set("name", Value::Text("Le Guin".to_string()));
        let mut book_node = InstanceNode::new(book_id);
        book_node.instance.state.set("title", Value::Text("The Dispossessed".to_string()));
        let book_node = book_node.attach_one("author", author_node);

        let plan = save_operations(&registry, &book_node);
        let conn = MockConnection {
            returning: Mutex::new(vec![vec![Value::Int(7)], vec![Value::Int(3)]]),
            ..Default::default()
        };

        let generated = execute_plan(&conn, &plan).await.unwrap();
        assert_eq!(generated, vec![vec![Value::Int(7)], vec![Value::Int(3)]]);

        let calls = conn.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].0.contains("INSERT INTO \"Author\""));
        assert!(calls[1].0.contains("INSERT INTO \"Book\""));
        assert!(calls[1].1.contains(&Value::Int(7)));
    }
}
