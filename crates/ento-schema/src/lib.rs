//! The DDL compiler (C7, §4.4 step 3, §6): turns a bound [`ento_model::Entity`]
//! into the `CREATE`/`DROP`/`ALTER` statements that give it a PostgreSQL
//! shape. Deliberately produces text, not a connection round-trip — `sync`
//! (`ento_sync`) decides which statements to actually run and in what order
//! across a whole registry; this crate only knows how to render one entity's
//! piece of that script.

mod column;
mod constraint;
mod expr_ddl;
mod naming;
mod op;
mod statement;
mod table;
mod trigger;

pub use expr_ddl::render_ddl_expr;
pub use column::{
    add_column, alter_column_type, drop_column, render_column_def, set_column_default, set_not_null, unset_column_default,
    unset_not_null,
};
pub use constraint::{add_check, add_foreign_key, add_unique, auto_fk_indexes, create_index, drop_check, drop_foreign_key, drop_index, drop_unique};
pub use naming::{check_comment, check_name, foreign_key_name, index_name, md5_hex, qualify, trigger_function_name, unique_name};
pub use op::{compile_constraints, compile_drop_constraints, compile_drop_entity, compile_entity};
pub use statement::SchemaStatement;
pub use table::{create_composite_type, create_sequence, create_table, drop_composite_type, drop_sequence, drop_table};
pub use trigger::{create_trigger, drop_trigger, foreign_key_list_triggers};

#[cfg(test)]
mod tests {
    use super::*;
    use ento_core::{FieldImpl, IntBits};
    use ento_model::{Entity, EntityBuilder, Extension, Field, ReferentialAction, Registry, RefTarget};

    fn order_entity() -> Entity {
        EntityBuilder::new("Order")
            .schema("shop")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32))
                    .with_extension(Extension::PrimaryKey)
                    .with_extension(Extension::AutoIncrement { sequence: None }),
            )
            .field(Field::new("customer_name", FieldImpl::String).not_null())
            .build()
    }

    fn order_line_entity() -> Entity {
        EntityBuilder::new("OrderLine")
            .schema("shop")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32))
                    .with_extension(Extension::PrimaryKey)
                    .with_extension(Extension::AutoIncrement { sequence: None }),
            )
            .field(
                Field::new("order_id", FieldImpl::Int(IntBits::B32)).with_extension(Extension::ForeignKey {
                    reference: RefTarget::new("Order", "id"),
                    on_update: ReferentialAction::Restrict,
                    on_delete: ReferentialAction::Cascade,
                    group: None,
                    name: None,
                }),
            )
            .build()
    }

    #[test]
    fn create_table_lists_columns_and_trailing_primary_key() {
        let entity = order_entity();
        let statement = create_table(&entity);
        assert!(statement.statement.starts_with("CREATE TABLE \"shop\".\"Order\" (\n"));
        assert!(statement.statement.contains("\"id\" INT4 NOT NULL"));
        assert!(statement.statement.contains("PRIMARY KEY(\"id\")"));
    }

    #[test]
    fn foreign_key_name_matches_self_table_dunder_ref_table_convention() {
        let name = foreign_key_name("OrderLine", &["order_id".to_string()], "Order", &["id".to_string()]);
        assert_eq!(name, "fk_OrderLine__order_id-Order__id");
    }

    #[test]
    fn compile_entity_emits_owned_sequence_before_table() {
        let mut registry = Registry::new();
        let id = registry.add_entity(order_entity());
        let entity = registry.by_id(id);
        let statements = compile_entity(entity, &registry, id);
        assert!(statements[0].statement.starts_with("CREATE SEQUENCE"));
        assert!(statements[1].statement.starts_with("CREATE TABLE"));
    }

    #[test]
    fn compile_entity_auto_indexes_foreign_key_column() {
        let mut registry = Registry::new();
        registry.add_entity(order_entity());
        let id = registry.add_entity(order_line_entity());
        let entity = registry.by_id(id);
        let statements = compile_entity(entity, &registry, id);
        assert!(statements
            .iter()
            .any(|s| s.statement == "CREATE INDEX \"idx_OrderLine__order_id\" ON \"shop\".\"OrderLine\" (\"order_id\");"));
    }

    #[test]
    fn compile_constraints_adds_foreign_key_referencing_parent_table() {
        let mut registry = Registry::new();
        registry.add_entity(order_entity());
        let id = registry.add_entity(order_line_entity());
        let entity = registry.by_id(id);
        let statements = compile_constraints(entity, &registry);
        assert_eq!(statements.len(), 1);
        assert!(statements[0]
            .statement
            .contains("FOREIGN KEY (\"order_id\") REFERENCES \"shop\".\"Order\" (\"id\")"));
    }
}
