//! `CREATE`/`DROP` for tables, composite types, and owned sequences (§4.4
//! step 3, §6). Foreign keys are never emitted inline in the `CREATE TABLE`
//! body — they always arrive as a later `ALTER TABLE ADD CONSTRAINT`
//! ([`crate::constraint`]) so that two tables referencing each other can be
//! created in either order and the cycle-breaking dependency order (the
//! teacher's `Registry::dependency_list`) never has to special-case FKs.

use ento_model::{Entity, TableOwnership};

use crate::column::render_column_def;
use crate::naming::qualify;
use crate::statement::SchemaStatement;

/// `CREATE SEQUENCE` for one of `entity.owned_sequences`.
pub fn create_sequence(schema: Option<&str>, sequence: &str) -> SchemaStatement {
    SchemaStatement::new(format!("CREATE SEQUENCE {};", qualify(schema, sequence)))
}

pub fn drop_sequence(schema: Option<&str>, sequence: &str) -> SchemaStatement {
    SchemaStatement::new(format!("DROP SEQUENCE {};", qualify(schema, sequence)))
}

/// `CREATE TYPE ... AS (...)` for a `Virtual`-ownership entity backing a
/// `Composite<T>` field (§3 "Composite").
pub fn create_composite_type(entity: &Entity) -> SchemaStatement {
    let qualified = qualify(entity.schema.as_deref(), &entity.name);
    let columns: Vec<String> = entity
        .storable_fields()
        .map(|f| format!("  \"{}\" {}", f.column_name, f.sql_type_name()))
        .collect();
    SchemaStatement::new(format!("CREATE TYPE {qualified} AS (\n{}\n);", columns.join(",\n")))
}

/// Composite types are always dropped and recreated wholesale on change
/// (§9 Open Questions: in-place `ALTER TYPE` is never attempted).
pub fn drop_composite_type(entity: &Entity) -> SchemaStatement {
    SchemaStatement::new(format!(
        "DROP TYPE {};",
        qualify(entity.schema.as_deref(), &entity.name)
    ))
}

/// `CREATE TABLE`, with the primary key rendered as a trailing
/// `PRIMARY KEY(...)` line in field-declaration order (§8: "Composite PK
/// with N fields compiles `PRIMARY KEY("f1", …, "fN")` in declaration
/// order"). Sequence creation and auto-index creation are separate
/// statements the caller (`op.rs`) sequences around this one.
pub fn create_table(entity: &Entity) -> SchemaStatement {
    debug_assert!(matches!(entity.ownership, TableOwnership::Owned));

    let qualified = qualify(entity.schema.as_deref(), &entity.name);
    let mut lines: Vec<String> = entity.storable_fields().map(render_column_def).collect();

    let pk_fields = entity.primary_key_fields();
    if !pk_fields.is_empty() {
        let pk_columns = pk_fields
            .iter()
            .map(|f| format!("\"{}\"", f.column_name))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  PRIMARY KEY({pk_columns})"));
    }

    SchemaStatement::new(format!("CREATE TABLE {qualified} (\n{}\n);", lines.join(",\n")))
}

pub fn drop_table(entity: &Entity) -> SchemaStatement {
    SchemaStatement::new(format!(
        "DROP TABLE {};",
        qualify(entity.schema.as_deref(), &entity.name)
    ))
}
