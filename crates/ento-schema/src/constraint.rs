//! `ALTER TABLE ADD/DROP CONSTRAINT` and `CREATE/DROP INDEX` for the
//! constraints `ento_model::bind` groups fields into (§4.4 step 3, §6).
//!
//! Every foreign key is added as a standalone `ALTER TABLE`, never inlined
//! into `CREATE TABLE` — two mutually-referencing tables can then be created
//! in either order, with their FKs layered on afterwards once both tables
//! exist.

use ento_model::{CompositeCheck, CompositeForeignKey, CompositeIndex, CompositeUnique, Entity, Registry};

use crate::expr_ddl::render_ddl_expr;
use crate::naming::{check_comment, check_name, foreign_key_name, index_name, qualify, unique_name};
use crate::statement::SchemaStatement;

pub fn add_foreign_key(entity: &Entity, fk: &CompositeForeignKey, registry: &Registry) -> SchemaStatement {
    let referenced = registry
        .get(&fk.reference_entity)
        .expect("foreign key reference resolved at bind time");

    let name = fk
        .name
        .clone()
        .unwrap_or_else(|| foreign_key_name(&entity.name, &fk.columns, &referenced.name, &fk.reference_columns));

    let columns = quoted_list(&fk.columns);
    let ref_columns = quoted_list(&fk.reference_columns);
    let ref_table = qualify(referenced.schema.as_deref(), &referenced.name);
    let table = qualify(entity.schema.as_deref(), &entity.name);

    SchemaStatement::new(format!(
        "ALTER TABLE {table} ADD CONSTRAINT \"{name}\" FOREIGN KEY ({columns}) REFERENCES {ref_table} ({ref_columns}) ON UPDATE {} ON DELETE {};",
        fk.on_update.sql_keyword(),
        fk.on_delete.sql_keyword(),
    ))
}

pub fn drop_foreign_key(entity: &Entity, fk: &CompositeForeignKey, registry: &Registry) -> SchemaStatement {
    let referenced = registry
        .get(&fk.reference_entity)
        .expect("foreign key reference resolved at bind time");
    let name = fk
        .name
        .clone()
        .unwrap_or_else(|| foreign_key_name(&entity.name, &fk.columns, &referenced.name, &fk.reference_columns));
    drop_constraint(entity, &name)
}

pub fn add_unique(entity: &Entity, unique: &CompositeUnique) -> SchemaStatement {
    let name = unique
        .name
        .clone()
        .unwrap_or_else(|| unique_name(&entity.name, &unique.columns));
    let table = qualify(entity.schema.as_deref(), &entity.name);
    let columns = quoted_list(&unique.columns);
    SchemaStatement::new(format!("ALTER TABLE {table} ADD CONSTRAINT \"{name}\" UNIQUE ({columns});"))
}

pub fn drop_unique(entity: &Entity, unique: &CompositeUnique) -> SchemaStatement {
    let name = unique
        .name
        .clone()
        .unwrap_or_else(|| unique_name(&entity.name, &unique.columns));
    drop_constraint(entity, &name)
}

/// A `CHECK` constraint, trailed by a `COMMENT ON CONSTRAINT` recording each
/// contributing field's expression hash (§6) so `sync`'s diff can tell an
/// edited check from an unchanged one without re-parsing the rendered SQL
/// back out of `pg_get_constraintdef`.
pub fn add_check(entity: &Entity, check: &CompositeCheck) -> SchemaStatement {
    let name = check
        .name
        .clone()
        .unwrap_or_else(|| check_name(&entity.name, &check.columns));
    let table = qualify(entity.schema.as_deref(), &entity.name);
    let rendered: Vec<String> = check.exprs.iter().map(render_ddl_expr).collect();
    let body = rendered.join(" AND ");

    let pairs: Vec<(&str, &str)> = check
        .columns
        .iter()
        .map(String::as_str)
        .zip(rendered.iter().map(String::as_str))
        .collect();
    let comment = check_comment(&pairs);

    let mut statement = SchemaStatement::new(format!("ALTER TABLE {table} ADD CONSTRAINT \"{name}\" CHECK ({body});"));
    statement
        .post_statements
        .push(format!("COMMENT ON CONSTRAINT \"{name}\" ON {table} IS '{comment}';"));
    statement
}

pub fn drop_check(entity: &Entity, check: &CompositeCheck) -> SchemaStatement {
    let name = check
        .name
        .clone()
        .unwrap_or_else(|| check_name(&entity.name, &check.columns));
    drop_constraint(entity, &name)
}

fn drop_constraint(entity: &Entity, name: &str) -> SchemaStatement {
    let table = qualify(entity.schema.as_deref(), &entity.name);
    SchemaStatement::new(format!("ALTER TABLE {table} DROP CONSTRAINT \"{name}\";"))
}

/// One `CREATE INDEX`, for either an explicit `Index` extension or an
/// auto-index on a foreign-key column (§6: "auto index created on every
/// foreign-key column").
pub fn create_index(entity: &Entity, index: &CompositeIndex) -> SchemaStatement {
    let name = index
        .name
        .clone()
        .unwrap_or_else(|| index_name(&entity.name, &index.columns));
    let table = qualify(entity.schema.as_deref(), &entity.name);
    let columns = quoted_list(&index.columns);
    let unique = if index.unique { "UNIQUE " } else { "" };
    let using = index
        .method
        .map(|m| format!(" USING {}", m.sql_keyword()))
        .unwrap_or_default();
    SchemaStatement::new(format!("CREATE {unique}INDEX \"{name}\"{using} ON {table} ({columns});"))
}

pub fn drop_index(entity: &Entity, index: &CompositeIndex) -> SchemaStatement {
    let name = index
        .name
        .clone()
        .unwrap_or_else(|| index_name(&entity.name, &index.columns));
    let schema_prefix = entity.schema.as_deref().map(|s| format!("\"{s}\".")).unwrap_or_default();
    SchemaStatement::new(format!("DROP INDEX {schema_prefix}\"{name}\";"))
}

/// Auto-index every column carrying a foreign key that isn't already covered
/// by an explicit `Index`/`Unique` extension on the same column set (§6).
pub fn auto_fk_indexes(entity: &Entity) -> Vec<CompositeIndex> {
    entity
        .composite_foreign_keys
        .iter()
        .map(|fk| CompositeIndex {
            name: None,
            columns: fk.columns.clone(),
            method: None,
            unique: false,
        })
        .collect()
}

fn quoted_list(columns: &[String]) -> String {
    columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ")
}
