//! Renders a single column definition line for `CREATE TABLE` (§4.4, §6).

use ento_model::{Extension, Field, FieldDefault};

use crate::expr_ddl::{render_ddl_expr, render_ddl_literal};
use crate::naming::qualify;
use crate::statement::SchemaStatement;

/// `"column" TYPE [NOT NULL] [DEFAULT ...]`, without a trailing comma — the
/// caller joins column lines together.
pub fn render_column_def(field: &Field) -> String {
    let mut line = format!("  \"{}\" {}", field.column_name, field.sql_type_name());

    if !field.nullable {
        line.push_str(" NOT NULL");
    }

    if let Some(default) = column_default(field) {
        line.push_str(" DEFAULT ");
        line.push_str(&default);
    }

    line
}

/// The `DEFAULT` clause body, if any. An `AutoIncrement` extension wins over
/// a declared [`FieldDefault`] — a serial column's default is always its
/// owned sequence's `nextval`, never a user literal (§3 "AutoIncrement").
fn column_default(field: &Field) -> Option<String> {
    if let Some(Extension::AutoIncrement { sequence: Some(seq) }) = field
        .extensions
        .iter()
        .find(|e| matches!(e, Extension::AutoIncrement { .. }))
    {
        return Some(format!("nextval('{seq}'::regclass)"));
    }

    match &field.default {
        Some(FieldDefault::Literal(value)) => Some(render_ddl_literal(value)),
        Some(FieldDefault::Server(expr)) => Some(render_ddl_expr(expr)),
        // A `Callable` default is computed application-side at insert time
        // (C10), never reaches DDL.
        Some(FieldDefault::Callable(_)) | None => None,
    }
}

/// Incremental `ALTER TABLE` variants for an existing table (§4.4 step 3's
/// column-level diff ops: `AddField`/`DropField`/`AlterField`).
pub fn add_column(schema: Option<&str>, table: &str, field: &Field) -> SchemaStatement {
    SchemaStatement::new(format!(
        "ALTER TABLE {} ADD COLUMN {};",
        qualify(schema, table),
        render_column_def(field).trim_start()
    ))
}

pub fn drop_column(schema: Option<&str>, table: &str, column: &str) -> SchemaStatement {
    SchemaStatement::new(format!("ALTER TABLE {} DROP COLUMN \"{column}\";", qualify(schema, table)))
}

pub fn alter_column_type(schema: Option<&str>, table: &str, field: &Field) -> SchemaStatement {
    SchemaStatement::new(format!(
        "ALTER TABLE {} ALTER COLUMN \"{}\" TYPE {} USING \"{}\"::{};",
        qualify(schema, table),
        field.column_name,
        field.sql_type_name(),
        field.column_name,
        field.sql_type_name(),
    ))
}

pub fn set_not_null(schema: Option<&str>, table: &str, column: &str) -> SchemaStatement {
    SchemaStatement::new(format!(
        "ALTER TABLE {} ALTER COLUMN \"{column}\" SET NOT NULL;",
        qualify(schema, table)
    ))
}

pub fn unset_not_null(schema: Option<&str>, table: &str, column: &str) -> SchemaStatement {
    SchemaStatement::new(format!(
        "ALTER TABLE {} ALTER COLUMN \"{column}\" DROP NOT NULL;",
        qualify(schema, table)
    ))
}

pub fn set_column_default(schema: Option<&str>, table: &str, field: &Field) -> Option<SchemaStatement> {
    let default = column_default(field)?;
    Some(SchemaStatement::new(format!(
        "ALTER TABLE {} ALTER COLUMN \"{}\" SET DEFAULT {default};",
        qualify(schema, table),
        field.column_name,
    )))
}

pub fn unset_column_default(schema: Option<&str>, table: &str, column: &str) -> SchemaStatement {
    SchemaStatement::new(format!(
        "ALTER TABLE {} ALTER COLUMN \"{column}\" DROP DEFAULT;",
        qualify(schema, table)
    ))
}
