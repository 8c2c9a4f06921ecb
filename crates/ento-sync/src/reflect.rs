//! Reflection (C8, §4.4 step 1): introspects a live PostgreSQL catalog into
//! a [`LiveSchema`] the differ can compare against the target `Registry`'s
//! own projection into the same shape. Grounded on the teacher's
//! `schema/spec.rs`/`schema/constraint.rs` introspection queries against
//! `information_schema` and `pg_catalog`, but flattened into plain data
//! rather than rebuilding a full `ento_model::Registry` — reflection only
//! needs enough shape to diff against, not a queryable metamodel.

use ento_core::{Connection, EntityResult, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct LiveColumn {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveTable {
    pub schema: String,
    pub name: String,
    pub columns: Vec<LiveColumn>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveForeignKey {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveUnique {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveCheck {
    pub name: String,
    pub table: String,
    /// The `COMMENT ON CONSTRAINT` payload ento-schema attaches to every
    /// check it creates (§6); absent for a check `sync` didn't create
    /// itself (hand-written migrations are left alone).
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveTrigger {
    pub name: String,
    pub table: String,
    pub function_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveCompositeType {
    pub name: String,
    pub columns: Vec<LiveColumn>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveSchema {
    pub tables: Vec<LiveTable>,
    pub composite_types: Vec<LiveCompositeType>,
    pub foreign_keys: Vec<LiveForeignKey>,
    pub uniques: Vec<LiveUnique>,
    pub checks: Vec<LiveCheck>,
    pub indexes: Vec<LiveIndex>,
    pub triggers: Vec<LiveTrigger>,
    pub sequences: Vec<String>,
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Text(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn boolean(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Introspect every table, column, and constraint owned by `schema` (§4.4
/// step 1). Queries mirror the teacher's: `information_schema.tables`/
/// `columns` for shape, `pg_constraint` joined to `pg_class`/`pg_namespace`
/// for PK/FK/UNIQUE/CHECK, `pg_indexes` for indexes, and
/// `information_schema.triggers` for triggers.
pub async fn reflect(conn: &dyn Connection, schema: &str) -> EntityResult<LiveSchema> {
    let mut live = LiveSchema::default();

    let table_rows = conn
        .fetch(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = $1 AND table_type = 'BASE TABLE'",
            &[Value::Text(schema.to_string())],
        )
        .await?;

    for row in &table_rows {
        let table_name = text(row.get("table_name"));
        let mut table = LiveTable {
            schema: schema.to_string(),
            name: table_name.clone(),
            ..Default::default()
        };

        let column_rows = conn
            .fetch(
                "SELECT column_name, data_type, is_nullable, column_default FROM information_schema.columns \
                 WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
                &[Value::Text(schema.to_string()), Value::Text(table_name.clone())],
            )
            .await?;
        for col in &column_rows {
            table.columns.push(LiveColumn {
                name: text(col.get("column_name")),
                sql_type: text(col.get("data_type")),
                nullable: text(col.get("is_nullable")) == "YES",
                default: col.get("column_default").and_then(|v| match v {
                    Value::Null => None,
                    other => Some(other.to_string()),
                }),
            });
        }

        let pk_rows = conn
            .fetch(
                "SELECT a.attname FROM pg_index i \
                 JOIN pg_class c ON c.oid = i.indrelid \
                 JOIN pg_namespace n ON n.oid = c.relnamespace \
                 JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey) \
                 WHERE n.nspname = $1 AND c.relname = $2 AND i.indisprimary \
                 ORDER BY array_position(i.indkey, a.attnum)",
                &[Value::Text(schema.to_string()), Value::Text(table_name.clone())],
            )
            .await?;
        table.primary_key = pk_rows.iter().map(|r| text(r.get("attname"))).collect();

        live.tables.push(table);
    }

    let composite_rows = conn
        .fetch(
            "SELECT t.typname FROM pg_type t \
             JOIN pg_namespace n ON n.oid = t.typnamespace \
             WHERE n.nspname = $1 AND t.typtype = 'c' \
             AND EXISTS (SELECT 1 FROM pg_class c WHERE c.oid = t.typrelid AND c.relkind = 'c')",
            &[Value::Text(schema.to_string())],
        )
        .await?;
    for row in &composite_rows {
        let type_name = text(row.get("typname"));
        let column_rows = conn
            .fetch(
                "SELECT a.attname AS column_name, format_type(a.atttypid, a.atttypmod) AS data_type, NOT a.attnotnull AS is_nullable \
                 FROM pg_attribute a \
                 JOIN pg_type t ON t.typrelid = a.attrelid \
                 JOIN pg_namespace n ON n.oid = t.typnamespace \
                 WHERE n.nspname = $1 AND t.typname = $2 AND a.attnum > 0 AND NOT a.attisdropped \
                 ORDER BY a.attnum",
                &[Value::Text(schema.to_string()), Value::Text(type_name.clone())],
            )
            .await?;
        let columns = column_rows
            .iter()
            .map(|c| LiveColumn {
                name: text(c.get("column_name")),
                sql_type: text(c.get("data_type")),
                nullable: boolean(c.get("is_nullable")),
                default: None,
            })
            .collect();
        live.composite_types.push(LiveCompositeType { name: type_name, columns });
    }

    let constraint_rows = conn
        .fetch(
            "SELECT con.conname, con.contype, cls.relname AS table_name, \
             pg_get_constraintdef(con.oid) AS definition, \
             obj_description(con.oid) AS comment \
             FROM pg_constraint con \
             JOIN pg_class cls ON cls.oid = con.conrelid \
             JOIN pg_namespace nsp ON nsp.oid = cls.relnamespace \
             WHERE nsp.nspname = $1",
            &[Value::Text(schema.to_string())],
        )
        .await?;
    for row in &constraint_rows {
        let name = text(row.get("conname"));
        let table = text(row.get("table_name"));
        let contype = text(row.get("contype"));
        let definition = text(row.get("definition"));
        match contype.as_str() {
            "f" => {
                if let Some(fk) = parse_foreign_key(&name, &table, &definition) {
                    live.foreign_keys.push(fk);
                }
            }
            "u" => {
                if let Some(columns) = parse_column_list(&definition, "UNIQUE") {
                    live.uniques.push(LiveUnique { name, table, columns });
                }
            }
            "c" => live.checks.push(LiveCheck {
                name,
                table,
                comment: match row.get("comment") {
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                },
            }),
            _ => {}
        }
    }

    let index_rows = conn
        .fetch(
            "SELECT i.relname AS index_name, t.relname AS table_name, ix.indisunique AS is_unique, \
             array_agg(a.attname ORDER BY array_position(ix.indkey, a.attnum)) AS columns \
             FROM pg_index ix \
             JOIN pg_class i ON i.oid = ix.indexrelid \
             JOIN pg_class t ON t.oid = ix.indrelid \
             JOIN pg_namespace n ON n.oid = t.relnamespace \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
             WHERE n.nspname = $1 AND NOT ix.indisprimary \
             GROUP BY i.relname, t.relname, ix.indisunique",
            &[Value::Text(schema.to_string())],
        )
        .await?;
    for row in &index_rows {
        live.indexes.push(LiveIndex {
            name: text(row.get("index_name")),
            table: text(row.get("table_name")),
            columns: match row.get("columns") {
                Some(Value::Array(items)) => items.iter().map(|v| v.to_string()).collect(),
                _ => Vec::new(),
            },
            unique: boolean(row.get("is_unique")),
        });
    }

    let trigger_rows = conn
        .fetch(
            "SELECT trigger_name, event_object_table AS table_name, action_statement \
             FROM information_schema.triggers WHERE trigger_schema = $1",
            &[Value::Text(schema.to_string())],
        )
        .await?;
    for row in &trigger_rows {
        live.triggers.push(LiveTrigger {
            name: text(row.get("trigger_name")),
            table: text(row.get("table_name")),
            function_name: parse_function_name(&text(row.get("action_statement"))),
        });
    }

    let sequence_rows = conn
        .fetch(
            "SELECT sequence_name FROM information_schema.sequences WHERE sequence_schema = $1",
            &[Value::Text(schema.to_string())],
        )
        .await?;
    live.sequences = sequence_rows.iter().map(|r| text(r.get("sequence_name"))).collect();

    Ok(live)
}

/// Parses `FOREIGN KEY (a, b) REFERENCES other(c, d)` out of
/// `pg_get_constraintdef`'s output.
fn parse_foreign_key(name: &str, table: &str, definition: &str) -> Option<LiveForeignKey> {
    let after_fk = definition.strip_prefix("FOREIGN KEY (")?;
    let (columns_part, rest) = after_fk.split_once(')')?;
    let rest = rest.trim_start().strip_prefix("REFERENCES ")?;
    let (ref_table, rest) = rest.split_once('(')?;
    let (ref_columns_part, _) = rest.split_once(')')?;

    Some(LiveForeignKey {
        name: name.to_string(),
        table: table.to_string(),
        columns: split_identifier_list(columns_part),
        ref_table: ref_table.trim().trim_matches('"').to_string(),
        ref_columns: split_identifier_list(ref_columns_part),
    })
}

fn parse_column_list(definition: &str, keyword: &str) -> Option<Vec<String>> {
    let after = definition.strip_prefix(keyword)?.trim_start();
    let inner = after.strip_prefix('(')?;
    let (columns_part, _) = inner.split_once(')')?;
    Some(split_identifier_list(columns_part))
}

fn split_identifier_list(s: &str) -> Vec<String> {
    s.split(',').map(|c| c.trim().trim_matches('"').to_string()).collect()
}

/// `EXECUTE FUNCTION "name"()` → `name`.
fn parse_function_name(action_statement: &str) -> String {
    action_statement
        .split("FUNCTION ")
        .nth(1)
        .and_then(|rest| rest.split('(').next())
        .map(|name| name.trim().trim_matches('"').to_string())
        .unwrap_or_default()
}
