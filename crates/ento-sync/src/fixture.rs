//! Fixture diffing (§4.4 item 4, scenario 5): reconciles an entity's
//! `__fix_entries__` seed rows against whatever the table currently holds,
//! matched by primary key so re-running sync against an unchanged fixture
//! list is a no-op (§8 idempotence).

use ento_core::{Connection, EntityResult, Value};
use ento_model::{Entity, FixEntry};

#[derive(Debug, Clone, PartialEq)]
pub enum FixtureOp {
    Insert(FixEntry),
    Update { key: Vec<Value>, entry: FixEntry },
    Delete { key: Vec<Value> },
}

fn key_of(entity: &Entity, values: &FixEntry) -> Vec<Value> {
    entity
        .primary_key_fields()
        .iter()
        .map(|f| values.values.get(&f.column_name).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Reads every row of `entity`'s table back as `FixEntry`s, for comparison
/// against `entity.fix_entries`.
async fn live_rows(conn: &dyn Connection, entity: &Entity) -> EntityResult<Vec<FixEntry>> {
    let table = match &entity.schema {
        Some(schema) => format!("\"{schema}\".\"{}\"", entity.name),
        None => format!("\"{}\"", entity.name),
    };
    let rows = conn.fetch(&format!("SELECT * FROM {table}"), &[]).await?;
    Ok(rows
        .into_iter()
        .map(|row| FixEntry::new(row.into_values()))
        .collect())
}

/// Diffs `entity.fix_entries` against the table's live contents, by primary
/// key. A live row whose key matches no fixture entry is deleted; a fixture
/// entry whose key matches no live row is inserted; a fixture entry whose
/// key matches but whose non-key values differ is updated.
pub async fn diff_fixtures(conn: &dyn Connection, entity: &Entity) -> EntityResult<Vec<FixtureOp>> {
    let live = live_rows(conn, entity).await?;
    let mut ops = Vec::new();

    for target_entry in &entity.fix_entries {
        let key = key_of(entity, target_entry);
        match live.iter().find(|row| key_of(entity, row) == key) {
            None => ops.push(FixtureOp::Insert(target_entry.clone())),
            Some(live_entry) if live_entry.values != target_entry.values => ops.push(FixtureOp::Update {
                key,
                entry: target_entry.clone(),
            }),
            Some(_) => {}
        }
    }

    for live_entry in &live {
        let key = key_of(entity, live_entry);
        if !entity.fix_entries.iter().any(|target| key_of(entity, target) == key) {
            ops.push(FixtureOp::Delete { key });
        }
    }

    Ok(ops)
}

/// Renders one [`FixtureOp`] as a parameterized statement against `entity`'s
/// table — `INSERT ... ON CONFLICT DO NOTHING`, a keyed `UPDATE`, or a keyed
/// `DELETE`.
pub fn render_fixture_op(entity: &Entity, op: &FixtureOp) -> (String, Vec<Value>) {
    let table = match &entity.schema {
        Some(schema) => format!("\"{schema}\".\"{}\"", entity.name),
        None => format!("\"{}\"", entity.name),
    };
    let pk_columns: Vec<String> = entity.primary_key_fields().iter().map(|f| f.column_name.clone()).collect();

    match op {
        FixtureOp::Insert(entry) => {
            let columns: Vec<&String> = entry.values.keys().collect();
            let mut params = Vec::new();
            let placeholders: Vec<String> = columns
                .iter()
                .map(|col| {
                    params.push(entry.values.get(col.as_str()).cloned().unwrap_or(Value::Null));
                    format!("${}", params.len())
                })
                .collect();
            let column_list = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
            let sql = format!(
                "INSERT INTO {table} ({column_list}) VALUES ({}) ON CONFLICT DO NOTHING;",
                placeholders.join(", ")
            );
            (sql, params)
        }
        FixtureOp::Update { key, entry } => {
            let mut params = Vec::new();
            let assignments: Vec<String> = entry
                .values
                .iter()
                .filter(|(col, _)| !pk_columns.contains(col))
                .map(|(col, value)| {
                    params.push(value.clone());
                    format!("\"{col}\" = ${}", params.len())
                })
                .collect();
            let mut where_clauses = Vec::new();
            for (pk_col, value) in pk_columns.iter().zip(key.iter()) {
                params.push(value.clone());
                where_clauses.push(format!("\"{pk_col}\" = ${}", params.len()));
            }
            let sql = format!(
                "UPDATE {table} SET {} WHERE {};",
                assignments.join(", "),
                where_clauses.join(" AND ")
            );
            (sql, params)
        }
        FixtureOp::Delete { key } => {
            let mut params = Vec::new();
            let mut where_clauses = Vec::new();
            for (pk_col, value) in pk_columns.iter().zip(key.iter()) {
                params.push(value.clone());
                where_clauses.push(format!("\"{pk_col}\" = ${}", params.len()));
            }
            let sql = format!("DELETE FROM {table} WHERE {};", where_clauses.join(" AND "));
            (sql, params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ento_core::{EntityResult, FieldImpl, IntBits, Row, Transaction};
    use ento_model::{EntityBuilder, Extension, Field};

    /// Returns a fixed set of rows from `fetch`, regardless of the query —
    /// enough to exercise `diff_fixtures`'s matching logic without a live table.
    struct MockConnection {
        rows: Vec<Row>,
    }

    #[async_trait::async_trait]
    impl Connection for MockConnection {
        async fn execute(&self, _sql: &str, _params: &[Value]) -> EntityResult<u64> {
            unimplemented!("not exercised by these tests")
        }

        async fn fetch(&self, _sql: &str, _params: &[Value]) -> EntityResult<Vec<Row>> {
            Ok(self.rows.clone())
        }

        async fn transaction<'a>(&'a self) -> EntityResult<Box<dyn Transaction + 'a>> {
            unimplemented!("not exercised by these tests")
        }
    }

    fn color_entity(fix_entries: Vec<FixEntry>) -> Entity {
        EntityBuilder::new("Color")
            .schema("public")
            .field(Field::new("id", FieldImpl::Int(IntBits::B32)).with_extension(Extension::PrimaryKey))
            .field(Field::new("name", FieldImpl::String).not_null())
            .fix_entries(fix_entries)
            .build()
    }

    fn entry(id: i32, name: &str) -> FixEntry {
        FixEntry::new(vec![("id".to_string(), Value::Int(id)), ("name".to_string(), Value::Text(name.to_string()))])
    }

    #[tokio::test]
    async fn unchanged_fixture_against_matching_live_rows_diffs_to_nothing() {
        let entity = color_entity(vec![entry(1, "red"), entry(2, "blue")]);
        let conn = MockConnection {
            rows: vec![
                Row::new(vec![("id".to_string(), Value::Int(1)), ("name".to_string(), Value::Text("red".to_string()))]),
                Row::new(vec![("id".to_string(), Value::Int(2)), ("name".to_string(), Value::Text("blue".to_string()))]),
            ],
        };

        let ops = diff_fixtures(&conn, &entity).await.unwrap();
        assert!(ops.is_empty());
    }

    #[tokio::test]
    async fn diff_fixtures_detects_insert_update_and_delete() {
        let entity = color_entity(vec![entry(1, "red"), entry(2, "green")]);
        let conn = MockConnection {
            rows: vec![
                Row::new(vec![("id".to_string(), Value::Int(2)), ("name".to_string(), Value::Text("blue".to_string()))]),
                Row::new(vec![("id".to_string(), Value::Int(3)), ("name".to_string(), Value::Text("yellow".to_string()))]),
            ],
        };

        let mut ops = diff_fixtures(&conn, &entity).await.unwrap();
        ops.sort_by_key(|op| match op {
            FixtureOp::Insert(e) => e.values.get("id").cloned(),
            FixtureOp::Update { key, .. } => key.first().cloned(),
            FixtureOp::Delete { key } => key.first().cloned(),
        }.map(|v| match v {
            Value::Int(i) => i,
            _ => unreachable!(),
        }));

        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], FixtureOp::Insert(entry(1, "red")));
        assert_eq!(ops[1], FixtureOp::Update { key: vec![Value::Int(2)], entry: entry(2, "green") });
        assert_eq!(ops[2], FixtureOp::Delete { key: vec![Value::Int(3)] });
    }

    #[test]
    fn render_fixture_op_insert_uses_on_conflict_do_nothing() {
        let entity = color_entity(Vec::new());
        let (sql, params) = render_fixture_op(&entity, &FixtureOp::Insert(entry(1, "red")));
        assert!(sql.starts_with("INSERT INTO \"public\".\"Color\""));
        assert!(sql.contains("ON CONFLICT DO NOTHING"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn render_fixture_op_update_excludes_the_key_column_from_set() {
        let entity = color_entity(Vec::new());
        let (sql, _params) = render_fixture_op(&entity, &FixtureOp::Update { key: vec![Value::Int(2)], entry: entry(2, "green") });
        assert!(sql.starts_with("UPDATE \"public\".\"Color\" SET"));
        assert!(!sql.contains("\"id\" ="));
        assert!(sql.contains("WHERE \"id\" ="));
    }

    #[test]
    fn render_fixture_op_delete_is_keyed_by_primary_key() {
        let entity = color_entity(Vec::new());
        let (sql, params) = render_fixture_op(&entity, &FixtureOp::Delete { key: vec![Value::Int(3)] });
        assert_eq!(sql, "DELETE FROM \"public\".\"Color\" WHERE \"id\" = $1;");
        assert_eq!(params, vec![Value::Int(3)]);
    }
}
