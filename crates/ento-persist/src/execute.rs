//! Executes a [`SavePlan`] against a live [`Connection`] (C10, §10): renders
//! each [`PersistOp`] as parameterized SQL, resolving
//! [`ColumnValue::GeneratedBy`] references against the `RETURNING` rows of
//! whatever earlier step produced them — the same "run steps in order,
//! thread results forward" shape as the teacher's
//! `TransactionScript::execute`/`TransactionContext`.

use tracing::{debug, instrument};

use ento_core::{Connection, EntityError, EntityResult, Value};

use crate::plan::{ColumnValue, PersistOp, SavePlan};

fn quoted(name: &str) -> String {
    format!("\"{name}\"")
}

/// Resolves a `ColumnValue` against the primary keys already generated by
/// earlier steps in this execution.
fn resolve(value: &ColumnValue, generated: &[Vec<Value>]) -> EntityResult<Value> {
    match value {
        ColumnValue::Literal(v) => Ok(v.clone()),
        ColumnValue::GeneratedBy(step) => generated
            .get(*step)
            .and_then(|values| values.first())
            .cloned()
            .ok_or_else(|| EntityError::State(format!("step {step} produced no primary key to reference"))),
    }
}

/// Runs every op in `plan` against `conn`, in order. Returns, per step, the
/// primary key values an `Insert` returned (empty for `Update`/`Delete`/
/// `DeleteWhere`) so a caller threading a `SavePlan` manually can inspect
/// what was generated.
#[instrument(name = "execute_plan", skip_all)]
pub async fn execute_plan(conn: &dyn Connection, plan: &SavePlan) -> EntityResult<Vec<Vec<Value>>> {
    let mut generated: Vec<Vec<Value>> = Vec::with_capacity(plan.ops.len());

    for op in &plan.ops {
        debug!("Executing save step: {op:?}");
        let values = match op {
            PersistOp::Insert { table, columns, returning } => {
                let mut params = Vec::with_capacity(columns.len());
                let mut column_names = Vec::with_capacity(columns.len());
                for (column, value) in columns {
                    column_names.push(quoted(column));
                    params.push(resolve(value, &generated)?);
                }
                let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("${i}")).collect();

                let mut sql = if column_names.is_empty() {
                    format!("INSERT INTO {} DEFAULT VALUES", quoted(table))
                } else {
                    format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        quoted(table),
                        column_names.join(", "),
                        placeholders.join(", ")
                    )
                };
                if !returning.is_empty() {
                    let returning_list = returning.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
                    sql.push_str(&format!(" RETURNING {returning_list}"));
                }

                if returning.is_empty() {
                    conn.execute(&sql, &params).await?;
                    Vec::new()
                } else {
                    let rows = conn.fetch(&sql, &params).await?;
                    let row = rows.first().ok_or(EntityError::MissingRow)?;
                    returning.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Null)).collect()
                }
            }
            PersistOp::Update { table, set, key } => {
                let mut params = Vec::new();
                let assignments: Vec<String> = set
                    .iter()
                    .map(|(column, value)| {
                        params.push(value.clone());
                        format!("{} = ${}", quoted(column), params.len())
                    })
                    .collect();
                let where_clauses: Vec<String> = key
                    .iter()
                    .map(|(column, value)| {
                        params.push(value.clone());
                        format!("{} = ${}", quoted(column), params.len())
                    })
                    .collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE {}",
                    quoted(table),
                    assignments.join(", "),
                    where_clauses.join(" AND ")
                );
                conn.execute(&sql, &params).await?;
                Vec::new()
            }
            PersistOp::Delete { table, key } => {
                let mut params = Vec::new();
                let where_clauses: Vec<String> = key
                    .iter()
                    .map(|(column, value)| {
                        params.push(value.clone());
                        format!("{} = ${}", quoted(column), params.len())
                    })
                    .collect();
                let sql = format!("DELETE FROM {} WHERE {}", quoted(table), where_clauses.join(" AND "));
                conn.execute(&sql, &params).await?;
                Vec::new()
            }
            PersistOp::DeleteWhere { table, column, key_value } => {
                let value = resolve(key_value, &generated)?;
                let sql = format!("DELETE FROM {} WHERE {} = $1", quoted(table), quoted(column));
                conn.execute(&sql, &[value]).await?;
                Vec::new()
            }
        };
        generated.push(values);
    }

    Ok(generated)
}
