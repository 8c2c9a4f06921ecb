//! Schema synchronization (C8 Reflect + Diff, C9 Sync planner, §4.4):
//! compares what the bound `Registry` wants against what a live PostgreSQL
//! schema has, and produces the ordered DDL script that reconciles them.
//!
//! [`sync`] is the entry point: reflect the live catalog, project the
//! registry into the same shape, diff the two, order the result, and
//! render every change — including the ones [`plan::needs_entity_render`]
//! flags as needing the full bound `Entity` rather than the flattened diff
//! data — into one [`SchemaStatement`] script. [`fixture`] separately
//! reconciles `__fix_entries__` seed rows, keyed by primary key.

mod diff;
mod fixture;
mod plan;
mod reflect;
mod target;

pub use diff::{diff, ChangeOp, ConstraintOp};
pub use fixture::{diff_fixtures, render_fixture_op, FixtureOp};
pub use plan::{needs_entity_render, plan};
pub use reflect::{
    reflect, LiveCheck, LiveColumn, LiveCompositeType, LiveForeignKey, LiveIndex, LiveSchema, LiveTable, LiveTrigger,
    LiveUnique,
};
pub use target::target_schema;

use ento_core::{Connection, EntityResult};
use ento_model::{Registry, TableOwnership};
use ento_schema::SchemaStatement;

/// Reflects `schema` off `conn`, diffs it against `registry`'s target shape,
/// and renders the full ordered statement script — both the structural
/// changes [`plan`] handles directly and the entity-derived ones (check
/// constraints, composite types, triggers) it defers back here.
pub async fn sync(conn: &dyn Connection, registry: &Registry, schema: &str) -> EntityResult<Vec<SchemaStatement>> {
    let live = reflect(conn, schema).await?;
    let target = target_schema(registry);
    let ops = diff(&target, &live);

    let mut statements = plan(schema, &ops);
    statements.extend(render_entity_ops(registry, &ops));

    Ok(statements)
}

/// Renders the [`ChangeOp`]s [`plan`] skipped because they need the bound
/// `Entity`, not the flattened diff data: check constraints (expression
/// text), composite types (full field list), and triggers (function body).
fn render_entity_ops(registry: &Registry, ops: &[ChangeOp]) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();

    for op in ops {
        match op {
            ChangeOp::CreateCompositeType(composite) => {
                if let Some(entity) = registry.get(&composite.name) {
                    if entity.ownership == TableOwnership::Virtual {
                        statements.push(ento_schema::create_composite_type(entity));
                    }
                }
            }
            ChangeOp::DropCompositeType(composite) => {
                if let Some(entity) = registry.get(&composite.name) {
                    statements.push(ento_schema::drop_composite_type(entity));
                }
            }
            ChangeOp::AddConstraint(ConstraintOp::Check(check)) => {
                if let Some((entity, composite)) = find_check(registry, check) {
                    statements.push(ento_schema::add_check(entity, composite));
                }
            }
            ChangeOp::DropConstraint(ConstraintOp::Check(check)) => {
                if let Some((entity, composite)) = find_check(registry, check) {
                    statements.push(ento_schema::drop_check(entity, composite));
                }
            }
            ChangeOp::AddTrigger(trigger) => {
                if let Some((entity, t)) = find_trigger(registry, trigger) {
                    statements.push(ento_schema::create_trigger(entity, t));
                }
            }
            ChangeOp::DropTrigger(trigger) => {
                if let Some((entity, t)) = find_trigger(registry, trigger) {
                    statements.push(ento_schema::drop_trigger(entity, t));
                }
            }
            _ => {}
        }
    }

    statements
}

fn find_check<'a>(
    registry: &'a Registry,
    check: &LiveCheck,
) -> Option<(&'a ento_model::Entity, &'a ento_model::CompositeCheck)> {
    let entity = registry.get(&check.table)?;
    let composite = entity.composite_checks.iter().find(|c| {
        let name = c
            .name
            .clone()
            .unwrap_or_else(|| ento_schema::check_name(&entity.name, &c.columns));
        name == check.name
    })?;
    Some((entity, composite))
}

fn find_trigger<'a>(
    registry: &'a Registry,
    trigger: &LiveTrigger,
) -> Option<(&'a ento_model::Entity, &'a ento_model::Trigger)> {
    let entity = registry.get(&trigger.table)?;
    let t = entity.triggers.iter().find(|t| t.name == trigger.name)?;
    Some((entity, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{LiveColumn, LiveTable};

    #[test]
    fn plan_orders_creates_after_drops() {
        let ops = vec![
            ChangeOp::DropEntity(LiveTable {
                schema: "public".into(),
                name: "old_table".into(),
                columns: Vec::new(),
                primary_key: Vec::new(),
            }),
            ChangeOp::CreateEntity(LiveTable {
                schema: "public".into(),
                name: "new_table".into(),
                columns: vec![LiveColumn {
                    name: "id".into(),
                    sql_type: "integer".into(),
                    nullable: false,
                    default: None,
                }],
                primary_key: vec!["id".into()],
            }),
        ];
        let statements = plan("public", &ops);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].statement.contains("DROP TABLE"));
        assert!(statements[1].statement.contains("CREATE TABLE"));
    }

    #[test]
    fn diff_detects_new_table() {
        let target = LiveSchema {
            tables: vec![LiveTable {
                schema: "public".into(),
                name: "widgets".into(),
                columns: Vec::new(),
                primary_key: Vec::new(),
            }],
            ..Default::default()
        };
        let live = LiveSchema::default();
        let ops = diff(&target, &live);
        assert_eq!(ops, vec![ChangeOp::CreateEntity(target.tables[0].clone())]);
    }
}
