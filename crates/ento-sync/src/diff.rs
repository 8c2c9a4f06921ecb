//! The schema differ (C8, §4.4 step 2): compares a target [`LiveSchema`]
//! (projected from the `Registry`) against a live one (introspected from the
//! database) and produces the ordered list of changes that would reconcile
//! them. Pairwise-matches tables/constraints/indexes/triggers by name, the
//! same matching strategy as the teacher's `schema/spec.rs::diff`.

use crate::reflect::{
    LiveCheck, LiveColumn, LiveCompositeType, LiveForeignKey, LiveIndex, LiveSchema, LiveTable, LiveTrigger, LiveUnique,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOp {
    CreateEntity(LiveTable),
    DropEntity(LiveTable),
    CreateSequence(String),
    DropSequence(String),
    CreateCompositeType(LiveCompositeType),
    DropCompositeType(LiveCompositeType),
    AddField { table: String, column: LiveColumn },
    DropField { table: String, column: String },
    AlterField { table: String, before: LiveColumn, after: LiveColumn },
    AddConstraint(ConstraintOp),
    DropConstraint(ConstraintOp),
    AddIndex(LiveIndex),
    DropIndex(LiveIndex),
    AddTrigger(LiveTrigger),
    DropTrigger(LiveTrigger),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintOp {
    ForeignKey(LiveForeignKey),
    Unique(LiveUnique),
    Check(LiveCheck),
}

/// Full diff between `target` (what the registry wants) and `live` (what the
/// database currently has). Order within the returned `Vec` is diff order,
/// not execution order — [`crate::plan`] re-sequences it for safe execution.
pub fn diff(target: &LiveSchema, live: &LiveSchema) -> Vec<ChangeOp> {
    let mut ops = Vec::new();

    for table in &target.tables {
        match live.tables.iter().find(|t| t.name == table.name) {
            None => ops.push(ChangeOp::CreateEntity(table.clone())),
            Some(live_table) => ops.extend(diff_columns(table, live_table)),
        }
    }
    for live_table in &live.tables {
        if !target.tables.iter().any(|t| t.name == live_table.name) {
            ops.push(ChangeOp::DropEntity(live_table.clone()));
        }
    }

    for seq in &target.sequences {
        if !live.sequences.contains(seq) {
            ops.push(ChangeOp::CreateSequence(seq.clone()));
        }
    }
    for seq in &live.sequences {
        if !target.sequences.contains(seq) {
            ops.push(ChangeOp::DropSequence(seq.clone()));
        }
    }

    diff_composite_types(target, live, &mut ops);
    diff_foreign_keys(target, live, &mut ops);
    diff_uniques(target, live, &mut ops);
    diff_checks(target, live, &mut ops);
    diff_indexes(target, live, &mut ops);
    diff_triggers(target, live, &mut ops);

    ops
}

fn diff_columns(target: &LiveTable, live: &LiveTable) -> Vec<ChangeOp> {
    let mut ops = Vec::new();
    for column in &target.columns {
        match live.columns.iter().find(|c| c.name == column.name) {
            None => ops.push(ChangeOp::AddField {
                table: target.name.clone(),
                column: column.clone(),
            }),
            Some(live_column) if columns_differ(column, live_column) => ops.push(ChangeOp::AlterField {
                table: target.name.clone(),
                before: live_column.clone(),
                after: column.clone(),
            }),
            Some(_) => {}
        }
    }
    for live_column in &live.columns {
        if !target.columns.iter().any(|c| c.name == live_column.name) {
            ops.push(ChangeOp::DropField {
                table: target.name.clone(),
                column: live_column.name.clone(),
            });
        }
    }
    ops
}

/// Types and nullability are compared loosely (case-insensitive, since
/// Postgres's `information_schema.data_type` spells things differently than
/// the compiler's own type names) — defaults are intentionally excluded from
/// this comparison, since a `Callable` default never appears server-side and
/// comparing rendered-literal text against Postgres's canonicalized default
/// expression would false-positive on nearly every run.
fn columns_differ(target: &LiveColumn, live: &LiveColumn) -> bool {
    !target.sql_type.eq_ignore_ascii_case(&live.sql_type) || target.nullable != live.nullable
}

/// Composite types are never `ALTER TYPE`d in place (§9 Open Questions):
/// any shape change is a drop-then-create of the whole type.
fn diff_composite_types(target: &LiveSchema, live: &LiveSchema, ops: &mut Vec<ChangeOp>) {
    for composite in &target.composite_types {
        match live.composite_types.iter().find(|l| l.name == composite.name) {
            None => ops.push(ChangeOp::CreateCompositeType(composite.clone())),
            Some(live_composite) if live_composite.columns != composite.columns => {
                ops.push(ChangeOp::DropCompositeType(live_composite.clone()));
                ops.push(ChangeOp::CreateCompositeType(composite.clone()));
            }
            Some(_) => {}
        }
    }
    for composite in &live.composite_types {
        if !target.composite_types.iter().any(|t| t.name == composite.name) {
            ops.push(ChangeOp::DropCompositeType(composite.clone()));
        }
    }
}

fn diff_foreign_keys(target: &LiveSchema, live: &LiveSchema, ops: &mut Vec<ChangeOp>) {
    for fk in &target.foreign_keys {
        if !live.foreign_keys.iter().any(|l| l.name == fk.name) {
            ops.push(ChangeOp::AddConstraint(ConstraintOp::ForeignKey(fk.clone())));
        }
    }
    for fk in &live.foreign_keys {
        if !target.foreign_keys.iter().any(|t| t.name == fk.name) {
            ops.push(ChangeOp::DropConstraint(ConstraintOp::ForeignKey(fk.clone())));
        }
    }
}

fn diff_uniques(target: &LiveSchema, live: &LiveSchema, ops: &mut Vec<ChangeOp>) {
    for unique in &target.uniques {
        if !live.uniques.iter().any(|l| l.name == unique.name) {
            ops.push(ChangeOp::AddConstraint(ConstraintOp::Unique(unique.clone())));
        }
    }
    for unique in &live.uniques {
        if !target.uniques.iter().any(|t| t.name == unique.name) {
            ops.push(ChangeOp::DropConstraint(ConstraintOp::Unique(unique.clone())));
        }
    }
}

/// A check is re-created whenever its recorded comment hash changes (§6),
/// not just when it's missing outright — the hash, not the rendered SQL
/// text, is the source of truth for "did this check's expression change".
fn diff_checks(target: &LiveSchema, live: &LiveSchema, ops: &mut Vec<ChangeOp>) {
    for check in &target.checks {
        match live.checks.iter().find(|l| l.name == check.name) {
            None => ops.push(ChangeOp::AddConstraint(ConstraintOp::Check(check.clone()))),
            Some(live_check) if live_check.comment != check.comment => {
                ops.push(ChangeOp::DropConstraint(ConstraintOp::Check(live_check.clone())));
                ops.push(ChangeOp::AddConstraint(ConstraintOp::Check(check.clone())));
            }
            Some(_) => {}
        }
    }
    for check in &live.checks {
        if !target.checks.iter().any(|t| t.name == check.name) {
            ops.push(ChangeOp::DropConstraint(ConstraintOp::Check(check.clone())));
        }
    }
}

fn diff_indexes(target: &LiveSchema, live: &LiveSchema, ops: &mut Vec<ChangeOp>) {
    for index in &target.indexes {
        match live.indexes.iter().find(|l| l.name == index.name) {
            None => ops.push(ChangeOp::AddIndex(index.clone())),
            Some(live_index) if live_index.columns != index.columns || live_index.unique != index.unique => {
                ops.push(ChangeOp::DropIndex(live_index.clone()));
                ops.push(ChangeOp::AddIndex(index.clone()));
            }
            Some(_) => {}
        }
    }
    for index in &live.indexes {
        if !target.indexes.iter().any(|t| t.name == index.name) {
            ops.push(ChangeOp::DropIndex(index.clone()));
        }
    }
}

/// A trigger's function name already encodes its `when`/`body` hash (§6), so
/// a name mismatch alone is enough to detect an edited trigger body without
/// re-parsing `pg_get_triggerdef`.
fn diff_triggers(target: &LiveSchema, live: &LiveSchema, ops: &mut Vec<ChangeOp>) {
    for trigger in &target.triggers {
        match live.triggers.iter().find(|l| l.name == trigger.name) {
            None => ops.push(ChangeOp::AddTrigger(trigger.clone())),
            Some(live_trigger) if live_trigger.function_name != trigger.function_name => {
                ops.push(ChangeOp::DropTrigger(live_trigger.clone()));
                ops.push(ChangeOp::AddTrigger(trigger.clone()));
            }
            Some(_) => {}
        }
    }
    for trigger in &live.triggers {
        if !target.triggers.iter().any(|t| t.name == trigger.name) {
            ops.push(ChangeOp::DropTrigger(trigger.clone()));
        }
    }
}
