//! The save planner (C10, §10): turns a nested [`InstanceNode`] tree into a
//! dependency-ordered list of [`PersistOp`]s safe to run against a live
//! database — `One` relations inserted before their owner (so the owner's
//! self-held foreign key can reference a just-generated id), `Many`/
//! `ManyAcross` relations inserted after (so the child rows can reference
//! the owner's own just-generated id). Grounded on the teacher's
//! `exo-sql::sql::transaction::TransactionScript`/`TransactionStep` pattern:
//! a step doesn't need its inputs resolved up front, only a reference to
//! which earlier step will produce them (there, a `TransactionStepId`; here,
//! a step index wrapped in [`ColumnValue::GeneratedBy`]).
//!
//! Every relation `ento-model` models carries a single-column join key
//! (`JoinSpec::SelfForeignKey`/`RemoteForeignKey` both name exactly one
//! field), so the planner assumes single-column primary keys when threading
//! a generated id from one step into another's foreign key column —
//! composite-key relation traversal isn't representable by `JoinSpec` in the
//! first place.

use indexmap::IndexMap;

use ento_core::Value;
use ento_model::{Entity, JoinSpec, Registry, RelationKind};

use crate::node::{InstanceNode, RelationInstances};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Literal(Value),
    /// Resolved at execution time from the generated primary key of an
    /// earlier [`PersistOp::Insert`] step in the same plan.
    GeneratedBy(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PersistOp {
    Insert {
        table: String,
        columns: IndexMap<String, ColumnValue>,
        /// Primary key columns this insert must return, so a later step can
        /// resolve a [`ColumnValue::GeneratedBy`] reference to this one.
        returning: Vec<String>,
    },
    Update {
        table: String,
        set: IndexMap<String, Value>,
        key: IndexMap<String, Value>,
    },
    Delete {
        table: String,
        key: IndexMap<String, Value>,
    },
    /// Deletes every row whose `column` equals `key_value` — used for the
    /// `ManyAcross` link table's delete-all-then-reinsert pass (§10 "a
    /// `ManyAcross` save reconciles its link rows by clearing and
    /// re-writing them, rather than diffing individual link rows").
    DeleteWhere {
        table: String,
        column: String,
        key_value: ColumnValue,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SavePlan {
    pub ops: Vec<PersistOp>,
}

impl SavePlan {
    fn push(&mut self, op: PersistOp) -> usize {
        self.ops.push(op);
        self.ops.len() - 1
    }
}

/// How a later step can obtain this node's primary key value once it has
/// run: either a literal already known (the node was loaded from the
/// database and its key doesn't change), or a reference to the insert step
/// that will generate it.
#[derive(Debug, Clone)]
enum PkRef {
    Known(Value),
    Step(usize),
}

fn pk_ref_to_column_value(pk_ref: &PkRef) -> ColumnValue {
    match pk_ref {
        PkRef::Known(v) => ColumnValue::Literal(v.clone()),
        PkRef::Step(i) => ColumnValue::GeneratedBy(*i),
    }
}

fn table_name(entity: &Entity) -> String {
    entity.name.clone()
}

/// Plan every row implied by `node`, including its attached relations, in
/// dependency-safe execution order.
pub fn save_operations(registry: &Registry, node: &InstanceNode) -> SavePlan {
    let mut plan = SavePlan::default();
    plan_node(registry, node, &mut plan, Vec::new());
    plan
}

fn plan_node(
    registry: &Registry,
    node: &InstanceNode,
    plan: &mut SavePlan,
    mut overrides: Vec<(String, ColumnValue)>,
) -> PkRef {
    let entity = registry.by_id(node.entity_id());

    // `One` relations: the owner holds the foreign key, so the relative
    // must be planned (and, if new, inserted) before the owner's own row.
    for (key, rel) in &node.relations {
        if let RelationInstances::One(child) = rel {
            if let Some(relation) = entity.relation_by_key(key) {
                if let RelationKind::One {
                    join: JoinSpec::SelfForeignKey(field_key),
                    ..
                } = &relation.kind
                {
                    let child_ref = plan_node(registry, child, plan, Vec::new());
                    if let Some(field) = entity.field_by_key(field_key) {
                        overrides.push((field.column_name.clone(), pk_ref_to_column_value(&child_ref)));
                    }
                }
            }
        }
    }

    // Polymorph descendants share their primary key with the ancestor row
    // (table-per-type inheritance): for a brand-new instance, the ancestor
    // is inserted first and the generated id threaded into this entity's
    // own primary key column(s).
    if entity.is_polymorph_descendant() && !node.instance.state.is_persisted() {
        if let Some(parent_name) = entity.polymorph_parent_name() {
            if let Some(parent_entity) = registry.get(parent_name) {
                let parent_step = plan_insert(parent_entity, node, plan, &[]);
                for pk_field in entity.primary_key_fields() {
                    overrides.push((pk_field.column_name.clone(), ColumnValue::GeneratedBy(parent_step)));
                }
            }
        }
    }

    let own_ref = if node.instance.state.is_persisted() {
        if node.instance.state.has_changes(entity) {
            plan_update(entity, node, plan, &overrides);
        }
        PkRef::Known(own_pk_value(entity, node))
    } else {
        PkRef::Step(plan_insert(entity, node, plan, &overrides))
    };

    // `Many`/`ManyAcross` relations: the child rows reference this node's
    // own primary key, so they're only planned once this node's own step
    // has been recorded.
    for (key, rel) in &node.relations {
        match rel {
            RelationInstances::Many(children) => {
                if let Some(relation) = entity.relation_by_key(key) {
                    if let RelationKind::Many {
                        join: JoinSpec::RemoteForeignKey(remote_field),
                        ..
                    } = &relation.kind
                    {
                        for child in children {
                            let child_overrides = vec![(remote_field.clone(), pk_ref_to_column_value(&own_ref))];
                            plan_node(registry, child, plan, child_overrides);
                        }
                    }
                }
            }
            RelationInstances::ManyAcross(children) => {
                if let Some(relation) = entity.relation_by_key(key) {
                    if let RelationKind::ManyAcross {
                        link_entity,
                        self_link_join,
                        link_remote_join,
                        ..
                    } = &relation.kind
                    {
                        plan_many_across(registry, link_entity, self_link_join, link_remote_join, &own_ref, children, plan);
                    }
                }
            }
            RelationInstances::One(_) => {}
        }
    }

    own_ref
}

fn own_pk_value(entity: &Entity, node: &InstanceNode) -> Value {
    entity
        .primary_key_fields()
        .first()
        .and_then(|f| node.instance.state.get(&f.key))
        .cloned()
        .unwrap_or(Value::Null)
}

fn plan_insert(entity: &Entity, node: &InstanceNode, plan: &mut SavePlan, overrides: &[(String, ColumnValue)]) -> usize {
    let mut columns = IndexMap::new();
    for field in entity.storable_fields() {
        if let Some((_, value)) = overrides.iter().find(|(col, _)| *col == field.column_name) {
            columns.insert(field.column_name.clone(), value.clone());
            continue;
        }
        if let Some(current) = node.instance.state.get(&field.key) {
            columns.insert(field.column_name.clone(), ColumnValue::Literal(current.clone()));
        }
        // A field with neither an override nor an assigned value is left out
        // of the column list entirely: an `AutoIncrement` field lets the
        // sequence fill it, anything else falls back to its column default
        // or NULL.
    }
    let returning = entity.primary_key_fields().iter().map(|f| f.column_name.clone()).collect();
    plan.push(PersistOp::Insert {
        table: table_name(entity),
        columns,
        returning,
    })
}

fn plan_update(entity: &Entity, node: &InstanceNode, plan: &mut SavePlan, overrides: &[(String, ColumnValue)]) {
    let mut set = IndexMap::new();
    for change in node.instance.state.changes(entity) {
        set.insert(change.key.clone(), change.current.clone());
    }
    for (column, value) in overrides {
        if let ColumnValue::Literal(v) = value {
            set.insert(column.clone(), v.clone());
        }
    }
    if set.is_empty() {
        return;
    }
    let mut key = IndexMap::new();
    for pk_field in entity.primary_key_fields() {
        if let Some(value) = node.instance.state.get(&pk_field.key) {
            key.insert(pk_field.column_name.clone(), value.clone());
        }
    }
    plan.push(PersistOp::Update {
        table: table_name(entity),
        set,
        key,
    });
}

/// A link entity that can't be found in the registry is skipped — its rows
/// are simply left unplanned.
fn plan_many_across(
    registry: &Registry,
    link_entity_name: &str,
    self_link_join: &JoinSpec,
    link_remote_join: &JoinSpec,
    owner_ref: &PkRef,
    children: &[InstanceNode],
    plan: &mut SavePlan,
) {
    let Some(link_entity) = registry.get(link_entity_name) else {
        return;
    };
    let Some(self_column) = join_field_name(self_link_join) else {
        return;
    };
    let Some(remote_column) = join_field_name(link_remote_join) else {
        return;
    };

    // Clear every existing link row for this owner before re-writing them
    // (§10 "delete-all-then-reinsert"): simpler than diffing individual
    // link rows, at the cost of rewriting unchanged links every save.
    plan.ops.push(PersistOp::DeleteWhere {
        table: table_name(link_entity),
        column: self_column.clone(),
        key_value: pk_ref_to_column_value(owner_ref),
    });

    for child in children {
        let remote_ref = plan_node(registry, child, plan, Vec::new());
        let mut columns = IndexMap::new();
        columns.insert(self_column.clone(), pk_ref_to_column_value(owner_ref));
        columns.insert(remote_column.clone(), pk_ref_to_column_value(&remote_ref));
        let returning = link_entity.primary_key_fields().iter().map(|f| f.column_name.clone()).collect();
        plan.ops.push(PersistOp::Insert {
            table: table_name(link_entity),
            columns,
            returning,
        });
    }
}

fn join_field_name(join: &JoinSpec) -> Option<String> {
    match join {
        JoinSpec::SelfForeignKey(field) | JoinSpec::RemoteForeignKey(field) => Some(field.clone()),
        JoinSpec::Explicit(_) => None,
    }
}
