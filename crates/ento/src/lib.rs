//! The entry point most callers depend on directly: re-exports the public
//! API of every `ento-*` crate from one place, so a consumer writes
//! `ento::Registry` / `ento::Query` / `ento::Session` instead of depending
//! on `ento-model`, `ento-query`, and `ento-persist` separately and tracking
//! which crate owns which type.
//!
//! The split crates underneath stay independently buildable and testable —
//! `ento-core` has no idea `ento-persist` exists — this crate is purely the
//! glue a consumer sees.

pub use ento_core::{Connection, EntityError, EntityResult, FieldImpl, FloatBits, IntBits, Row, SizeSpec, Transaction, Value};

pub use ento_expr::{func, walk_expr, BinaryOp, ColumnCollector, ColumnRef, EntityRef, Expr, ExprVisitor, OrderDirection, RawFragment, UnaryOp};

pub use ento_model::{
    CompareHook, CompositeCheck, CompositeForeignKey, CompositeIndex, CompositeUnique, DepNode, Entity, EntityBuilder, EntityId,
    EntityState, Extension, Field, FieldChange, FieldDefault, FixEntry, IndexMethod, Instance, JoinSpec, Loading, MappedArena, Mixin,
    OrderHook, PolymorphRole, RefTarget, Registry, Relation, RelationKind, ReferentialAction, Slab, SlabIndex, TableOwnership, Trigger,
    TriggerEvent, TriggerTiming, ValueHook, VirtualAttribute, VirtualCompareOp,
};

pub use ento_query::{compile_expr, ForUpdateSpec, JoinClause, LoadSpec, LockStrength, LockWait, Query, SqlBuilder};

pub use ento_schema::{
    add_check, add_column, add_foreign_key, add_unique, alter_column_type, auto_fk_indexes, check_comment, check_name,
    compile_constraints, compile_drop_constraints, compile_drop_entity, compile_entity, create_composite_type, create_index,
    create_sequence, create_table, create_trigger, drop_check, drop_column, drop_composite_type, drop_foreign_key, drop_index,
    drop_sequence, drop_table, drop_trigger, drop_unique, foreign_key_list_triggers, foreign_key_name, index_name, md5_hex, qualify,
    render_column_def, render_ddl_expr, set_column_default, set_not_null, trigger_function_name, unique_name, unset_column_default,
    unset_not_null, SchemaStatement,
};

pub use ento_sync::{
    diff, diff_fixtures, needs_entity_render, plan, render_fixture_op, reflect, sync, target_schema, ChangeOp, ConstraintOp,
    FixtureOp, LiveCheck, LiveColumn, LiveCompositeType, LiveForeignKey, LiveIndex, LiveSchema, LiveTable, LiveTrigger, LiveUnique,
};

pub use ento_persist::{execute_plan, hydrate_instance, hydrate_node, save_operations, ColumnValue, InstanceNode, PersistOp, RelationInstances, SavePlan, Session};
