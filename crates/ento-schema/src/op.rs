//! The DDL compiler's entry point (§4.4 step 3, C7): flattens one entity's
//! full `CREATE` or `DROP` script as an ordered list of [`SchemaStatement`]s.
//! `sync` ([`ento_sync`](../ento_sync)) is the only caller that decides
//! *which* of these to run for a given entity; this module only knows how to
//! render each piece once asked.

use ento_model::{Entity, EntityId, Registry, TableOwnership};

use crate::constraint::{add_check, add_foreign_key, add_unique, auto_fk_indexes, create_index, drop_check, drop_foreign_key, drop_index, drop_unique};
use crate::statement::SchemaStatement;
use crate::table::{create_composite_type, create_sequence, create_table, drop_composite_type, drop_sequence, drop_table};
use crate::trigger::{create_trigger, drop_trigger};

/// Every index to create for `entity`: one per foreign-key column plus one
/// per explicit `Index` extension, deduped by column set so a column that is
/// both an FK and explicitly `Index`-extended only gets indexed once (the
/// explicit declaration, which may carry a method/uniqueness, wins).
fn all_indexes(entity: &Entity, registry: &Registry, id: EntityId) -> Vec<ento_model::CompositeIndex> {
    let explicit = registry.indexes_of(id);
    let mut indexes: Vec<ento_model::CompositeIndex> = explicit.to_vec();
    for auto in auto_fk_indexes(entity) {
        if !indexes.iter().any(|i| i.columns == auto.columns) {
            indexes.push(auto);
        }
    }
    indexes
}

/// Every statement needed to bring `entity` into existence, in dependency
/// order: owned sequences, then the table or composite type, then indexes,
/// then triggers. Constraints (FK/unique/check) are deliberately *not*
/// included here — [`compile_constraints`] runs across the whole registry
/// afterwards so that every table exists before any `ALTER TABLE ADD
/// CONSTRAINT FOREIGN KEY` referencing it runs.
pub fn compile_entity(entity: &Entity, registry: &Registry, id: EntityId) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();

    for sequence in &entity.owned_sequences {
        statements.push(create_sequence(entity.schema.as_deref(), sequence));
    }

    match entity.ownership {
        TableOwnership::Owned => statements.push(create_table(entity)),
        TableOwnership::Virtual => statements.push(create_composite_type(entity)),
        TableOwnership::MixinRoot => return statements,
    }

    if matches!(entity.ownership, TableOwnership::Owned) {
        for index in all_indexes(entity, registry, id) {
            statements.push(create_index(entity, &index));
        }
        for trigger in &entity.triggers {
            statements.push(create_trigger(entity, trigger));
        }
    }

    statements
}

/// The inverse of [`compile_entity`], in reverse order: triggers and
/// indexes before the table itself, the table before its owned sequences.
pub fn compile_drop_entity(entity: &Entity, registry: &Registry, id: EntityId) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();

    if matches!(entity.ownership, TableOwnership::Owned) {
        for trigger in &entity.triggers {
            statements.push(drop_trigger(entity, trigger));
        }
        for index in all_indexes(entity, registry, id) {
            statements.push(drop_index(entity, &index));
        }
    }

    match entity.ownership {
        TableOwnership::Owned => statements.push(drop_table(entity)),
        TableOwnership::Virtual => statements.push(drop_composite_type(entity)),
        TableOwnership::MixinRoot => return statements,
    }

    for sequence in &entity.owned_sequences {
        statements.push(drop_sequence(entity.schema.as_deref(), sequence));
    }

    statements
}

/// Foreign keys, unique constraints, and checks for `entity`, run once every
/// table in the registry has already been created (§4.4 step 3).
pub fn compile_constraints(entity: &Entity, registry: &Registry) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();
    for fk in &entity.composite_foreign_keys {
        statements.push(add_foreign_key(entity, fk, registry));
    }
    for unique in &entity.composite_uniques {
        statements.push(add_unique(entity, unique));
    }
    for check in &entity.composite_checks {
        statements.push(add_check(entity, check));
    }
    statements
}

pub fn compile_drop_constraints(entity: &Entity, registry: &Registry) -> Vec<SchemaStatement> {
    let mut statements = Vec::new();
    for check in &entity.composite_checks {
        statements.push(drop_check(entity, check));
    }
    for unique in &entity.composite_uniques {
        statements.push(drop_unique(entity, unique));
    }
    for fk in &entity.composite_foreign_keys {
        statements.push(drop_foreign_key(entity, fk, registry));
    }
    statements
}
