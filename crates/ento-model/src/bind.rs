use indexmap::IndexMap;

use crate::entity::{CompositeCheck, CompositeForeignKey, CompositeUnique, Entity};
use crate::extension::Extension;

/// A composite index produced by grouping `Index` extensions sharing a name
/// (§3 "Extensions may be grouped by name").
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeIndex {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub method: Option<crate::extension::IndexMethod>,
    pub unique: bool,
}

/// Extension binding (§4.3 step 2): each extension is attached to its field
/// and notified via a registration side effect. Concretely:
/// - an `AutoIncrement` without an explicit sequence gets an owned sequence
///   named `<entity>_<field>_seq`;
/// - extensions sharing a `name`/`group` across fields of the same entity
///   are merged, in declaration order, into one composite constraint.
///
/// Called once, when an entity is added to a [`Registry`](crate::Registry).
pub fn bind_extensions(entity: &mut Entity) -> Vec<CompositeIndex> {
    bind_sequences(entity);

    let mut fk_groups: IndexMap<String, CompositeForeignKey> = IndexMap::new();
    let mut unique_groups: IndexMap<String, CompositeUnique> = IndexMap::new();
    let mut index_groups: IndexMap<String, CompositeIndex> = IndexMap::new();
    let mut check_groups: IndexMap<String, CompositeCheck> = IndexMap::new();

    for field in &entity.fields {
        for extension in &field.extensions {
            match extension {
                Extension::ForeignKey {
                    reference,
                    on_update,
                    on_delete,
                    group,
                    name,
                } => {
                    let key = group.clone().unwrap_or_else(|| field.key.clone());
                    let entry = fk_groups.entry(key).or_insert_with(|| CompositeForeignKey {
                        name: name.clone(),
                        columns: Vec::new(),
                        reference_entity: reference.entity.clone(),
                        reference_columns: Vec::new(),
                        on_update: *on_update,
                        on_delete: *on_delete,
                    });
                    entry.columns.push(field.column_name.clone());
                    entry.reference_columns.push(reference.field.clone());
                }
                Extension::Unique { name } => {
                    let key = name.clone().unwrap_or_else(|| field.key.clone());
                    let entry = unique_groups.entry(key).or_insert_with(|| CompositeUnique {
                        name: name.clone(),
                        columns: Vec::new(),
                    });
                    entry.columns.push(field.column_name.clone());
                }
                Extension::Index {
                    name,
                    method,
                    unique,
                    ..
                } => {
                    let key = name.clone().unwrap_or_else(|| field.key.clone());
                    let entry = index_groups.entry(key).or_insert_with(|| CompositeIndex {
                        name: name.clone(),
                        columns: Vec::new(),
                        method: *method,
                        unique: *unique,
                    });
                    entry.columns.push(field.column_name.clone());
                }
                Extension::Check { expr, name } => {
                    let key = name.clone().unwrap_or_else(|| field.key.clone());
                    let entry = check_groups.entry(key).or_insert_with(|| CompositeCheck {
                        name: name.clone(),
                        columns: Vec::new(),
                        exprs: Vec::new(),
                    });
                    entry.columns.push(field.column_name.clone());
                    entry.exprs.push(expr.clone());
                }
                Extension::PrimaryKey | Extension::AutoIncrement { .. } | Extension::ForeignKeyList { .. } => {}
            }
        }
    }

    entity.composite_foreign_keys = fk_groups.into_values().collect();
    entity.composite_uniques = unique_groups.into_values().collect();
    entity.composite_checks = check_groups.into_values().collect();

    index_groups.into_values().collect()
}

fn bind_sequences(entity: &mut Entity) {
    let entity_name = entity.name.clone();
    let mut owned = Vec::new();
    for field in &mut entity.fields {
        for extension in &mut field.extensions {
            if let Extension::AutoIncrement { sequence } = extension {
                if sequence.is_none() {
                    let generated = format!("{entity_name}_{}_seq", field.key);
                    owned.push(generated.clone());
                    *sequence = Some(generated);
                } else if let Some(name) = sequence {
                    owned.push(name.clone());
                }
            }
        }
    }
    entity.owned_sequences = owned;
}
