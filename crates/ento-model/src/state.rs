use indexmap::IndexMap;

use ento_core::{EntityError, EntityResult, Value};

use crate::entity::Entity;
use crate::registry::EntityId;

/// A single changed field: `key`, the value before any mutation this
/// instance has seen (as loaded, or `None` for a field that has never been
/// read/set), and the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub key: String,
    pub initial: Option<Value>,
    pub current: Value,
}

/// The mutable state backing one entity instance (§3 C4 "Instance state").
/// `initial` holds what was loaded from (or last saved to) the database;
/// `current` holds the live attribute values. A field absent from `current`
/// has never been assigned and must be read from the database before use —
/// reading it without doing so is a [`EntityError::State`].
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    current: IndexMap<String, Value>,
    initial: IndexMap<String, Value>,
    /// Relation keys that have been assigned or appended to since load/save;
    /// used to decide which relations the save planner must visit (§10 C10).
    touched_relations: std::collections::HashSet<String>,
    /// Set once a row backing this instance exists in the database — i.e.
    /// this is an update candidate, not an insert candidate.
    persisted: bool,
}

impl EntityState {
    pub fn new() -> Self {
        EntityState::default()
    }

    /// Build state for a freshly loaded row: `current` and `initial` start
    /// identical, and the instance is marked persisted.
    pub fn from_loaded(values: impl IntoIterator<Item = (String, Value)>) -> Self {
        let current: IndexMap<String, Value> = values.into_iter().collect();
        EntityState {
            initial: current.clone(),
            current,
            touched_relations: std::collections::HashSet::new(),
            persisted: true,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    /// Assign `key`, marking it dirty relative to whatever `initial` (or
    /// nothing, for a brand-new instance) holds.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.current.insert(key.into(), value);
    }

    pub fn touch_relation(&mut self, key: impl Into<String>) {
        self.touched_relations.insert(key.into());
    }

    pub fn touched_relations(&self) -> impl Iterator<Item = &str> {
        self.touched_relations.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Changed fields since the last load/save, computed per-field through
    /// [`FieldImpl::values_equal`](ento_core::FieldImpl::values_equal) so
    /// `Composite`/`Json` fields compare structurally rather than by
    /// reference. A field present in `current` but absent from `initial` is
    /// always reported changed (new instance, or field assigned for the
    /// first time).
    pub fn changes(&self, entity: &Entity) -> Vec<FieldChange> {
        let mut out = Vec::new();
        for field in &entity.fields {
            let Some(current) = self.current.get(&field.key) else {
                continue;
            };
            match self.initial.get(&field.key) {
                Some(initial) if field.implementation.values_equal(initial, current) => {}
                Some(initial) => out.push(FieldChange {
                    key: field.key.clone(),
                    initial: Some(initial.clone()),
                    current: current.clone(),
                }),
                None => out.push(FieldChange {
                    key: field.key.clone(),
                    initial: None,
                    current: current.clone(),
                }),
            }
        }
        out
    }

    pub fn has_changes(&self, entity: &Entity) -> bool {
        !self.changes(entity).is_empty()
    }

    /// Propagate a nested `Composite` field's own dirty state into this
    /// instance: if the nested instance changed, the outer field is marked
    /// changed too even though the outer `Value::Composite` wrapper may be
    /// byte-for-byte unchanged at the point of comparison (§9 "composite
    /// fields reset their inner state after the owner commits", the mirror
    /// operation run before the dirty check).
    pub fn mark_dirty(&mut self, key: &str) {
        if let Some(current) = self.current.get(key).cloned() {
            self.initial.remove(key);
            self.current.insert(key.to_string(), current);
        }
    }

    /// Reset `initial` to `current` after a successful save, so the next
    /// `changes()` call reports nothing until further mutation (§3
    /// "changes tracked against the last known persisted state").
    pub fn reset_after_save(&mut self) {
        self.initial = self.current.clone();
        self.touched_relations.clear();
        self.persisted = true;
    }

    /// Read a required field, surfacing the "never loaded" case as a
    /// [`EntityError::State`] rather than panicking (§7).
    pub fn require(&self, key: &str) -> EntityResult<&Value> {
        self.current
            .get(key)
            .ok_or_else(|| EntityError::State(format!("field '{key}' has not been loaded")))
    }
}

/// Ties an [`EntityState`] to the entity type and registry it was
/// constructed against, giving instances a stable identity independent of
/// their current field values (used by the sync differ to match fixture
/// rows and by the save planner to rank instances for ordering).
#[derive(Debug, Clone)]
pub struct Instance {
    pub entity_id: EntityId,
    pub state: EntityState,
}

impl Instance {
    pub fn new(entity_id: EntityId) -> Self {
        Instance {
            entity_id,
            state: EntityState::new(),
        }
    }

    pub fn from_loaded(entity_id: EntityId, values: impl IntoIterator<Item = (String, Value)>) -> Self {
        Instance {
            entity_id,
            state: EntityState::from_loaded(values),
        }
    }
}
