use std::collections::HashSet;

use ento_core::FieldImpl;

use crate::bind::{bind_extensions, CompositeIndex};
use crate::entity::Entity;
use crate::extension::Extension;
use crate::mapped_arena::{MappedArena, SlabIndex};

pub type EntityId = SlabIndex<Entity>;

/// A node in a [`Registry::dependency_list`] result: either an entity (table
/// or virtual schema) or a bare sequence object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepNode {
    Entity(EntityId),
    Sequence(String),
}

/// A namespace + dependency graph owning a set of entities (§3
/// "Registry"). Mutated only at entity-declaration time; read-only
/// afterwards, so it may be shared across tasks (§5).
#[derive(Default)]
pub struct Registry {
    entities: MappedArena<Entity>,
    indexes: std::collections::HashMap<EntityId, Vec<CompositeIndex>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Registration (§4.3 step 3): binds the entity's extensions (step 2),
    /// then inserts it. Re-declaring the same qualified name is a no-op,
    /// returning the existing id (entities are the unit of idempotent
    /// declaration, matching `MappedArena::add`).
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let composite_indexes = bind_extensions(&mut entity);
        let key = entity.qualified_name();
        let id = self.entities.add(&key, entity);
        self.indexes.insert(id, composite_indexes);
        id
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get_by_key(name)
    }

    pub fn get_id(&self, name: &str) -> Option<EntityId> {
        self.entities.get_id(name)
    }

    pub fn by_id(&self, id: EntityId) -> &Entity {
        &self.entities[id]
    }

    pub fn indexes_of(&self, id: EntityId) -> &[CompositeIndex] {
        self.indexes.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.values().iter()
    }

    /// Topological dependency order for `entity` (§3 "Registry"): every
    /// entity and sequence it transitively depends on via FK, `Composite`,
    /// `Json` nesting, or polymorph parent, listed before `entity` itself.
    /// Self-references and genuine cycles are allowed (§3 "Cycle breaking
    /// policy") — a cycle is broken by simply not re-descending into a node
    /// already being visited; FK constraints materialize later as `ALTER
    /// TABLE`, so this list only needs to order *creates*, not FKs.
    pub fn dependency_list(&self, id: EntityId) -> Vec<DepNode> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        self.visit(id, &mut order, &mut done, &mut visiting);
        order
    }

    fn visit(
        &self,
        id: EntityId,
        order: &mut Vec<DepNode>,
        done: &mut HashSet<EntityId>,
        visiting: &mut HashSet<EntityId>,
    ) {
        if done.contains(&id) || visiting.contains(&id) {
            return;
        }
        visiting.insert(id);
        let entity = &self.entities[id];

        for seq in &entity.owned_sequences {
            let node = DepNode::Sequence(seq.clone());
            if !order.contains(&node) {
                order.push(node);
            }
        }

        if let Some(parent_name) = entity.polymorph_parent_name() {
            if let Some(parent_id) = self.get_id(parent_name) {
                self.visit(parent_id, order, done, visiting);
            }
        }

        for field in &entity.fields {
            for extension in &field.extensions {
                let reference_entity = match extension {
                    Extension::ForeignKey { reference, .. } => Some(&reference.entity),
                    Extension::ForeignKeyList { reference, .. } => Some(&reference.entity),
                    _ => None,
                };
                if let Some(name) = reference_entity {
                    if let Some(ref_id) = self.get_id(name) {
                        self.visit(ref_id, order, done, visiting);
                    }
                }
            }

            let nested = match &field.implementation {
                FieldImpl::Composite(name) => Some(name.as_str()),
                FieldImpl::Json(Some(name)) | FieldImpl::JsonArray(Some(name)) => Some(name.as_str()),
                _ => None,
            };
            if let Some(name) = nested {
                if let Some(nested_id) = self.get_id(name) {
                    self.visit(nested_id, order, done, visiting);
                }
            }
        }

        visiting.remove(&id);
        done.insert(id);
        order.push(DepNode::Entity(id));
    }
}
