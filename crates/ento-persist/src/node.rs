//! The nested instance tree the save planner walks (§10 C10).
//! [`ento_model::Instance`] is deliberately flat — it carries one entity's
//! field state and nothing about what it's related to — so a graph of
//! instances being saved together (an owner plus the `One`/`Many`/
//! `ManyAcross` relatives attached to it in this call) needs its own wrapper.

use std::collections::HashMap;

use ento_model::{EntityId, Instance};

/// The relation-shaped attachment of child nodes to a parent, mirroring
/// [`ento_model::RelationKind`]'s three variants.
#[derive(Debug, Clone)]
pub enum RelationInstances {
    One(Box<InstanceNode>),
    Many(Vec<InstanceNode>),
    ManyAcross(Vec<InstanceNode>),
}

/// One instance plus whichever of its relations are being saved alongside
/// it. A relation absent from `relations` is left untouched by the save
/// planner entirely — this is how "partial" saves (update just this row,
/// don't touch its children) are expressed.
#[derive(Debug, Clone)]
pub struct InstanceNode {
    pub instance: Instance,
    pub relations: HashMap<String, RelationInstances>,
}

impl InstanceNode {
    pub fn new(entity_id: EntityId) -> Self {
        InstanceNode {
            instance: Instance::new(entity_id),
            relations: HashMap::new(),
        }
    }

    pub fn from_instance(instance: Instance) -> Self {
        InstanceNode {
            instance,
            relations: HashMap::new(),
        }
    }

    pub fn attach_one(mut self, key: impl Into<String>, child: InstanceNode) -> Self {
        self.relations.insert(key.into(), RelationInstances::One(Box::new(child)));
        self
    }

    pub fn attach_many(mut self, key: impl Into<String>, children: Vec<InstanceNode>) -> Self {
        self.relations.insert(key.into(), RelationInstances::Many(children));
        self
    }

    pub fn attach_many_across(mut self, key: impl Into<String>, children: Vec<InstanceNode>) -> Self {
        self.relations.insert(key.into(), RelationInstances::ManyAcross(children));
        self
    }

    pub fn entity_id(&self) -> EntityId {
        self.instance.entity_id
    }

    /// Reset this node and every attached child's dirty state after a
    /// successful commit (§3 "changes tracked against the last known
    /// persisted state").
    pub fn reset_after_save(&mut self) {
        self.instance.state.reset_after_save();
        for rel in self.relations.values_mut() {
            match rel {
                RelationInstances::One(child) => child.reset_after_save(),
                RelationInstances::Many(children) | RelationInstances::ManyAcross(children) => {
                    for child in children {
                        child.reset_after_save();
                    }
                }
            }
        }
    }
}
