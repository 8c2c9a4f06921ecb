//! The entity metamodel: declarative entity/field/relation/virtual-attribute
//! types (C3), per-instance dirty-tracking state (C4), and the relation
//! join-synthesis primitives (C5) the query compiler builds on.

mod bind;
mod entity;
mod extension;
mod field;
mod mapped_arena;
mod registry;
mod relation;
mod state;
mod trigger;
mod virtual_attr;

pub use bind::CompositeIndex;
pub use entity::{
    CompositeCheck, CompositeForeignKey, CompositeUnique, Entity, EntityBuilder, FixEntry, Mixin,
    PolymorphRole, TableOwnership,
};
pub use extension::{Extension, IndexMethod, ReferentialAction, RefTarget};
pub use field::{Field, FieldDefault};
pub use mapped_arena::{MappedArena, Slab, SlabIndex};
pub use registry::{DepNode, EntityId, Registry};
pub use relation::{JoinSpec, Loading, Relation, RelationKind};
pub use state::{EntityState, FieldChange, Instance};
pub use trigger::{Trigger, TriggerEvent, TriggerTiming};
pub use virtual_attr::{CompareHook, OrderHook, ValueHook, VirtualAttribute, VirtualCompareOp};

#[cfg(test)]
mod tests {
    use super::*;
    use ento_core::{FieldImpl, IntBits, Value};

    fn sample_entity() -> Entity {
        EntityBuilder::new("User")
            .schema("public")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32))
                    .with_extension(Extension::PrimaryKey)
                    .with_extension(Extension::AutoIncrement { sequence: None }),
            )
            .field(Field::new("email", FieldImpl::String).not_null())
            .field(
                Field::new("email", FieldImpl::String), // duplicate key, should be dropped
            )
            .build()
    }

    #[test]
    fn builder_dedups_by_key_and_assigns_index() {
        let entity = sample_entity();
        assert_eq!(entity.fields.len(), 2);
        assert_eq!(entity.fields[0].key, "id");
        assert_eq!(entity.fields[0].index, 0);
        assert_eq!(entity.fields[1].key, "email");
        assert_eq!(entity.fields[1].index, 1);
    }

    #[test]
    fn registry_binds_owned_sequence_name() {
        let mut registry = Registry::new();
        let id = registry.add_entity(sample_entity());
        let entity = registry.by_id(id);
        assert_eq!(entity.owned_sequences, vec!["User_id_seq".to_string()]);
    }

    #[test]
    fn extensions_sharing_a_group_form_one_composite_foreign_key() {
        let entity = EntityBuilder::new("OrderLine")
            .field(Field::new("order_id", FieldImpl::Int(IntBits::B64)).with_extension(
                Extension::ForeignKey {
                    reference: RefTarget::new("Order", "id"),
                    on_update: ReferentialAction::Restrict,
                    on_delete: ReferentialAction::Cascade,
                    group: Some("fk_order".into()),
                    name: None,
                },
            ))
            .field(
                Field::new("order_version", FieldImpl::Int(IntBits::B32)).with_extension(
                    Extension::ForeignKey {
                        reference: RefTarget::new("Order", "version"),
                        on_update: ReferentialAction::Restrict,
                        on_delete: ReferentialAction::Cascade,
                        group: Some("fk_order".into()),
                        name: None,
                    },
                ),
            )
            .build();

        let mut registry = Registry::new();
        let id = registry.add_entity(entity);
        let bound = registry.by_id(id);
        assert_eq!(bound.composite_foreign_keys.len(), 1);
        assert_eq!(
            bound.composite_foreign_keys[0].columns,
            vec!["order_id".to_string(), "order_version".to_string()]
        );
    }

    #[test]
    fn dependency_list_orders_referenced_entity_before_dependent() {
        let parent = EntityBuilder::new("Order")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32)).with_extension(Extension::PrimaryKey),
            )
            .build();
        let child = EntityBuilder::new("OrderLine")
            .field(
                Field::new("order_id", FieldImpl::Int(IntBits::B32)).with_extension(
                    Extension::ForeignKey {
                        reference: RefTarget::new("Order", "id"),
                        on_update: ReferentialAction::Restrict,
                        on_delete: ReferentialAction::Restrict,
                        group: None,
                        name: None,
                    },
                ),
            )
            .build();

        let mut registry = Registry::new();
        let order_id = registry.add_entity(parent);
        let line_id = registry.add_entity(child);

        let deps = registry.dependency_list(line_id);
        let order_pos = deps.iter().position(|n| *n == DepNode::Entity(order_id));
        let line_pos = deps.iter().position(|n| *n == DepNode::Entity(line_id));
        assert!(order_pos.unwrap() < line_pos.unwrap());
    }

    #[test]
    fn dependency_list_tolerates_self_reference_cycle() {
        let entity = EntityBuilder::new("Category")
            .field(
                Field::new("id", FieldImpl::Serial(IntBits::B32)).with_extension(Extension::PrimaryKey),
            )
            .field(
                Field::new("parent_id", FieldImpl::Int(IntBits::B32)).with_extension(
                    Extension::ForeignKey {
                        reference: RefTarget::new("Category", "id"),
                        on_update: ReferentialAction::Restrict,
                        on_delete: ReferentialAction::Cascade,
                        group: None,
                        name: None,
                    },
                ),
            )
            .build();

        let mut registry = Registry::new();
        let id = registry.add_entity(entity);
        let deps = registry.dependency_list(id);
        assert_eq!(deps.iter().filter(|n| **n == DepNode::Entity(id)).count(), 1);
    }

    #[test]
    fn entity_state_reports_changes_against_initial() {
        let entity = sample_entity();
        let mut state = EntityState::from_loaded([
            ("id".to_string(), Value::Int(1)),
            ("email".to_string(), Value::Text("a@example.com".into())),
        ]);
        assert!(!state.has_changes(&entity));

        state.set("email", Value::Text("b@example.com".into()));
        let changes = state.changes(&entity);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, "email");

        state.reset_after_save();
        assert!(!state.has_changes(&entity));
    }

    #[test]
    fn new_instance_reports_every_set_field_as_changed() {
        let entity = sample_entity();
        let mut state = EntityState::new();
        state.set("email", Value::Text("new@example.com".into()));
        let changes = state.changes(&entity);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].initial, None);
    }
}
