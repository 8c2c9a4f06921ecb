//! Hydrates [`Row`]s (and the `json_build_object`/`json_agg` blobs
//! [`ento_query::LoadSpec`] compiles for eager-loaded relations) back into
//! [`InstanceNode`] trees.
//!
//! A query's own columns are keyed by column name (the compiler never
//! aliases a plain projected column — see `ento_query::Query::compile`);
//! a loaded relation's column is keyed by the relation's field key and
//! holds a JSON object (`One`) or array (`Many`/`ManyAcross`) whose own
//! keys are, in turn, field keys (`ento_query::load::build_json_object`
//! projects by `field.key`, not `field.column_name`).

use ento_core::{Row, Value};
use ento_model::{Entity, EntityId, Instance, Registry};

use crate::node::InstanceNode;

/// Hydrate the root entity's own columns off `row` into a flat [`Instance`]
/// — no relations attached.
pub fn hydrate_instance(entity_id: EntityId, entity: &Entity, row: &Row) -> Instance {
    let values = entity
        .storable_fields()
        .filter_map(|field| row.get(&field.column_name).map(|v| (field.key.clone(), v.clone())));
    Instance::from_loaded(entity_id, values)
}

/// Hydrate `row` into a full [`InstanceNode`], recursively attaching any
/// relation named in `loaded_relations` whose column is present on `row`
/// (i.e. was fetched via a `load(...)` spec).
pub fn hydrate_node(
    registry: &Registry,
    entity_id: EntityId,
    row: &Row,
    loaded_relations: &[String],
) -> InstanceNode {
    let entity = registry.by_id(entity_id);
    let mut node = InstanceNode::from_instance(hydrate_instance(entity_id, entity, row));

    for key in loaded_relations {
        let Some(relation) = entity.relation_by_key(key) else { continue };
        let Some(Value::Json(json)) = row.get(key) else { continue };
        let Some(remote_id) = registry.get_id(relation.kind.remote_entity()) else {
            continue;
        };

        if relation.kind.is_to_many() {
            let Some(items) = json.as_array() else { continue };
            let children = items
                .iter()
                .map(|item| hydrate_from_json(registry, remote_id, item))
                .collect();
            node = node.attach_many(key.clone(), children);
        } else if !json.is_null() {
            let child = hydrate_from_json(registry, remote_id, json);
            node = node.attach_one(key.clone(), child);
        }
    }

    node
}

fn hydrate_from_json(registry: &Registry, entity_id: EntityId, json: &serde_json::Value) -> InstanceNode {
    let entity = registry.by_id(entity_id);
    let obj = json.as_object();
    let values = entity.storable_fields().filter_map(|field| {
        obj.and_then(|o| o.get(&field.key))
            .map(|v| (field.key.clone(), json_to_value(v)))
    });
    InstanceNode::from_instance(Instance::from_loaded(entity_id, values))
}

/// Generic JSON-scalar coercion: `json_build_object` already canonicalizes
/// most PostgreSQL scalar types into JSON primitives, so this reads them
/// back as the closest [`Value`] variant rather than re-deriving each
/// `FieldImpl`'s own wire decoding.
fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(fields) => {
            Value::Composite(fields.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect())
        }
    }
}
