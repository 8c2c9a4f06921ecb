//! Projects a [`Registry`] into the same [`LiveSchema`] shape
//! [`crate::reflect`] introspects, so `diff` can compare two values of one
//! type instead of a bespoke target/live pair (§4.4 step 2).

use ento_model::{Registry, TableOwnership};

use crate::reflect::{
    LiveCheck, LiveColumn, LiveCompositeType, LiveForeignKey, LiveIndex, LiveSchema, LiveTable, LiveTrigger, LiveUnique,
};

pub fn target_schema(registry: &Registry) -> LiveSchema {
    let mut live = LiveSchema::default();

    for (_, entity) in registry.iter() {
        if entity.ownership == TableOwnership::Virtual {
            let columns = entity
                .storable_fields()
                .map(|f| LiveColumn {
                    name: f.column_name.clone(),
                    sql_type: f.sql_type_name(),
                    nullable: f.nullable,
                    default: None,
                })
                .collect();
            live.composite_types.push(LiveCompositeType {
                name: entity.name.clone(),
                columns,
            });
        }
    }

    for (id, entity) in registry.iter() {
        if !matches!(entity.ownership, TableOwnership::Owned) {
            continue;
        }

        let mut table = LiveTable {
            schema: entity.schema.clone().unwrap_or_default(),
            name: entity.name.clone(),
            primary_key: entity.primary_key_fields().iter().map(|f| f.column_name.clone()).collect(),
            columns: Vec::new(),
        };
        for field in entity.storable_fields() {
            table.columns.push(LiveColumn {
                name: field.column_name.clone(),
                sql_type: field.sql_type_name(),
                nullable: field.nullable,
                default: None,
            });
        }
        live.tables.push(table);

        live.sequences.extend(entity.owned_sequences.iter().cloned());

        for fk in &entity.composite_foreign_keys {
            let referenced = registry.get(&fk.reference_entity);
            let ref_table = referenced.map(|e| e.name.clone()).unwrap_or_else(|| fk.reference_entity.clone());
            let name = fk
                .name
                .clone()
                .unwrap_or_else(|| ento_schema::foreign_key_name(&entity.name, &fk.columns, &ref_table, &fk.reference_columns));
            live.foreign_keys.push(LiveForeignKey {
                name,
                table: entity.name.clone(),
                columns: fk.columns.clone(),
                ref_table,
                ref_columns: fk.reference_columns.clone(),
            });
        }

        for unique in &entity.composite_uniques {
            let name = unique
                .name
                .clone()
                .unwrap_or_else(|| ento_schema::unique_name(&entity.name, &unique.columns));
            live.uniques.push(LiveUnique {
                name,
                table: entity.name.clone(),
                columns: unique.columns.clone(),
            });
        }

        for check in &entity.composite_checks {
            let name = check
                .name
                .clone()
                .unwrap_or_else(|| ento_schema::check_name(&entity.name, &check.columns));
            let rendered: Vec<String> = check.exprs.iter().map(ento_schema::render_ddl_expr).collect();
            let pairs: Vec<(&str, &str)> = check
                .columns
                .iter()
                .map(String::as_str)
                .zip(rendered.iter().map(String::as_str))
                .collect();
            live.checks.push(LiveCheck {
                name,
                table: entity.name.clone(),
                comment: Some(ento_schema::check_comment(&pairs)),
            });
        }

        for index in registry.indexes_of(id) {
            let name = index
                .name
                .clone()
                .unwrap_or_else(|| ento_schema::index_name(&entity.name, &index.columns));
            live.indexes.push(LiveIndex {
                name,
                table: entity.name.clone(),
                columns: index.columns.clone(),
                unique: index.unique,
            });
        }
        for index in ento_schema::auto_fk_indexes(entity) {
            let name = ento_schema::index_name(&entity.name, &index.columns);
            if !live.indexes.iter().any(|i| i.name == name) {
                live.indexes.push(LiveIndex {
                    name,
                    table: entity.name.clone(),
                    columns: index.columns,
                    unique: false,
                });
            }
        }

        for trigger in &entity.triggers {
            let function_name =
                ento_schema::trigger_function_name(&entity.name, &trigger.name, trigger.when.as_deref(), &trigger.body);
            live.triggers.push(LiveTrigger {
                name: trigger.name.clone(),
                table: entity.name.clone(),
                function_name,
            });
        }
    }

    live
}
