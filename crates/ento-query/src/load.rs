use ento_core::EntityError;
use ento_expr::{ColumnRef, EntityRef};
use ento_model::{EntityId, Registry, Relation, RelationKind};

use crate::compile::compile_expr;
use crate::sql_builder::SqlBuilder;

/// A relation to hydrate alongside a query's own columns (§3 C6, §4.2
/// scenario-level "load specs"). Compiles to a correlated subquery: a
/// scalar `json_build_object(...)` for `One`, wrapped in `json_agg` for
/// `Many`/`ManyAcross` (§9 Design Notes, grounded on the
/// `json_object`/`json_agg` rendering pattern: project remote columns into
/// a JSON object, then fold many rows with `COALESCE(json_agg(...), '[]')`).
#[derive(Debug, Clone)]
pub enum LoadSpec {
    One {
        key: String,
        parent_alias: String,
        remote_id: EntityId,
        remote_alias: String,
        join: ento_model::JoinSpec,
    },
    Many {
        key: String,
        parent_alias: String,
        remote_id: EntityId,
        remote_alias: String,
        join: ento_model::JoinSpec,
    },
    ManyAcross {
        key: String,
        parent_alias: String,
        link_id: EntityId,
        link_alias: String,
        remote_id: EntityId,
        remote_alias: String,
        self_link_join: ento_model::JoinSpec,
        link_remote_join: ento_model::JoinSpec,
    },
}

/// `JoinSpec::synthesize` only ever reads the alias off the `EntityRef`s it
/// receives (never the name), so the "self" side of a correlated subquery
/// can be stamped with an empty name as long as its alias is set.
impl LoadSpec {
    pub fn key(&self) -> &str {
        match self {
            LoadSpec::One { key, .. } | LoadSpec::Many { key, .. } | LoadSpec::ManyAcross { key, .. } => key,
        }
    }

    /// Build the default load spec for `relation`, assigning it a fresh
    /// alias via the owning query (used both for explicit `.load(...)` calls
    /// and for injecting `Loading::Always` relations automatically).
    pub fn for_relation(query: &mut crate::query::Query, registry: &Registry, relation: &Relation) -> Option<LoadSpec> {
        let parent_alias = query.root_alias.clone();
        match &relation.kind {
            RelationKind::One { remote_entity, join, .. } => {
                let remote_id = registry.get_id(remote_entity)?;
                let remote_alias = format!("load_{}", relation.key);
                Some(LoadSpec::One {
                    key: relation.key.clone(),
                    parent_alias,
                    remote_id,
                    remote_alias,
                    join: join.clone(),
                })
            }
            RelationKind::Many { remote_entity, join, .. } => {
                let remote_id = registry.get_id(remote_entity)?;
                let remote_alias = format!("load_{}", relation.key);
                Some(LoadSpec::Many {
                    key: relation.key.clone(),
                    parent_alias,
                    remote_id,
                    remote_alias,
                    join: join.clone(),
                })
            }
            RelationKind::ManyAcross {
                link_entity,
                remote_entity,
                self_link_join,
                link_remote_join,
                ..
            } => {
                let link_id = registry.get_id(link_entity)?;
                let remote_id = registry.get_id(remote_entity)?;
                Some(LoadSpec::ManyAcross {
                    key: relation.key.clone(),
                    parent_alias,
                    link_id,
                    link_alias: format!("load_{}_link", relation.key),
                    remote_id,
                    remote_alias: format!("load_{}", relation.key),
                    self_link_join: self_link_join.clone(),
                    link_remote_join: link_remote_join.clone(),
                })
            }
        }
    }

    pub fn compile(&self, registry: &Registry, builder: &mut SqlBuilder) -> Result<(), EntityError> {
        match self {
            LoadSpec::One {
                key,
                parent_alias,
                remote_id,
                remote_alias,
                join,
            } => {
                let remote = registry.by_id(*remote_id);
                let pk_field = pk_column(remote);
                let self_ref = EntityRef::new(None, "").with_alias(parent_alias.clone());
                let remote_ref = EntityRef::new(remote.schema.clone(), remote.display_name()).with_alias(remote_alias.clone());
                let on = join.synthesize(&self_ref, &remote_ref, &pk_field);

                builder.push_str("(SELECT ");
                build_json_object(remote, remote_alias, builder)?;
                builder.push_str(" FROM ");
                builder.push_table(&remote.name, remote.schema.as_deref(), Some(remote_alias.as_str()));
                builder.push_str(" WHERE ");
                compile_expr(&on, builder)?;
                builder.push_str(" LIMIT 1)");
                builder.push_str(" AS ");
                builder.push_identifier(key);
            }
            LoadSpec::Many {
                key,
                parent_alias,
                remote_id,
                remote_alias,
                join,
            } => {
                let remote = registry.by_id(*remote_id);
                let pk_field = "id".to_string();
                let self_ref = EntityRef::new(None, "").with_alias(parent_alias.clone());
                let remote_ref = EntityRef::new(remote.schema.clone(), remote.display_name()).with_alias(remote_alias.clone());
                let on = join.synthesize(&self_ref, &remote_ref, &pk_field);

                builder.push_str("COALESCE((SELECT json_agg(");
                build_json_object(remote, remote_alias, builder)?;
                builder.push_str(") FROM ");
                builder.push_table(&remote.name, remote.schema.as_deref(), Some(remote_alias.as_str()));
                builder.push_str(" WHERE ");
                compile_expr(&on, builder)?;
                builder.push_str("), '[]'::json)");
                builder.push_str(" AS ");
                builder.push_identifier(key);
            }
            LoadSpec::ManyAcross {
                key,
                parent_alias,
                link_id,
                link_alias,
                remote_id,
                remote_alias,
                self_link_join,
                link_remote_join,
            } => {
                let link = registry.by_id(*link_id);
                let remote = registry.by_id(*remote_id);

                let self_ref = EntityRef::new(None, "").with_alias(parent_alias.clone());
                let link_ref = EntityRef::new(link.schema.clone(), link.display_name()).with_alias(link_alias.clone());
                let remote_ref = EntityRef::new(remote.schema.clone(), remote.display_name()).with_alias(remote_alias.clone());
                let remote_pk = pk_column(remote);

                let self_link_on = self_link_join.synthesize(&self_ref, &link_ref, "id");
                let link_remote_on = link_remote_join.synthesize(&link_ref, &remote_ref, &remote_pk);

                builder.push_str("COALESCE((SELECT json_agg(");
                build_json_object(remote, remote_alias, builder)?;
                builder.push_str(") FROM ");
                builder.push_table(&link.name, link.schema.as_deref(), Some(link_alias.as_str()));
                builder.push_str(" JOIN ");
                builder.push_table(&remote.name, remote.schema.as_deref(), Some(remote_alias.as_str()));
                builder.push_str(" ON ");
                compile_expr(&link_remote_on, builder)?;
                builder.push_str(" WHERE ");
                compile_expr(&self_link_on, builder)?;
                builder.push_str("), '[]'::json)");
                builder.push_str(" AS ");
                builder.push_identifier(key);
            }
        }
        Ok(())
    }
}

fn pk_column(entity: &ento_model::Entity) -> String {
    entity
        .primary_key_fields()
        .first()
        .map(|f| f.column_name.clone())
        .unwrap_or_else(|| "id".to_string())
}

fn build_json_object(entity: &ento_model::Entity, alias: &str, builder: &mut SqlBuilder) -> Result<(), EntityError> {
    builder.push_str("json_build_object(");
    let fields: Vec<_> = entity.storable_fields().collect();
    let len = fields.len();
    for (i, field) in fields.into_iter().enumerate() {
        builder.push_string_literal(&field.key);
        builder.push_str(", ");
        compile_expr(
            &ento_expr::Expr::Column(ColumnRef::new(
                EntityRef::new(entity.schema.clone(), entity.display_name()).with_alias(alias.to_string()),
                field.column_name.clone(),
            )),
            builder,
        )?;
        if i + 1 < len {
            builder.push_str(", ");
        }
    }
    builder.push(')');
    Ok(())
}
