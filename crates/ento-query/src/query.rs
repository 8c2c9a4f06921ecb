use ento_core::{EntityError, EntityResult};
use ento_expr::{Expr, OrderDirection};
use ento_model::{EntityId, Registry, RelationKind};

use crate::compile::compile_expr;
use crate::load::LoadSpec;
use crate::sql_builder::SqlBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    Update,
    Share,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    Wait,
    NoWait,
    SkipLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForUpdateSpec {
    pub strength: LockStrength,
    pub wait: LockWait,
}

/// One joined table: its entity, the alias it was assigned (`t0` for the
/// root, `t1`, `t2`, … for each auto-discovered hop), and the join
/// condition relating it back to whatever entity introduced it.
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub entity_id: EntityId,
    pub alias: String,
    pub on: Expr,
}

/// A query against one root entity (§3 C6 "Query"). Every builder method
/// takes `&self` and returns an owned, independently-usable `Query` — the
/// receiver is never mutated, so a base query can be branched into several
/// variants without the branches observing each other (§4.2 "Queries are
/// immutable; each builder call yields a new value").
#[derive(Debug, Clone)]
pub struct Query {
    pub root_id: EntityId,
    pub root_alias: String,
    pub columns: Vec<Expr>,
    pub predicate: Expr,
    pub joins: Vec<JoinClause>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<(Expr, OrderDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub load_specs: Vec<LoadSpec>,
    pub for_update: Option<ForUpdateSpec>,
    next_alias: usize,
    /// (owning entity, relation key) -> alias already assigned for that
    /// hop, so resolving two paths through the same relation reuses one
    /// join instead of joining the remote table twice.
    join_aliases: Vec<((EntityId, String), String)>,
}

impl Query {
    pub fn new(root_id: EntityId) -> Self {
        Query {
            root_id,
            root_alias: "t0".to_string(),
            columns: Vec::new(),
            predicate: Expr::Const(ento_core::Value::Bool(true)),
            joins: Vec::new(),
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            load_specs: Vec::new(),
            for_update: None,
            next_alias: 1,
            join_aliases: Vec::new(),
        }
    }

    pub fn select(&self, columns: Vec<Expr>) -> Self {
        let mut q = self.clone();
        q.columns = columns;
        q
    }

    pub fn filter(&self, predicate: Expr) -> Self {
        let mut q = self.clone();
        q.predicate = q.predicate.and(predicate);
        q
    }

    pub fn group_by(&self, columns: Vec<Expr>) -> Self {
        let mut q = self.clone();
        q.group_by = columns;
        q
    }

    pub fn having(&self, predicate: Expr) -> Self {
        let mut q = self.clone();
        q.having = Some(predicate);
        q
    }

    pub fn order_by(&self, order: Vec<(Expr, OrderDirection)>) -> Self {
        let mut q = self.clone();
        q.order_by = order;
        q
    }

    pub fn limit(&self, limit: i64) -> Self {
        let mut q = self.clone();
        q.limit = Some(limit);
        q
    }

    pub fn offset(&self, offset: i64) -> Self {
        let mut q = self.clone();
        q.offset = Some(offset);
        q
    }

    pub fn for_update(&self, spec: ForUpdateSpec) -> Self {
        let mut q = self.clone();
        q.for_update = Some(spec);
        q
    }

    pub fn load(&self, spec: LoadSpec) -> Self {
        let mut q = self.clone();
        q.load_specs.push(spec);
        q
    }

    fn fresh_alias(&mut self) -> String {
        let alias = format!("t{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    /// Every `Always`-loaded relation on the root entity that isn't already
    /// named in `load_specs`, injected so it's never silently dropped
    /// (§4.2, Glossary: "Loading always").
    pub fn with_always_loaded(&self, registry: &Registry) -> Self {
        let mut q = self.clone();
        let entity = registry.by_id(q.root_id);
        for relation in entity.always_loaded_relations() {
            if q.load_specs.iter().any(|spec| spec.key() == relation.key) {
                continue;
            }
            if let Some(spec) = LoadSpec::for_relation(&mut q, registry, relation) {
                q.load_specs.push(spec);
            }
        }
        q
    }

    /// Resolve an unqualified `field.sub.sub` path against the root entity,
    /// auto-joining one alias per relation hop it crosses, and return the
    /// resolved `Column` expression (§4.1 "Path", §9 "auto-join"). A path
    /// through a `Composite` field resolves to `("col").sub` via a `Cast`less
    /// dotted accessor instead of a join.
    pub fn resolve_path(&mut self, segments: &[String], registry: &Registry) -> EntityResult<Expr> {
        if segments.is_empty() {
            return Err(EntityError::Compile("empty path".to_string()));
        }

        let mut entity_id = self.root_id;
        let mut alias = self.root_alias.clone();

        for (i, segment) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;
            let entity = registry.by_id(entity_id);

            if let Some(field) = entity.field_by_key(segment) {
                if !is_last {
                    return Err(EntityError::Compile(format!(
                        "'{segment}' is a scalar field and cannot be traversed further"
                    )));
                }
                return Ok(Expr::Column(ento_expr::ColumnRef::new(
                    ento_expr::EntityRef::new(entity.schema.clone(), entity.display_name()).with_alias(alias),
                    field.column_name.clone(),
                )));
            }

            let relation = entity.relation_by_key(segment).ok_or_else(|| {
                EntityError::Compile(format!("no field or relation named '{segment}' on '{}'", entity.name))
            })?;

            if is_last {
                return Err(EntityError::Compile(format!(
                    "'{segment}' names a relation, not a scalar field; use load() to fetch it"
                )));
            }

            let remote_name = relation.kind.remote_entity();
            let remote_id = registry
                .get_id(remote_name)
                .ok_or_else(|| EntityError::Schema(format!("unknown entity '{remote_name}'")))?;

            let cache_key = (entity_id, relation.key.clone());
            let join_alias = if let Some((_, alias)) = self.join_aliases.iter().find(|(k, _)| *k == cache_key) {
                alias.clone()
            } else {
                let remote_entity = registry.by_id(remote_id);
                let new_alias = self.fresh_alias();
                let self_ref =
                    ento_expr::EntityRef::new(entity.schema.clone(), entity.display_name()).with_alias(alias.clone());
                let remote_ref = ento_expr::EntityRef::new(remote_entity.schema.clone(), remote_entity.display_name())
                    .with_alias(new_alias.clone());
                let pk_field = remote_entity
                    .primary_key_fields()
                    .first()
                    .map(|f| f.column_name.clone())
                    .unwrap_or_else(|| "id".to_string());

                let on = match &relation.kind {
                    RelationKind::One { join, .. } | RelationKind::Many { join, .. } => {
                        join.synthesize(&self_ref, &remote_ref, &pk_field)
                    }
                    RelationKind::ManyAcross { .. } => {
                        return Err(EntityError::Compile(
                            "ManyAcross relations must be traversed through load(), not a path expression".to_string(),
                        ));
                    }
                };

                self.joins.push(JoinClause {
                    entity_id: remote_id,
                    alias: new_alias.clone(),
                    on,
                });
                self.join_aliases.push((cache_key, new_alias.clone()));
                new_alias
            };

            entity_id = remote_id;
            alias = join_alias;
        }

        unreachable!("an empty path is rejected above; every iteration either returns or advances")
    }

    /// Compile this query to parameterized SQL (§4.2 "the compiler produces
    /// `(sql_text, param_tuple)`").
    pub fn compile(&self, registry: &Registry) -> EntityResult<(String, Vec<ento_core::Value>)> {
        let mut builder = SqlBuilder::new();
        builder.push_str("SELECT ");

        let root = registry.by_id(self.root_id);
        let projections: Vec<Expr> = if self.columns.is_empty() {
            root.storable_fields()
                .map(|f| {
                    Expr::Column(ento_expr::ColumnRef::new(
                        ento_expr::EntityRef::new(root.schema.clone(), root.display_name()).with_alias(self.root_alias.clone()),
                        f.column_name.clone(),
                    ))
                })
                .collect()
        } else {
            self.columns.clone()
        };

        let mut compile_err = None;
        builder.push_iter(projections.iter(), ", ", |b, expr| {
            if let Err(e) = compile_expr(expr, b) {
                compile_err.get_or_insert(e);
            }
        });
        if let Some(e) = compile_err {
            return Err(e);
        }

        for spec in &self.load_specs {
            builder.push_str(", ");
            spec.compile(registry, &mut builder)?;
        }

        builder.push_str(" FROM ");
        builder.push_table(&root.name, root.schema.as_deref(), Some(&self.root_alias));

        for join in &self.joins {
            let entity = registry.by_id(join.entity_id);
            builder.push_str(" LEFT JOIN ");
            builder.push_table(&entity.name, entity.schema.as_deref(), Some(&join.alias));
            builder.push_str(" ON ");
            compile_expr(&join.on, &mut builder)?;
        }

        if !matches!(self.predicate, Expr::Const(ento_core::Value::Bool(true))) {
            builder.push_str(" WHERE ");
            compile_expr(&self.predicate, &mut builder)?;
        }

        if !self.group_by.is_empty() {
            builder.push_str(" GROUP BY ");
            builder.push_iter(self.group_by.iter(), ", ", |b, e| {
                let _ = compile_expr(e, b);
            });
        }

        if let Some(having) = &self.having {
            builder.push_str(" HAVING ");
            compile_expr(having, &mut builder)?;
        }

        if !self.order_by.is_empty() {
            builder.push_str(" ORDER BY ");
            builder.push_iter(self.order_by.iter(), ", ", |b, (expr, dir)| {
                let _ = compile_expr(expr, b);
                b.push_str(if *dir == OrderDirection::Asc { " ASC" } else { " DESC" });
            });
        }

        if let Some(limit) = self.limit {
            builder.push_str(format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            builder.push_str(format!(" OFFSET {offset}"));
        }

        if let Some(spec) = &self.for_update {
            builder.push_str(match spec.strength {
                LockStrength::Update => " FOR UPDATE",
                LockStrength::Share => " FOR SHARE",
            });
            builder.push_str(match spec.wait {
                LockWait::Wait => "",
                LockWait::NoWait => " NOWAIT",
                LockWait::SkipLocked => " SKIP LOCKED",
            });
        }

        Ok(builder.into_sql())
    }
}
