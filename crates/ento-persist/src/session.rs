//! The facade most callers reach for first (§10 C10): `insert`/`update`/
//! `delete`/`save` for writes, `select`/`first`/`one` for reads, wrapping
//! `ento_query::Query` and this crate's save planner behind one object
//! holding the connection and registry together — grounded on the
//! teacher's pattern of a thin session type mediating every database call
//! rather than exposing `TransactionScript` execution directly to callers.

use ento_core::{Connection, EntityError, EntityResult, Value};
use ento_model::{EntityId, Registry};
use ento_query::Query;

use crate::execute::execute_plan;
use crate::load::hydrate_node;
use crate::node::InstanceNode;
use crate::plan::save_operations;

pub struct Session<'a> {
    conn: &'a dyn Connection,
    registry: &'a Registry,
}

impl<'a> Session<'a> {
    pub fn new(conn: &'a dyn Connection, registry: &'a Registry) -> Self {
        Session { conn, registry }
    }

    /// Plans and executes a save for `node` and everything attached to it,
    /// then resets its dirty state to reflect the just-committed values
    /// (§3 "changes tracked against the last known persisted state").
    pub async fn save(&self, node: &mut InstanceNode) -> EntityResult<()> {
        let plan = save_operations(self.registry, node);
        execute_plan(self.conn, &plan).await?;
        node.reset_after_save();
        Ok(())
    }

    pub async fn insert(&self, node: &mut InstanceNode) -> EntityResult<()> {
        self.save(node).await
    }

    pub async fn update(&self, node: &mut InstanceNode) -> EntityResult<()> {
        self.save(node).await
    }

    /// `save` already dispatches insert vs. update per node on whether it's
    /// persisted, so this coincides with `save` for a single top-level call.
    pub async fn insert_or_update(&self, node: &mut InstanceNode) -> EntityResult<()> {
        self.save(node).await
    }

    pub async fn delete(&self, entity_id: EntityId, key: &[(String, Value)]) -> EntityResult<()> {
        let entity = self.registry.by_id(entity_id);
        let mut params = Vec::new();
        let where_clauses: Vec<String> = key
            .iter()
            .map(|(column, value)| {
                params.push(value.clone());
                format!("\"{column}\" = ${}", params.len())
            })
            .collect();
        let sql = format!("DELETE FROM \"{}\" WHERE {}", entity.name, where_clauses.join(" AND "));
        self.conn.execute(&sql, &params).await?;
        Ok(())
    }

    /// Runs `query`, hydrating every row (plus whatever relations it
    /// `load(...)`ed) into an [`InstanceNode`].
    pub async fn select(&self, query: &Query) -> EntityResult<Vec<InstanceNode>> {
        let (sql, params) = query.compile(self.registry)?;
        let rows = self.conn.fetch(&sql, &params).await?;
        let loaded: Vec<String> = query.load_specs.iter().map(|spec| spec.key().to_string()).collect();
        Ok(rows
            .iter()
            .map(|row| hydrate_node(self.registry, query.root_id, row, &loaded))
            .collect())
    }

    /// Runs `query` expecting at most one row.
    pub async fn first(&self, query: &Query) -> EntityResult<Option<InstanceNode>> {
        let mut nodes = self.select(query).await?;
        Ok(if nodes.is_empty() { None } else { Some(nodes.remove(0)) })
    }

    /// Runs `query` expecting exactly one row.
    pub async fn one(&self, query: &Query) -> EntityResult<InstanceNode> {
        let mut nodes = self.select(query).await?;
        match nodes.len() {
            0 => Err(EntityError::MissingRow),
            1 => Ok(nodes.remove(0)),
            n => Err(EntityError::MultipleRows(n)),
        }
    }

    /// Escape hatch for SQL the query builder doesn't cover.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> EntityResult<u64> {
        self.conn.execute(sql, params).await
    }
}
