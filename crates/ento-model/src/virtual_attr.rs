use std::sync::Arc;

use ento_expr::{Expr, OrderDirection};

/// The predicate operator a `compare` hook is asked to rewrite (§4.2,
/// scenario 4: `FullName.formatted.contains("Jane Doe")`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualCompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
}

pub type ValueHook = Arc<dyn Fn() -> Expr + Send + Sync>;
pub type CompareHook = Arc<dyn Fn(VirtualCompareOp, &Expr) -> Expr + Send + Sync>;
pub type OrderHook = Arc<dyn Fn(OrderDirection) -> Vec<(Expr, OrderDirection)> + Send + Sync>;

/// A computed, possibly-SQL-materialized property (§3). Referenced in a
/// query, a virtual expands through whichever hook the context calls for:
/// `value` in a projection, `compare` in a predicate, `order` in an
/// `ORDER BY`.
#[derive(Clone)]
pub struct VirtualAttribute {
    pub key: String,
    pub index: usize,
    pub value: Option<ValueHook>,
    pub compare: Option<CompareHook>,
    pub order: Option<OrderHook>,
    /// Field keys this virtual reads; used to validate that the virtual's
    /// hooks don't reference columns the entity doesn't declare.
    pub depends: Vec<String>,
}

impl std::fmt::Debug for VirtualAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualAttribute")
            .field("key", &self.key)
            .field("index", &self.index)
            .field("has_value", &self.value.is_some())
            .field("has_compare", &self.compare.is_some())
            .field("has_order", &self.order.is_some())
            .field("depends", &self.depends)
            .finish()
    }
}

impl VirtualAttribute {
    pub fn new(key: impl Into<String>, depends: Vec<String>) -> Self {
        VirtualAttribute {
            key: key.into(),
            index: 0,
            value: None,
            compare: None,
            order: None,
            depends,
        }
    }

    pub fn with_value(mut self, hook: ValueHook) -> Self {
        self.value = Some(hook);
        self
    }

    pub fn with_compare(mut self, hook: CompareHook) -> Self {
        self.compare = Some(hook);
        self
    }

    pub fn with_order(mut self, hook: OrderHook) -> Self {
        self.order = Some(hook);
        self
    }

    /// Expand `self <op> value` using the `compare` hook, falling back to
    /// the virtual's materialized `value` compared directly when no
    /// `compare` hook is registered.
    pub fn expand_compare(&self, op: VirtualCompareOp, value: &Expr) -> Option<Expr> {
        self.compare.as_ref().map(|hook| hook(op, value))
    }
}
