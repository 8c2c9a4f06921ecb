use crate::column_ref::ColumnRef;
use crate::expr::{Expr, RawFragment};
use ento_core::Value;

/// Double-dispatch walker over the expression tree (§4.1), used by the SQL
/// compiler and by analysis passes (dependency collection, auto-join
/// discovery). `visit_expr` is the single entry point; its default
/// implementation dispatches to the leaf hooks and recurses into children
/// via [`walk_expr`]. Override `visit_expr` itself to short-circuit a
/// subtree, or override a leaf hook to observe without reimplementing the
/// recursion.
pub trait ExprVisitor {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_const(&mut self, _value: &Value) {}
    fn visit_column(&mut self, _column: &ColumnRef) {}
    fn visit_path(&mut self, _segments: &[String]) {}
}

/// Recurse into `expr`'s children, dispatching leaves to their dedicated
/// hooks. Exposed so an `ExprVisitor` that overrides `visit_expr` can still
/// fall back to the default recursion for a subset of variants.
pub fn walk_expr<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Const(v) => visitor.visit_const(v),
        Expr::Column(c) => visitor.visit_column(c),
        Expr::Binary(_, l, r) => {
            visitor.visit_expr(l);
            visitor.visit_expr(r);
        }
        Expr::Unary(_, e) => visitor.visit_expr(e),
        Expr::Call(_, args) => {
            for a in args {
                visitor.visit_expr(a);
            }
        }
        Expr::Raw(fragments) => {
            for fragment in fragments {
                if let RawFragment::Expr(e) = fragment {
                    visitor.visit_expr(e);
                }
            }
        }
        Expr::Alias(e, _) => visitor.visit_expr(e),
        Expr::Over {
            call,
            partition,
            order,
        } => {
            visitor.visit_expr(call);
            for p in partition {
                visitor.visit_expr(p);
            }
            for (o, _) in order {
                visitor.visit_expr(o);
            }
        }
        Expr::Cast(e, _) => visitor.visit_expr(e),
        Expr::Path(segments) => visitor.visit_path(segments),
    }
}

/// Collects every [`ColumnRef`] reachable from an expression tree, used by
/// auto-join discovery (§4.2) to find which entities a `WHERE`/`ORDER
/// BY`/`GROUP BY`/`HAVING` clause touches.
#[derive(Default)]
pub struct ColumnCollector {
    pub columns: Vec<ColumnRef>,
}

impl ExprVisitor for ColumnCollector {
    fn visit_column(&mut self, column: &ColumnRef) {
        self.columns.push(column.clone());
    }
}

impl Expr {
    pub fn accept(&self, visitor: &mut impl ExprVisitor) {
        visitor.visit_expr(self);
    }

    /// Every physical column this expression reads, used by virtual
    /// attribute `depends` validation and by auto-join.
    pub fn referenced_columns(&self) -> Vec<ColumnRef> {
        let mut collector = ColumnCollector::default();
        self.accept(&mut collector);
        collector.columns
    }
}
