//! The language-neutral expression algebra (§4.1): constants, column
//! references, operators, calls, raw fragments, aliases, casts, window
//! specs, and unresolved path chains, plus the visitor used to walk them.
//! Dialect-specific SQL rendering lives one layer up, in `ento-query`.

mod column_ref;
mod expr;
pub mod func;
mod visitor;

pub use column_ref::{ColumnRef, EntityRef};
pub use expr::{BinaryOp, Expr, OrderDirection, RawFragment, UnaryOp};
pub use visitor::{ColumnCollector, ExprVisitor, walk_expr};

#[cfg(test)]
mod tests {
    use super::*;
    use ento_core::Value;

    fn col(entity: &str, field: &str) -> Expr {
        Expr::Column(ColumnRef::new(EntityRef::new(None, entity), field))
    }

    #[test]
    fn inversion_law_eq() {
        let e = col("User", "id").eq(Expr::Const(Value::Int(1)));
        let double_negated = !(!e.clone());
        assert_eq!(e, double_negated);
    }

    #[test]
    fn inversion_law_and() {
        let e = col("User", "a")
            .eq(Expr::Const(Value::Int(1)))
            .and(col("User", "b").eq(Expr::Const(Value::Int(2))));
        let double_negated = !(!e.clone());
        assert_eq!(e, double_negated);
    }

    #[test]
    fn canonical_negation_table() {
        assert_eq!(BinaryOp::Eq.negate(), Some(BinaryOp::Neq));
        assert_eq!(BinaryOp::Lt.negate(), Some(BinaryOp::Gte));
        assert_eq!(BinaryOp::In.negate(), Some(BinaryOp::NotIn));
        assert_eq!(BinaryOp::Is.negate(), Some(BinaryOp::IsNot));
        assert_eq!(BinaryOp::ILike.negate(), Some(BinaryOp::NotILike));
        assert_eq!(BinaryOp::Add.negate(), None);
    }

    #[test]
    fn contains_expands_to_ilike_concat() {
        let e = col("User", "name").contains(Expr::Const(Value::Text("abc".to_string())));
        match e {
            Expr::Binary(BinaryOp::ILike, lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Column(_)));
                assert!(matches!(*rhs, Expr::Binary(BinaryOp::Add, _, _)));
            }
            _ => panic!("expected ILIKE binary expression"),
        }
    }

    #[test]
    fn referenced_columns_collects_both_sides() {
        let e = col("User", "a").eq(col("User", "b"));
        let cols = e.referenced_columns();
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn precedence_or_looser_than_and() {
        assert!(BinaryOp::Or.precedence() > BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Eq.precedence());
    }
}
