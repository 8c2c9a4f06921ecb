use ento_core::EntityError;
use ento_expr::{Expr, OrderDirection, RawFragment, UnaryOp};

use crate::sql_builder::SqlBuilder;

/// Renders a resolved `Expr` tree into `builder`, parenthesizing a child
/// only when its operator binds looser than its parent's (§4.1 "Operator
/// precedence"). `Expr::Path` must already have been rewritten away by the
/// query compiler's auto-join pass before reaching here — encountering one
/// is a compiler bug, not a user error, so it surfaces as
/// [`EntityError::Compile`].
pub fn compile_expr(expr: &Expr, builder: &mut SqlBuilder) -> Result<(), EntityError> {
    compile_with_parent(expr, None, builder)
}

fn compile_with_parent(expr: &Expr, parent_precedence: Option<u8>, builder: &mut SqlBuilder) -> Result<(), EntityError> {
    match expr {
        Expr::Const(value) => {
            compile_const(value, builder);
        }
        Expr::Column(column_ref) => {
            builder.push_column(column_ref.entity.display_name(), &column_ref.field);
        }
        Expr::Binary(op, lhs, rhs) => {
            let precedence = op.precedence();
            let needs_parens = parent_precedence.is_some_and(|p| precedence > p);
            if needs_parens {
                builder.push('(');
            }
            compile_with_parent(lhs, Some(precedence), builder)?;
            builder.push(' ');
            builder.push_str(op.sql_symbol());
            builder.push(' ');
            compile_with_parent(rhs, Some(precedence), builder)?;
            if needs_parens {
                builder.push(')');
            }
        }
        Expr::Unary(op, inner) => {
            builder.push_str(op.sql_symbol());
            if *op == UnaryOp::Not {
                builder.push('(');
                compile_expr(inner, builder)?;
                builder.push(')');
            } else {
                compile_with_parent(inner, Some(0), builder)?;
            }
        }
        Expr::Call(name, args) => {
            builder.push_str(name);
            builder.push('(');
            builder.push_iter(args.iter(), ", ", |b, arg| {
                let _ = compile_expr(arg, b);
            });
            builder.push(')');
        }
        Expr::Raw(fragments) => {
            for fragment in fragments {
                match fragment {
                    RawFragment::Text(text) => builder.push_str(text),
                    RawFragment::Expr(expr) => compile_expr(expr, builder)?,
                    RawFragment::Param(value) => builder.push_param(value.clone()),
                }
            }
        }
        Expr::Alias(inner, name) => {
            compile_expr(inner, builder)?;
            builder.push_str(" AS ");
            builder.push_identifier(name);
        }
        Expr::Cast(inner, type_name) => {
            compile_with_parent(inner, Some(0), builder)?;
            builder.push_str("::");
            builder.push_str(type_name);
        }
        Expr::Over {
            call,
            partition,
            order,
        } => {
            compile_expr(call, builder)?;
            builder.push_str(" OVER (");
            if !partition.is_empty() {
                builder.push_str("PARTITION BY ");
                builder.push_iter(partition.iter(), ", ", |b, e| {
                    let _ = compile_expr(e, b);
                });
            }
            if !order.is_empty() {
                if !partition.is_empty() {
                    builder.push_space();
                }
                builder.push_str("ORDER BY ");
                builder.push_iter(order.iter(), ", ", |b, (e, dir)| {
                    let _ = compile_expr(e, b);
                    b.push_str(if *dir == OrderDirection::Asc { " ASC" } else { " DESC" });
                });
            }
            builder.push(')');
        }
        Expr::Path(segments) => {
            return Err(EntityError::Compile(format!(
                "unresolved path '{}' reached the SQL compiler",
                segments.join(".")
            )));
        }
    }
    Ok(())
}

fn compile_const(value: &ento_core::Value, builder: &mut SqlBuilder) {
    use ento_core::Value;
    match value {
        Value::Null => builder.push_str("NULL"),
        Value::Bool(true) => builder.push_str("TRUE"),
        Value::Bool(false) => builder.push_str("FALSE"),
        other => builder.push_param(other.clone()),
    }
}
