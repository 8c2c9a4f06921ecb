//! Renders an [`Expr`] inline as literal SQL text, for the handful of
//! places DDL embeds an expression rather than binding it as a query
//! parameter: `CHECK (...)` bodies, trigger `WHEN` clauses, and column
//! server-side `DEFAULT` expressions. Unlike the query compiler's
//! [`compile_expr`](ento_query::compile_expr) (not a dependency of this
//! crate — DDL text has no params to thread through a builder), constants
//! render as literals and a single-segment `Path` renders as a bare column
//! reference within the table currently being defined.
use ento_core::Value;
use ento_expr::{BinaryOp, Expr, RawFragment, UnaryOp};

pub fn render_ddl_expr(expr: &Expr) -> String {
    render_with_parent(expr, None)
}

/// Renders a bare [`Value`] the way [`render_ddl_expr`] would render
/// `Expr::Const(value)`, for callers (column `DEFAULT`s) that only ever have
/// a value in hand, not a full expression.
pub fn render_ddl_literal(value: &Value) -> String {
    sql_literal(value)
}

fn render_with_parent(expr: &Expr, parent_precedence: Option<u8>) -> String {
    match expr {
        Expr::Const(value) => sql_literal(value),
        Expr::Column(column_ref) => format!("\"{}\"", column_ref.field),
        Expr::Path(segments) if segments.len() == 1 => format!("\"{}\"", segments[0]),
        Expr::Path(segments) => segments.iter().map(|s| format!("\"{s}\"")).collect::<Vec<_>>().join("."),
        Expr::Binary(op, lhs, rhs) => {
            let precedence = op.precedence();
            let needs_parens = parent_precedence.is_some_and(|p| precedence > p);
            let body = format!(
                "{} {} {}",
                render_with_parent(lhs, Some(precedence)),
                op.sql_symbol(),
                render_with_parent(rhs, Some(precedence))
            );
            if needs_parens { format!("({body})") } else { body }
        }
        Expr::Unary(op, inner) => {
            if *op == UnaryOp::Not {
                format!("NOT({})", render_ddl_expr(inner))
            } else {
                format!("{}{}", op.sql_symbol(), render_with_parent(inner, Some(0)))
            }
        }
        Expr::Call(name, args) => {
            let args = args.iter().map(render_ddl_expr).collect::<Vec<_>>().join(", ");
            format!("{name}({args})")
        }
        Expr::Raw(fragments) => fragments
            .iter()
            .map(|f| match f {
                RawFragment::Text(text) => text.clone(),
                RawFragment::Expr(expr) => render_ddl_expr(expr),
                RawFragment::Param(value) => sql_literal(value),
            })
            .collect(),
        Expr::Alias(inner, name) => format!("{} AS \"{name}\"", render_ddl_expr(inner)),
        Expr::Cast(inner, type_name) => format!("{}::{type_name}", render_with_parent(inner, Some(0))),
        Expr::Over { call, .. } => render_ddl_expr(call),
    }
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Numeric(s) => s.clone(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bytes(bytes) => format!("'\\x{}'", hex_encode(bytes)),
        Value::Uuid(u) => format!("'{u}'"),
        Value::Date(d) => format!("'{d}'"),
        Value::Time(t) => format!("'{t}'"),
        Value::TimeTz(t, tz) => format!("'{t}{tz}'"),
        Value::DateTime(dt) => format!("'{dt}'"),
        Value::DateTimeTz(dt) => format!("'{dt}'"),
        Value::Json(json) => format!("'{}'::jsonb", json.to_string().replace('\'', "''")),
        Value::Point(x, y) => format!("'({x}, {y})'"),
        Value::Array(items) => format!("ARRAY[{}]", items.iter().map(sql_literal).collect::<Vec<_>>().join(", ")),
        Value::Composite(fields) => format!(
            "ROW({})",
            fields.values().map(sql_literal).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
