use ento_core::Value;

use crate::column_ref::ColumnRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    In,
    NotIn,
    Is,
    IsNot,
    ILike,
    NotILike,
}

impl BinaryOp {
    /// Lower binds tighter. Used by the compiler to decide parenthesization:
    /// a child is parenthesized iff its precedence is strictly lower (i.e.
    /// numerically greater) than its parent's.
    pub fn precedence(&self) -> u8 {
        use BinaryOp::*;
        match self {
            Or => 6,
            And => 5,
            Eq | Neq | Lt | Lte | Gt | Gte | In | NotIn | Is | IsNot | ILike | NotILike => 4,
            Add | Sub => 3,
            Mul | Div | Mod => 2,
            ShiftLeft | ShiftRight => 1,
            Pow => 0,
        }
    }

    pub fn sql_symbol(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Eq => "=",
            Neq => "!=",
            Lt => "<",
            Lte => "<=",
            Gt => ">",
            Gte => ">=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            And => "AND",
            Or => "OR",
            In => "IN",
            NotIn => "NOT IN",
            Is => "IS",
            IsNot => "IS NOT",
            ILike => "ILIKE",
            NotILike => "NOT ILIKE",
        }
    }

    /// The canonical negation of this operator, per the inversion contract
    /// in §4.1. Operators with no canonical negation (arithmetic, shifts,
    /// `Pow`) return `None`, forcing the caller to fall back to `NOT(...)`.
    pub fn negate(&self) -> Option<BinaryOp> {
        use BinaryOp::*;
        Some(match self {
            Eq => Neq,
            Neq => Eq,
            Lt => Gte,
            Lte => Gt,
            Gt => Lte,
            Gte => Lt,
            In => NotIn,
            NotIn => In,
            Is => IsNot,
            IsNot => Is,
            ILike => NotILike,
            NotILike => ILike,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Abs,
}

impl UnaryOp {
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "NOT",
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Abs => "@",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// One interleaved fragment of a [`Expr::Raw`] trap door: either a literal
/// string, a nested expression, or a bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFragment {
    Text(String),
    Expr(Box<Expr>),
    Param(Value),
}

/// A node of the language-neutral expression algebra (§4.1). Every SQL
/// predicate, projection, ordering key, and grouping key the query builder
/// accepts is one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal. `NULL`/`TRUE`/`FALSE` render as SQL keywords; anything
    /// else becomes a positional `$n` parameter.
    Const(Value),
    /// A column reference, qualified by the owning entity's alias at
    /// compile time.
    Column(ColumnRef),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    /// A SQL function call, usually synthesized via the `func` namespace
    /// helper (e.g. `func::concat_ws(...)`).
    Call(String, Vec<Expr>),
    /// Dialect-specific trap door: interleaved string/expression/parameter
    /// fragments emitted verbatim.
    Raw(Vec<RawFragment>),
    /// `expr AS "name"`; also the reference key downstream load specs key
    /// projected columns by.
    Alias(Box<Expr>, String),
    Over {
        call: Box<Expr>,
        partition: Vec<Expr>,
        order: Vec<(Expr, OrderDirection)>,
    },
    Cast(Box<Expr>, String),
    /// An unresolved chain such as `entity.relation.relation.field` or
    /// `composite.subfield`. Resolved by the query compiler (auto-join for
    /// relation segments, `(col).sub` for composite, `jsonb_extract_path`
    /// for JSON) before it ever reaches a dialect compiler.
    Path(Vec<String>),
}

impl Expr {
    pub fn null() -> Expr {
        Expr::Const(Value::Null)
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// `AND`s two expressions, reducing away a `TRUE`/`FALSE` operand rather
    /// than emitting a no-op clause (so building up a query's predicate one
    /// `.filter()` call at a time never accumulates `TRUE AND ...`).
    pub fn and(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Const(Value::Bool(false)), _) | (_, Expr::Const(Value::Bool(false))) => {
                Expr::Const(Value::Bool(false))
            }
            (Expr::Const(Value::Bool(true)), rhs) => rhs,
            (lhs, Expr::Const(Value::Bool(true))) => lhs,
            (lhs, rhs) => Expr::binary(BinaryOp::And, lhs, rhs),
        }
    }

    /// `OR`s two expressions, with the mirror-image simplification of
    /// [`Expr::and`].
    pub fn or(self, rhs: Expr) -> Expr {
        match (self, rhs) {
            (Expr::Const(Value::Bool(true)), _) | (_, Expr::Const(Value::Bool(true))) => {
                Expr::Const(Value::Bool(true))
            }
            (Expr::Const(Value::Bool(false)), rhs) => rhs,
            (lhs, Expr::Const(Value::Bool(false))) => lhs,
            (lhs, rhs) => Expr::binary(BinaryOp::Or, lhs, rhs),
        }
    }

    pub fn eq(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Eq, self, rhs)
    }

    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias(Box::new(self), name.into())
    }

    pub fn cast(self, type_name: impl Into<String>) -> Expr {
        Expr::Cast(Box::new(self), type_name.into())
    }

    /// `a ILIKE '%' || b || '%'` — the `contains` string helper (§4.1).
    pub fn contains(self, needle: Expr) -> Expr {
        wrap_ilike(self, needle, true, true)
    }

    /// `a ILIKE b || '%'` — the `startswith` string helper.
    pub fn startswith(self, needle: Expr) -> Expr {
        wrap_ilike(self, needle, false, true)
    }

    /// `a ILIKE '%' || b` — the `endswith` string helper.
    pub fn endswith(self, needle: Expr) -> Expr {
        wrap_ilike(self, needle, true, false)
    }

    /// `POSITION(b IN a)` — the `find` string helper.
    pub fn find(self, needle: Expr) -> Expr {
        Expr::Call("POSITION".to_string(), vec![needle, self])
    }
}

fn wrap_ilike(haystack: Expr, needle: Expr, pad_left: bool, pad_right: bool) -> Expr {
    let mut parts = Vec::new();
    if pad_left {
        parts.push(Expr::Const(Value::Text("%".to_string())));
    }
    parts.push(needle);
    if pad_right {
        parts.push(Expr::Const(Value::Text("%".to_string())));
    }
    let concatenated = parts
        .into_iter()
        .reduce(|a, b| Expr::binary(BinaryOp::Add, a, b))
        .expect("at least one part");
    Expr::binary(BinaryOp::ILike, haystack, concatenated)
}

/// Inversion contract (§4.1): `~Binary(op, l, r)` rewrites to the canonical
/// negation when one exists, otherwise falls back to wrapping in `NOT(...)`.
/// `~~expr` always compiles to the same SQL as `expr` (the inversion-law
/// invariant in §8): negating twice either round-trips through the same
/// canonical-op table or double-wraps in `NOT(NOT(...))`, and the compiler
/// renders both identically.
impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        match self {
            Expr::Binary(op, l, r) => match op.negate() {
                Some(negated) => Expr::Binary(negated, l, r),
                None => Expr::Unary(UnaryOp::Not, Box::new(Expr::Binary(op, l, r))),
            },
            Expr::Unary(UnaryOp::Not, inner) => *inner,
            other => Expr::Unary(UnaryOp::Not, Box::new(other)),
        }
    }
}
