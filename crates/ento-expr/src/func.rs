//! `func::name(args)` synthesizes an [`Expr::Call`], mirroring the `func`
//! namespace helper from §4.1 (exposed in source as e.g.
//! `func.CONCAT_WS(...)`). Rust has no attribute-style namespacing, so this
//! is a handful of free functions plus a catch-all [`call`] for anything not
//! worth naming.

use crate::expr::Expr;

pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Call(name.into(), args)
}

pub fn concat_ws(separator: Expr, parts: Vec<Expr>) -> Expr {
    let mut args = vec![separator];
    args.extend(parts);
    call("CONCAT_WS", args)
}

pub fn coalesce(args: Vec<Expr>) -> Expr {
    call("COALESCE", args)
}

pub fn lower(arg: Expr) -> Expr {
    call("LOWER", vec![arg])
}

pub fn upper(arg: Expr) -> Expr {
    call("UPPER", vec![arg])
}

pub fn count(arg: Expr) -> Expr {
    call("COUNT", vec![arg])
}

pub fn now() -> Expr {
    call("NOW", vec![])
}
