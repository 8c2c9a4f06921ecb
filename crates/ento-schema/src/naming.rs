//! Deterministic constraint/index/trigger names (§6 "External interfaces").
//! An auto-generated name is derived entirely from the table and column
//! names it covers so that re-running the DDL compiler against an unchanged
//! registry always proposes the same name `sync`'s diff can match against.

use md5::{Digest, Md5};

fn joined(columns: &[String]) -> String {
    columns.join("_")
}

/// `"schema"."name"` if a schema is set, else a bare `"name"`.
pub fn qualify(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("\"{schema}\".\"{name}\""),
        None => format!("\"{name}\""),
    }
}

/// `fk_<Self>__<col1>_<col2>-<Ref>__<refcol1>_<refcol2>` (§6).
pub fn foreign_key_name(self_table: &str, columns: &[String], ref_table: &str, ref_columns: &[String]) -> String {
    format!(
        "fk_{self_table}__{}-{ref_table}__{}",
        joined(columns),
        joined(ref_columns)
    )
}

/// `idx_<Table>__<col1>_<col2>`, the auto index created on every
/// foreign-key column (and on every `Index`-extended field lacking an
/// explicit name).
pub fn index_name(table: &str, columns: &[String]) -> String {
    format!("idx_{table}__{}", joined(columns))
}

/// `unique_<Table>__<col1>_<col2>`.
pub fn unique_name(table: &str, columns: &[String]) -> String {
    format!("unique_{table}__{}", joined(columns))
}

/// `chk_<Table>__<col1>_<col2>`.
pub fn check_name(table: &str, columns: &[String]) -> String {
    format!("chk_{table}__{}", joined(columns))
}

pub fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// The JSON payload trailing a `CHECK` constraint as a `COMMENT ON
/// CONSTRAINT`, recording the field/expression-hash pairs that produced it
/// so `reflect` can tell an unchanged check from an edited one without
/// re-parsing SQL (§4.4 step 1, §6).
pub fn check_comment(fields_and_exprs: &[(&str, &str)]) -> String {
    let entries: Vec<String> = fields_and_exprs
        .iter()
        .map(|(field, expr)| format!("{{\"field\":\"{field}\",\"hash\":\"{}\"}}", md5_hex(expr)))
        .collect();
    format!("[{}]", entries.join(","))
}

/// A trigger's generated function is named `YT-<Table>-<trigger>-<whenHash>-<bodyHash>`
/// (§6): a change to either `when` or `body` changes the suffix, forcing
/// `sync` to drop and recreate both the function and the trigger rather than
/// leave a stale body behind under the old name.
pub fn trigger_function_name(table: &str, trigger_name: &str, when: Option<&str>, body: &str) -> String {
    let when_hash = &md5_hex(when.unwrap_or(""))[..6];
    let body_hash = &md5_hex(body)[..6];
    format!("YT-{table}-{trigger_name}-{when_hash}-{body_hash}")
}
