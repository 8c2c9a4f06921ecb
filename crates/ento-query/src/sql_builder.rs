use ento_core::Value;

/// Accumulates SQL text and its positional parameters as a query is
/// compiled, mirroring the pattern of pushing fragments into a single
/// growable string rather than formatting each clause in isolation (so a
/// deeply nested `Expr` tree renders without intermediate allocations per
/// node). Aliases are resolved before compilation (every [`ColumnRef`]'s
/// [`EntityRef`] already carries whatever alias the query assigned it), so
/// this builder only needs to know how to quote identifiers and place
/// parameters.
pub struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
    /// Whether a bare column reference renders as `"table"."col"` (the
    /// default, used in `WHERE`/`SELECT` clauses) or just `"col"` (used
    /// inside `INSERT`/`UPDATE` column lists).
    qualify_columns: bool,
}

impl SqlBuilder {
    pub fn new() -> Self {
        SqlBuilder {
            sql: String::new(),
            params: Vec::new(),
            qualify_columns: true,
        }
    }

    pub fn push_str(&mut self, s: impl AsRef<str>) {
        self.sql.push_str(s.as_ref());
    }

    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    pub fn push_identifier(&mut self, s: impl AsRef<str>) {
        self.sql.push('"');
        self.sql.push_str(s.as_ref());
        self.sql.push('"');
    }

    /// Push a single-quoted SQL string literal (doubling embedded quotes),
    /// for the rare cases — `json_build_object` keys — where a literal
    /// belongs inline rather than behind a `$n` placeholder.
    pub fn push_string_literal(&mut self, s: impl AsRef<str>) {
        self.sql.push('\'');
        self.sql.push_str(&s.as_ref().replace('\'', "''"));
        self.sql.push('\'');
    }

    /// Render a `FROM`/`JOIN` table reference: its alias if one was
    /// assigned, otherwise its bare (possibly schema-qualified) name,
    /// followed by ` AS "alias"` when aliased so the rest of the query can
    /// address it under that name.
    pub fn push_table(&mut self, bare_name: &str, schema: Option<&str>, alias: Option<&str>) {
        if let Some(schema) = schema {
            self.push_identifier(schema);
            self.push('.');
        }
        self.push_identifier(bare_name);
        if let Some(alias) = alias {
            self.push_str(" AS ");
            self.push_identifier(alias);
        }
    }

    pub fn push_column(&mut self, display_name: &str, field: &str) {
        if self.qualify_columns {
            self.push_identifier(display_name);
            self.push('.');
        }
        self.push_identifier(field);
    }

    /// Push `value` as a `$n` placeholder and record it positionally.
    pub fn push_param(&mut self, value: Value) {
        self.params.push(value);
        self.push('$');
        self.push_str(self.params.len().to_string());
    }

    pub fn push_iter<T>(&mut self, iter: impl ExactSizeIterator<Item = T>, sep: &str, mut f: impl FnMut(&mut Self, T)) {
        let len = iter.len();
        for (i, item) in iter.enumerate() {
            f(self, item);
            if i + 1 < len {
                self.push_str(sep);
            }
        }
    }

    pub fn without_qualified_columns<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let prev = self.qualify_columns;
        self.qualify_columns = false;
        let result = f(self);
        self.qualify_columns = prev;
        result
    }

    pub fn into_sql(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        SqlBuilder::new()
    }
}
