use std::fmt::{self, Display, Formatter};

/// An SQL statement, plus any statements that must run immediately before or
/// after it once the whole script is assembled. A `CREATE TABLE` carries its
/// per-column `CREATE INDEX` statements as `post_statements`; a `DROP TABLE`
/// carries the `ALTER TABLE ... DROP CONSTRAINT` statements removing its
/// inbound foreign keys as `pre_statements`, so the sync planner can flatten
/// a list of `SchemaStatement`s without hand-threading dependency order
/// itself.
#[derive(Debug, Default, Clone)]
pub struct SchemaStatement {
    pub statement: String,
    pub pre_statements: Vec<String>,
    pub post_statements: Vec<String>,
}

impl SchemaStatement {
    pub fn new(statement: impl Into<String>) -> Self {
        SchemaStatement {
            statement: statement.into(),
            ..Default::default()
        }
    }
}

impl Display for SchemaStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for stmt in &self.pre_statements {
            writeln!(f, "{stmt}")?;
        }
        writeln!(f, "{}", self.statement)?;
        for stmt in &self.post_statements {
            writeln!(f, "{stmt}")?;
        }
        Ok(())
    }
}
