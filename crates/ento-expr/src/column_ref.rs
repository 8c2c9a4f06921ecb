/// A reference to an entity as it appears in a compiled query: its
/// qualified name plus the alias it was given in the current `FROM`/`JOIN`
/// list (`t0`, `t1`, …, or a user-supplied alias from `E.alias("name")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl EntityRef {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        EntityRef {
            schema,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The identifier a compiled column is rendered with: the alias if one
    /// was assigned, otherwise the bare table name.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A column reference: `entity.field`, qualified by the owning entity's
/// alias at compile time (§4.1). Constructed unqualified by field accessors
/// and stamped with whatever alias the query compiler assigned to `entity`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub entity: EntityRef,
    pub field: String,
}

impl ColumnRef {
    pub fn new(entity: EntityRef, field: impl Into<String>) -> Self {
        ColumnRef {
            entity,
            field: field.into(),
        }
    }
}
