use ento_expr::Expr;

/// `ON UPDATE`/`ON DELETE` action for a foreign key. Defaults to `Restrict`
/// on both sides (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

impl Default for ReferentialAction {
    fn default() -> Self {
        ReferentialAction::Restrict
    }
}

impl ReferentialAction {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMethod {
    Btree,
    Hash,
    Gin,
    Gist,
}

impl IndexMethod {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            IndexMethod::Btree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gin => "gin",
            IndexMethod::Gist => "gist",
        }
    }
}

/// A reference target for `ForeignKey`/`ForeignKeyList`: the entity and
/// field a column points to. May start out as a string-form forward
/// reference (`"Other.id"`) and is resolved lazily against the registry at
/// first compile (§9 Design Notes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
    pub entity: String,
    pub field: String,
}

impl RefTarget {
    pub fn new(entity: impl Into<String>, field: impl Into<String>) -> Self {
        RefTarget {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Parse the `"Entity.field"` string form.
    pub fn parse(reference: &str) -> Option<RefTarget> {
        let (entity, field) = reference.split_once('.')?;
        Some(RefTarget::new(entity, field))
    }
}

/// The closed set of field extensions (§3). Extensions may be grouped by
/// name: two fields on the same entity sharing an extension's `name`/`group`
/// produce a single composite constraint (composite FK, composite UNIQUE,
/// multi-expression CHECK) instead of one per field.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    PrimaryKey,
    AutoIncrement {
        sequence: Option<String>,
    },
    ForeignKey {
        reference: RefTarget,
        on_update: ReferentialAction,
        on_delete: ReferentialAction,
        group: Option<String>,
        name: Option<String>,
    },
    ForeignKeyList {
        reference: RefTarget,
        on_update: ReferentialAction,
        on_delete: ReferentialAction,
    },
    Unique {
        name: Option<String>,
    },
    Index {
        name: Option<String>,
        method: Option<IndexMethod>,
        unique: bool,
        collate: Option<String>,
    },
    Check {
        expr: Expr,
        name: Option<String>,
    },
}

impl Extension {
    pub fn is_primary_key(&self) -> bool {
        matches!(self, Extension::PrimaryKey)
    }

    pub fn group_key(&self) -> Option<&str> {
        match self {
            Extension::ForeignKey { group, .. } => group.as_deref(),
            Extension::Unique { name } | Extension::Index { name, .. } => name.as_deref(),
            Extension::Check { name, .. } => name.as_deref(),
            _ => None,
        }
    }
}
