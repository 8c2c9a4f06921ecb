use ento_expr::{ColumnRef, EntityRef, Expr};

/// How a relation's join condition is determined.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinSpec {
    /// The foreign key lives on *this* entity, in the named sibling field
    /// (the `One` case: `self.<field> = remote.<remote_pk>`).
    SelfForeignKey(String),
    /// The foreign key lives on the *remote* entity, in the named field
    /// (the `Many` case: `self.<self_pk> = remote.<field>`).
    RemoteForeignKey(String),
    /// An explicit join expression, overriding FK-based synthesis.
    Explicit(Expr),
}

impl JoinSpec {
    /// Synthesize the join expression for this relation, given the resolved
    /// entity refs (with aliases already assigned by the query compiler)
    /// and the primary key field name on whichever side doesn't own the FK.
    pub fn synthesize(&self, self_ref: &EntityRef, remote_ref: &EntityRef, pk_field: &str) -> Expr {
        match self {
            JoinSpec::SelfForeignKey(field) => Expr::Column(ColumnRef::new(
                self_ref.clone(),
                field.clone(),
            ))
            .eq(Expr::Column(ColumnRef::new(remote_ref.clone(), pk_field))),
            JoinSpec::RemoteForeignKey(field) => Expr::Column(ColumnRef::new(
                self_ref.clone(),
                pk_field.to_string(),
            ))
            .eq(Expr::Column(ColumnRef::new(remote_ref.clone(), field.clone()))),
            JoinSpec::Explicit(expr) => expr.clone(),
        }
    }
}

/// Eagerness of a relation. `Always` relations are injected into a query's
/// load set even when not named in `load(...)` (§4.2, Glossary: "Loading
/// always").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    Lazy,
    Eager,
    Always,
}

/// A relation variant (§3). Relations never own a storable column
/// themselves (that's always a sibling [`Field`](crate::Field)); they
/// describe how to reach the related rows.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    /// A single remote entity reached by a join expression.
    One {
        remote_entity: String,
        join: JoinSpec,
        loading: Loading,
    },
    /// Zero-or-more remote entities where the foreign key lives on the
    /// remote entity.
    Many {
        remote_entity: String,
        join: JoinSpec,
        loading: Loading,
    },
    /// Zero-or-more remote entities reached through an intermediate link
    /// entity; carries two join expressions (self↔link, link↔remote).
    ManyAcross {
        link_entity: String,
        remote_entity: String,
        self_link_join: JoinSpec,
        link_remote_join: JoinSpec,
        loading: Loading,
    },
}

impl RelationKind {
    pub fn remote_entity(&self) -> &str {
        match self {
            RelationKind::One { remote_entity, .. } => remote_entity,
            RelationKind::Many { remote_entity, .. } => remote_entity,
            RelationKind::ManyAcross { remote_entity, .. } => remote_entity,
        }
    }

    pub fn loading(&self) -> Loading {
        match self {
            RelationKind::One { loading, .. } => *loading,
            RelationKind::Many { loading, .. } => *loading,
            RelationKind::ManyAcross { loading, .. } => *loading,
        }
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, RelationKind::Many { .. } | RelationKind::ManyAcross { .. })
    }

    /// The link (across) entity, if this is a `ManyAcross` relation.
    pub fn link_entity(&self) -> Option<&str> {
        match self {
            RelationKind::ManyAcross { link_entity, .. } => Some(link_entity),
            _ => None,
        }
    }
}

/// A relation attribute on an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub key: String,
    pub index: usize,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(key: impl Into<String>, kind: RelationKind) -> Self {
        Relation {
            key: key.into(),
            index: 0,
            kind,
        }
    }

    pub fn is_always_loaded(&self) -> bool {
        self.kind.loading() == Loading::Always
    }
}
