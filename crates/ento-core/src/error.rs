/// Errors raised by the core metamodel, expression, and compiler layers.
///
/// These are build-time/compile-time errors: they are raised while declaring
/// entities, compiling expressions, or diffing schemas, never while a
/// database operation is in flight (those surface as [`EntityError::Database`]
/// instead, wrapping whatever the connection returned).
#[derive(thiserror::Error, Debug)]
pub enum EntityError {
    /// Unknown entity or field name in a forward reference, conflicting
    /// `polymorph_id`, or an ambiguous relation that cannot be disambiguated.
    #[error("schema error: {0}")]
    Schema(String),

    /// Writing an unknown attribute to an instance, reading a field that
    /// would require suspended I/O, or mutating `EntityState` internals
    /// directly.
    #[error("state error: {0}")]
    State(String),

    /// An expression references a field whose owning entity has no alias in
    /// the current query and cannot be auto-joined.
    #[error("compile error: {0}")]
    Compile(String),

    /// Reflection found a database object whose shape cannot be expressed in
    /// the metamodel.
    #[error("diff error: {0}")]
    Diff(String),

    /// A constraint violation or other data-plane error surfaced unchanged
    /// from the external connection.
    #[error("constraint error: {0}")]
    Constraint(String),

    /// `select(q).one()` expected exactly one row but found none.
    #[error("expected exactly one row, found none")]
    MissingRow,

    /// `select(q).one()` expected exactly one row but found more than one.
    #[error("expected exactly one row, found {0}")]
    MultipleRows(usize),

    /// Wraps whatever the external [`Connection`](crate::Connection) surfaced.
    #[error("database error: {0}")]
    Database(String),
}

pub type EntityResult<T> = Result<T, EntityError>;
