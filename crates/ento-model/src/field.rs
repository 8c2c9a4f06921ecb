use std::fmt;
use std::sync::Arc;

use ento_core::{FieldImpl, SizeSpec, Value};
use ento_expr::Expr;

use crate::extension::Extension;

/// A field's `default`: a literal, a callable producing a literal at insert
/// time, or a server-side SQL fragment emitted into DDL as `DEFAULT <expr>`.
#[derive(Clone)]
pub enum FieldDefault {
    Literal(Value),
    Callable(Arc<dyn Fn() -> Value + Send + Sync>),
    Server(Expr),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            FieldDefault::Callable(_) => f.write_str("Callable(..)"),
            FieldDefault::Server(e) => f.debug_tuple("Server").field(e).finish(),
        }
    }
}

impl PartialEq for FieldDefault {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldDefault::Literal(a), FieldDefault::Literal(b)) => a == b,
            (FieldDefault::Server(a), FieldDefault::Server(b)) => a == b,
            // Callables have no meaningful equality; two callable defaults
            // are only ever considered unchanged by identity, which sync's
            // diff pass conservatively treats as "always changed".
            _ => false,
        }
    }
}

/// A storable column (§3). Carries its implementation, size semantics,
/// nullability, default, and extensions; `_index_`/`_key_` are assigned by
/// the entity builder during the collection phase (§4.3).
#[derive(Debug, Clone)]
pub struct Field {
    pub key: String,
    pub column_name: String,
    pub index: usize,
    pub implementation: FieldImpl,
    pub size: SizeSpec,
    pub nullable: bool,
    pub default: Option<FieldDefault>,
    pub extensions: Vec<Extension>,
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.column_name == other.column_name
            && self.implementation == other.implementation
            && self.size == other.size
            && self.nullable == other.nullable
            && self.default == other.default
            && self.extensions == other.extensions
    }
}

impl Field {
    /// A field is nullable by default unless it carries `PrimaryKey` or is
    /// explicitly marked not-null (§3).
    pub fn new(key: impl Into<String>, implementation: FieldImpl) -> Self {
        let key = key.into();
        Field {
            column_name: key.clone(),
            key,
            index: 0,
            implementation,
            size: SizeSpec::NONE,
            nullable: true,
            default: None,
            extensions: Vec::new(),
        }
    }

    pub fn with_column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = name.into();
        self
    }

    pub fn with_size(mut self, size: SizeSpec) -> Self {
        self.size = size;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        if extension.is_primary_key() {
            self.nullable = false;
        }
        self.extensions.push(extension);
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.extensions.iter().any(Extension::is_primary_key)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Extension> {
        self.extensions
            .iter()
            .filter(|e| matches!(e, Extension::ForeignKey { .. } | Extension::ForeignKeyList { .. }))
    }

    pub fn sql_type_name(&self) -> String {
        self.implementation.sql_type_name(self.size)
    }
}
