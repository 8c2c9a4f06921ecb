use crate::size::SizeSpec;
use crate::value::Value;

/// Bit width of an `Int` field; also used to pick the `SERIAL` variant for
/// an `AutoIncrement`-extended field without an explicit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntBits {
    B16,
    B32,
    B64,
}

/// Byte width of a `Float` field (`size ∈ {4, 8}` per the field spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatBits {
    F4,
    F8,
}

/// The closed set of field implementations. Each carries enough static
/// metadata to derive a SQL type name, a default PostgreSQL representation,
/// and the coercions between [`Value`] and that representation. The enum
/// itself is the "stable type identity" `sync` diffs on: two `FieldImpl`
/// values are `==` iff they'd produce the same column type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldImpl {
    String,
    Bytes,
    Bool,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    TimeTz,
    Int(IntBits),
    Serial(IntBits),
    Float(FloatBits),
    Numeric,
    Uuid,
    /// `Json<T>`: `T` is the name of a nested (non-table-owning) entity, or
    /// `None` for an opaque `serde_json::Value`.
    Json(Option<String>),
    JsonArray(Option<String>),
    /// `Composite<T>`: `T` names a nested entity that *does* own a
    /// PostgreSQL composite type (unlike `Json<T>`).
    Composite(String),
    Array(Box<FieldImpl>),
    /// `Choice<EnumT>`: stored as the underlying key type with an FK to a
    /// lookup table named after `EnumT`.
    Choice {
        enum_name: String,
        key: Box<FieldImpl>,
    },
    Point,
    /// Placeholder used during collection before a concrete impl is
    /// inferred from the declared Rust type; never reaches `sync` or the
    /// compiler unchanged.
    AutoImpl,
}

impl FieldImpl {
    /// The PostgreSQL type name this field renders as, honoring `size` the
    /// way `String`/`Numeric` do.
    pub fn sql_type_name(&self, size: SizeSpec) -> String {
        match self {
            FieldImpl::String => match (size.min, size.max) {
                (Some(min), Some(max)) if min == max => format!("CHAR({max})"),
                (_, Some(max)) => format!("VARCHAR({max})"),
                _ => "TEXT".to_string(),
            },
            FieldImpl::Bytes => "BYTEA".to_string(),
            FieldImpl::Bool => "BOOLEAN".to_string(),
            FieldImpl::Date => "DATE".to_string(),
            FieldImpl::DateTime => "TIMESTAMP".to_string(),
            FieldImpl::DateTimeTz => "TIMESTAMPTZ".to_string(),
            FieldImpl::Time => "TIME".to_string(),
            FieldImpl::TimeTz => "TIMETZ".to_string(),
            FieldImpl::Int(bits) | FieldImpl::Serial(bits) => match bits {
                IntBits::B16 => "INT2".to_string(),
                IntBits::B32 => "INT4".to_string(),
                IntBits::B64 => "INT8".to_string(),
            },
            FieldImpl::Float(bits) => match bits {
                FloatBits::F4 => "FLOAT4".to_string(),
                FloatBits::F8 => "FLOAT8".to_string(),
            },
            FieldImpl::Numeric => match (size.min, size.max) {
                (Some(precision), Some(scale)) => format!("NUMERIC({precision}, {scale})"),
                _ => "NUMERIC".to_string(),
            },
            FieldImpl::Uuid => "UUID".to_string(),
            FieldImpl::Json(_) | FieldImpl::JsonArray(_) => "JSONB".to_string(),
            FieldImpl::Composite(name) => format!("\"{name}\""),
            FieldImpl::Array(item) => format!("{}[]", item.sql_type_name(SizeSpec::NONE)),
            FieldImpl::Choice { key, .. } => key.sql_type_name(SizeSpec::NONE),
            FieldImpl::Point => "POINT".to_string(),
            FieldImpl::AutoImpl => unreachable!("AutoImpl must be resolved before DDL emission"),
        }
    }

    /// Whether a bare `Serial`/`AutoIncrement` default should be rendered as
    /// the `SMALLSERIAL`/`SERIAL`/`BIGSERIAL` keyword instead of a separate
    /// `DEFAULT nextval(...)` clause (used only when the sequence is owned,
    /// i.e. not shared and not named explicitly).
    pub fn is_serial(&self) -> bool {
        matches!(self, FieldImpl::Serial(_))
    }

    /// The equality used for dirty detection: does `a` and `b`, both already
    /// decoded into [`Value`], represent the same logical value for this
    /// implementation. Most impls defer to `Value`'s own `PartialEq`;
    /// `Json`/`Composite` compare structurally regardless of key order,
    /// matching how `serde_json::Value` already compares.
    pub fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match self {
            FieldImpl::Composite(_) => match (a, b) {
                (Value::Composite(a), Value::Composite(b)) => a == b,
                _ => a == b,
            },
            _ => a == b,
        }
    }

    /// Whether this implementation ever reaches a table's `CREATE TABLE`
    /// column list, as opposed to only informing a nested composite type.
    pub fn is_storable_column(&self) -> bool {
        true
    }
}
