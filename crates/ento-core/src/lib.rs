//! Static field-type metadata: the closed set of field implementations
//! (`String`, `Int`, `Json<T>`, …), their SQL type rendering, and the
//! in-memory [`Value`] representation that flows through the rest of the
//! system. This is the leaf layer every other `ento-*` crate builds on.

mod connection;
mod error;
mod field_impl;
mod size;
mod value;

pub use connection::{Connection, Row, Transaction};
pub use error::{EntityError, EntityResult};
pub use field_impl::{FieldImpl, FloatBits, IntBits};
pub use size::SizeSpec;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_size_forms() {
        assert_eq!(FieldImpl::String.sql_type_name(SizeSpec::NONE), "TEXT");
        assert_eq!(FieldImpl::String.sql_type_name(SizeSpec::max(50)), "VARCHAR(50)");
        assert_eq!(
            FieldImpl::String.sql_type_name(SizeSpec::range(5, 5)),
            "CHAR(5)"
        );
    }

    #[test]
    fn numeric_size_form() {
        assert_eq!(
            FieldImpl::Numeric.sql_type_name(SizeSpec::range(15, 2)),
            "NUMERIC(15, 2)"
        );
    }

    #[test]
    fn array_nests_item_impl() {
        let arr = FieldImpl::Array(Box::new(FieldImpl::Int(IntBits::B32)));
        assert_eq!(arr.sql_type_name(SizeSpec::NONE), "INT4[]");
    }

    #[test]
    fn choice_uses_key_type() {
        let choice = FieldImpl::Choice {
            enum_name: "Gender".to_string(),
            key: Box::new(FieldImpl::String),
        };
        assert_eq!(choice.sql_type_name(SizeSpec::NONE), "TEXT");
    }
}
