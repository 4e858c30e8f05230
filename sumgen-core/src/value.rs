//! Dynamic value model for sum types.
//!
//! These types let the codec interpreter and the runtime dispatcher work on
//! any schema without generated code. A [`VariantValue`] is one arm of a sum
//! type: its wire tag plus a [`Payload`] whose shape mirrors the variant's
//! declared shape.

use std::collections::BTreeMap;

/// A value held by a payload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// UTF-8 string.
    String(String),
    /// Signed integer (narrower widths are range-checked against the schema).
    Signed(i64),
    /// Unsigned integer (narrower widths are range-checked against the schema).
    Unsigned(u64),
    /// Boolean.
    Bool(bool),
    /// Value of a referenced sum type.
    Variant(VariantValue),
    /// Value of a referenced struct definition.
    Record(Payload),
    /// Sequence of values of one type.
    Seq(Vec<Value>),
    /// Mapping from string keys to values of one type.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the value's kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Signed(_) => "signed",
            Self::Unsigned(_) => "unsigned",
            Self::Bool(_) => "bool",
            Self::Variant(_) => "variant",
            Self::Record(_) => "record",
            Self::Seq(_) => "seq",
            Self::Map(_) => "map",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Signed(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<VariantValue> for Value {
    fn from(value: VariantValue) -> Self {
        Self::Variant(value)
    }
}

/// Payload of a variant or struct, shaped like its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// No fields.
    Unit,
    /// Exactly one unnamed field.
    NewType(Box<Value>),
    /// Two or more unnamed fields, in declaration order.
    Tuple(Vec<Value>),
    /// Named fields. Key order carries no meaning.
    Struct(BTreeMap<String, Value>),
}

impl Payload {
    /// Name of the payload's shape.
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::NewType(_) => "newtype",
            Self::Tuple(_) => "tuple",
            Self::Struct(_) => "struct",
        }
    }
}

/// One arm of a sum type: the wire tag of the variant and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantValue {
    /// Wire-level discriminant.
    pub tag: String,
    /// Variant payload.
    pub payload: Payload,
}

impl VariantValue {
    /// Creates a unit variant value.
    pub fn unit(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: Payload::Unit,
        }
    }

    /// Creates a newtype variant value.
    pub fn new_type(tag: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            tag: tag.into(),
            payload: Payload::NewType(Box::new(value.into())),
        }
    }

    /// Creates a tuple variant value.
    pub fn tuple(tag: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            tag: tag.into(),
            payload: Payload::Tuple(values),
        }
    }

    /// Creates a struct variant value from `(name, value)` pairs.
    pub fn record<K, I>(tag: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            tag: tag.into(),
            payload: Payload::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let unit = VariantValue::unit("VUnit");
        assert_eq!(unit.tag, "VUnit");
        assert_eq!(unit.payload, Payload::Unit);

        let new_type = VariantValue::new_type("VStr", "hello");
        assert_eq!(
            new_type.payload,
            Payload::NewType(Box::new(Value::String("hello".to_string())))
        );

        let tuple = VariantValue::tuple("VTuple", vec!["text".into(), 120i64.into()]);
        assert_eq!(tuple.payload.shape_name(), "tuple");
    }

    #[test]
    fn test_record_field_order_is_irrelevant() {
        let a = VariantValue::record("V", [("a", Value::Bool(true)), ("b", Value::Signed(1))]);
        let b = VariantValue::record("V", [("b", Value::Signed(1)), ("a", Value::Bool(true))]);
        assert_eq!(a, b);
    }
}
