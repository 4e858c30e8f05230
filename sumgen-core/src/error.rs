//! Error types for sumgen runtime operations.

use std::fmt;
use thiserror::Error;

/// Position of a payload slot inside a variant or record, used to locate
/// decode and encode failures.
///
/// Locations compose: an element of a sequence field is an [`Element`] of
/// that field, and a failure inside a referenced definition is [`Nested`]
/// under the slot that holds it.
///
/// [`Element`]: FieldLocation::Element
/// [`Nested`]: FieldLocation::Nested
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldLocation {
    /// The payload as a whole (e.g. a tuple payload that is not an array).
    Payload,
    /// Positional field of a NewType or Tuple payload.
    Index(usize),
    /// Named field of a Struct payload.
    Name(String),
    /// Element of a sequence slot.
    Element {
        /// The sequence slot.
        field: Box<FieldLocation>,
        /// Element index.
        index: usize,
    },
    /// Value of a mapping slot.
    Entry {
        /// The mapping slot.
        field: Box<FieldLocation>,
        /// Entry key.
        key: String,
    },
    /// Location inside the referenced definition held by `field`.
    Nested {
        /// Slot holding the referenced value.
        field: Box<FieldLocation>,
        /// Location within the referenced value.
        inner: Box<FieldLocation>,
    },
}

impl FieldLocation {
    /// Creates a named field location.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Location of element `index` of this sequence slot.
    #[must_use]
    pub fn element(&self, index: usize) -> Self {
        Self::Element {
            field: Box::new(self.clone()),
            index,
        }
    }

    /// Location of the value under `key` in this mapping slot.
    #[must_use]
    pub fn entry(&self, key: impl Into<String>) -> Self {
        Self::Entry {
            field: Box::new(self.clone()),
            key: key.into(),
        }
    }

    /// Location `inner` inside the value held by this slot.
    #[must_use]
    pub fn nested(self, inner: FieldLocation) -> Self {
        Self::Nested {
            field: Box::new(self),
            inner: Box::new(inner),
        }
    }
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload => f.write_str("payload"),
            Self::Index(index) => write!(f, "field {}", index),
            Self::Name(name) => write!(f, "field '{}'", name),
            Self::Element { field, index } => write!(f, "{}[{}]", field, index),
            Self::Entry { field, key } => write!(f, "{}[{:?}]", field, key),
            Self::Nested { field, inner } => write!(f, "{} > {}", field, inner),
        }
    }
}

/// JSON kind a payload slot was expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expected {
    /// A JSON string.
    String,
    /// An integral JSON number fitting a signed integer of `bits` width.
    Signed {
        /// Integer width in bits.
        bits: u8,
    },
    /// An integral JSON number fitting an unsigned integer of `bits` width.
    Unsigned {
        /// Integer width in bits.
        bits: u8,
    },
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
    /// JSON `null`.
    Null,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Signed { bits } => write!(f, "i{}", bits),
            Self::Unsigned { bits } => write!(f, "u{}", bits),
            Self::Boolean => f.write_str("bool"),
            Self::Array => f.write_str("array"),
            Self::Object => f.write_str("object"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Error produced when decoding an externally tagged JSON value.
///
/// A decode either yields a complete value or exactly one of these; no
/// partially decoded value is ever exposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A bare string did not name any unit variant.
    #[error("unknown unit variant tag '{0}'")]
    UnknownUnitTag(String),

    /// The value is neither a bare string nor a single-key tagged object.
    #[error("unrecognized shape: expected a tag string or a single-key object")]
    UnrecognizedShape,

    /// A single-key object whose key names no declared variant.
    #[error("unknown variant tag '{0}'")]
    UnknownVariantTag(String),

    /// A tuple payload held the wrong number of elements.
    #[error("arity mismatch: expected {expected} elements, got {actual}")]
    ArityMismatch {
        /// Declared field count.
        expected: usize,
        /// Elements present on the wire.
        actual: usize,
    },

    /// A struct payload lacked a declared field.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A payload slot held a value of the wrong JSON kind or range.
    #[error("type mismatch at {field}: expected {expected}")]
    TypeMismatch {
        /// Offending slot.
        field: FieldLocation,
        /// Kind the slot is declared as.
        expected: Expected,
    },
}

impl DecodeError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(field: FieldLocation, expected: Expected) -> Self {
        Self::TypeMismatch { field, expected }
    }

    /// Re-anchors an error raised while decoding a referenced definition
    /// under the slot `at` that holds it. Only `TypeMismatch` carries a
    /// location; every other kind passes through unchanged.
    #[must_use]
    pub fn within(self, at: FieldLocation) -> Self {
        match self {
            Self::TypeMismatch { field, expected } => Self::TypeMismatch {
                field: at.nested(field),
                expected,
            },
            other => other,
        }
    }
}

/// Error produced when an ill-formed dynamic value is handed to an encoder.
///
/// Encoding a value that agrees with its schema never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The type name is not defined in the schema.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// The value's tag names no declared variant.
    #[error("unknown variant '{tag}' for enum '{enum_name}'")]
    UnknownVariant {
        /// Enum being encoded.
        enum_name: String,
        /// Offending tag.
        tag: String,
    },

    /// The payload shape disagrees with the declared shape.
    #[error("shape mismatch for '{name}': expected {expected} payload")]
    ShapeMismatch {
        /// Variant tag or struct name.
        name: String,
        /// Declared shape.
        expected: &'static str,
    },

    /// A tuple payload held the wrong number of elements.
    #[error("arity mismatch: expected {expected} elements, got {actual}")]
    ArityMismatch {
        /// Declared field count.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },

    /// A struct payload lacked a declared field.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// A payload slot held a value of the wrong kind or range.
    #[error("type mismatch at {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Offending slot.
        field: FieldLocation,
        /// Declared type, rendered.
        expected: String,
        /// Kind of the supplied value.
        actual: &'static str,
    },
}

/// Error produced by dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError<E> {
    /// The value's discriminant matches no declared variant. Only reachable
    /// through malformed construction, never through decode.
    #[error("unsupported variant '{0}'")]
    UnsupportedVariant(String),

    /// The invoked handler reported an error.
    #[error("handler error: {0}")]
    Handler(E),
}

impl<E> MatchError<E> {
    /// Returns the handler error, if this is one.
    pub fn into_handler_error(self) -> Option<E> {
        match self {
            Self::Handler(error) => Some(error),
            Self::UnsupportedVariant(_) => None,
        }
    }
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::ArityMismatch {
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "arity mismatch: expected 2 elements, got 1");

        let err = DecodeError::type_mismatch(FieldLocation::Index(1), Expected::Signed { bits: 64 });
        assert_eq!(err.to_string(), "type mismatch at field 1: expected i64");

        let err = DecodeError::type_mismatch(FieldLocation::name("vfield"), Expected::String);
        assert_eq!(err.to_string(), "type mismatch at field 'vfield': expected string");
    }

    #[test]
    fn test_composed_locations() {
        let items = FieldLocation::name("items");
        assert_eq!(items.element(2).to_string(), "field 'items'[2]");
        assert_eq!(
            FieldLocation::name("counts").entry("a").to_string(),
            "field 'counts'[\"a\"]"
        );

        let err = DecodeError::type_mismatch(FieldLocation::Index(0), Expected::Signed { bits: 8 })
            .within(items.element(0));
        assert_eq!(
            err,
            DecodeError::type_mismatch(
                items.element(0).nested(FieldLocation::Index(0)),
                Expected::Signed { bits: 8 }
            )
        );
        assert_eq!(
            err.to_string(),
            "type mismatch at field 'items'[0] > field 0: expected i8"
        );
    }

    #[test]
    fn test_within_keeps_unlocated_errors() {
        let err = DecodeError::MissingField("vfield".to_string());
        assert_eq!(err.clone().within(FieldLocation::Index(0)), err);
    }

    #[test]
    fn test_encode_error_reports_actual_kind() {
        let err = EncodeError::TypeMismatch {
            field: FieldLocation::Index(0),
            expected: "string".to_string(),
            actual: "bool",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch at field 0: expected string, got bool"
        );
    }

    #[test]
    fn test_match_error_into_handler_error() {
        let err: MatchError<&str> = MatchError::Handler("boom");
        assert_eq!(err.into_handler_error(), Some("boom"));

        let err: MatchError<&str> = MatchError::UnsupportedVariant("VBogus".to_string());
        assert_eq!(err.into_handler_error(), None);
    }
}
