//! Externally tagged JSON wire helpers.
//!
//! Both the schema-driven interpreter and generated code decode through these
//! functions, so every implementation agrees on the wire format bit for bit:
//!
//! - unit variant: the bare tag string, `"VUnit"`
//! - newtype variant: `{ "VStr": <field> }`
//! - tuple variant: `{ "VTuple": [<field_0>, ..., <field_n>] }`
//! - struct variant: `{ "VStruct": { "<name>": <field>, ... } }`

use crate::error::{DecodeError, DecodeResult, Expected, FieldLocation};
use std::collections::BTreeMap;

pub use serde_json::{Map, Number, Value as Json};

/// Policy for tagged objects that carry keys besides the tag key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtraKeys {
    /// Any object that is not exactly `{ "<tag>": <payload> }` is rejected.
    #[default]
    Reject,
    /// Keys that name no declared variant are ignored, as long as exactly one
    /// key names a declared variant.
    Ignore,
}

/// Options controlling decode strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Handling of extra keys next to the tag key.
    pub extra_keys: ExtraKeys,
}

impl DecodeOptions {
    /// Creates strict decode options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            extra_keys: ExtraKeys::Reject,
        }
    }

    /// Sets the extra-keys policy.
    #[must_use]
    pub const fn extra_keys(mut self, extra_keys: ExtraKeys) -> Self {
        self.extra_keys = extra_keys;
        self
    }
}

/// Top-level form of an externally tagged value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tagged<'a> {
    /// A bare tag string (unit variant form).
    Bare(&'a str),
    /// A tag key with its payload.
    Wrapped(&'a str, &'a Json),
}

/// Splits an externally tagged value into its tag and payload.
///
/// `known_tags` is only consulted under [`ExtraKeys::Ignore`], to pick the
/// tag key out of a multi-key object.
///
/// # Errors
/// Returns [`DecodeError::UnrecognizedShape`] for values that are neither a
/// string nor an object resolving to exactly one tag key.
pub fn untag<'a>(
    value: &'a Json,
    extra_keys: ExtraKeys,
    known_tags: &[&str],
) -> DecodeResult<Tagged<'a>> {
    match value {
        Json::String(tag) => Ok(Tagged::Bare(tag)),
        Json::Object(map) => {
            if map.len() == 1 {
                return map
                    .iter()
                    .next()
                    .map(|(tag, payload)| Tagged::Wrapped(tag, payload))
                    .ok_or(DecodeError::UnrecognizedShape);
            }
            match extra_keys {
                ExtraKeys::Reject => Err(DecodeError::UnrecognizedShape),
                ExtraKeys::Ignore => {
                    let mut declared = map
                        .iter()
                        .filter(|(key, _)| known_tags.contains(&key.as_str()));
                    match (declared.next(), declared.next()) {
                        (Some((tag, payload)), None) => Ok(Tagged::Wrapped(tag, payload)),
                        _ => Err(DecodeError::UnrecognizedShape),
                    }
                }
            }
        }
        _ => Err(DecodeError::UnrecognizedShape),
    }
}

/// Wraps a payload under its tag: `{ "<tag>": payload }`.
#[must_use]
pub fn tagged(tag: &str, payload: Json) -> Json {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), payload);
    Json::Object(map)
}

/// Expects a tuple payload of exactly `len` elements.
///
/// # Errors
/// Returns `TypeMismatch` when the payload is not an array and
/// `ArityMismatch` when its length differs from `len`.
pub fn expect_array(value: &Json, len: usize) -> DecodeResult<&[Json]> {
    let items = value
        .as_array()
        .ok_or_else(|| DecodeError::type_mismatch(FieldLocation::Payload, Expected::Array))?;
    if items.len() != len {
        return Err(DecodeError::ArityMismatch {
            expected: len,
            actual: items.len(),
        });
    }
    Ok(items)
}

/// Expects a struct payload.
///
/// # Errors
/// Returns `TypeMismatch` when the payload is not an object.
pub fn expect_object(value: &Json) -> DecodeResult<&Map<String, Json>> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::type_mismatch(FieldLocation::Payload, Expected::Object))
}

/// Looks up a declared field of a struct payload.
///
/// # Errors
/// Returns `MissingField` when the key is absent.
pub fn field<'a>(object: &'a Map<String, Json>, name: &str) -> DecodeResult<&'a Json> {
    object
        .get(name)
        .ok_or_else(|| DecodeError::MissingField(name.to_string()))
}

/// Decodes a string slot.
///
/// # Errors
/// Returns `TypeMismatch` for non-string values.
pub fn decode_string(value: &Json, at: FieldLocation) -> DecodeResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DecodeError::type_mismatch(at, Expected::String))
}

/// Decodes a boolean slot.
///
/// # Errors
/// Returns `TypeMismatch` for non-boolean values.
pub fn decode_bool(value: &Json, at: FieldLocation) -> DecodeResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| DecodeError::type_mismatch(at, Expected::Boolean))
}

/// Decodes a unit struct slot, which is always `null` on the wire.
///
/// # Errors
/// Returns `TypeMismatch` for anything but `null`.
pub fn decode_null(value: &Json, at: FieldLocation) -> DecodeResult<()> {
    if value.is_null() {
        Ok(())
    } else {
        Err(DecodeError::type_mismatch(at, Expected::Null))
    }
}

/// Decodes an integer slot.
///
/// Accepts any JSON number without a fractional component (`120` and
/// `120.0` alike) that fits `T`.
///
/// # Errors
/// Returns `TypeMismatch` for non-numbers, fractional numbers and numbers
/// outside the range of `T`.
pub fn decode_int<T: WireInt>(value: &Json, at: FieldLocation) -> DecodeResult<T> {
    value
        .as_number()
        .and_then(T::from_number)
        .ok_or_else(|| DecodeError::type_mismatch(at, T::EXPECTED))
}

/// Decodes a sequence slot, decoding each element with `decode` at its
/// element location.
///
/// # Errors
/// Returns `TypeMismatch` for non-arrays and the first element error.
pub fn decode_seq<T, F>(value: &Json, at: FieldLocation, mut decode: F) -> DecodeResult<Vec<T>>
where
    F: FnMut(&Json, FieldLocation) -> DecodeResult<T>,
{
    let items = value
        .as_array()
        .ok_or_else(|| DecodeError::type_mismatch(at.clone(), Expected::Array))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode(item, at.element(index)))
        .collect()
}

/// Decodes a mapping slot, decoding each value with `decode` at its
/// entry location.
///
/// # Errors
/// Returns `TypeMismatch` for non-objects and the first value error.
pub fn decode_map<T, F>(
    value: &Json,
    at: FieldLocation,
    mut decode: F,
) -> DecodeResult<BTreeMap<String, T>>
where
    F: FnMut(&Json, FieldLocation) -> DecodeResult<T>,
{
    let entries = value
        .as_object()
        .ok_or_else(|| DecodeError::type_mismatch(at.clone(), Expected::Object))?;
    entries
        .iter()
        .map(|(key, item)| Ok((key.clone(), decode(item, at.entry(key.as_str()))?)))
        .collect()
}

/// Integer types with a JSON number representation.
pub trait WireInt: Copy + Sized {
    /// Kind reported when a slot of this type receives a bad value.
    const EXPECTED: Expected;

    /// Converts a JSON number, rejecting fractional and out-of-range values.
    fn from_number(number: &Number) -> Option<Self>;
}

/// Integral value recovered from a float-encoded JSON number.
enum Integral {
    Signed(i64),
    Unsigned(u64),
}

/// 2^63 and 2^64, the exclusive upper bounds of i64 and u64 as floats.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

fn integral(value: f64) -> Option<Integral> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if (-I64_BOUND..I64_BOUND).contains(&value) {
        Some(Integral::Signed(value as i64))
    } else if (0.0..U64_BOUND).contains(&value) {
        Some(Integral::Unsigned(value as u64))
    } else {
        None
    }
}

macro_rules! impl_wire_int {
    ($($ty:ty => $expected:expr),* $(,)?) => {
        $(
            impl WireInt for $ty {
                const EXPECTED: Expected = $expected;

                fn from_number(number: &Number) -> Option<Self> {
                    if let Some(value) = number.as_i64() {
                        return Self::try_from(value).ok();
                    }
                    if let Some(value) = number.as_u64() {
                        return Self::try_from(value).ok();
                    }
                    match integral(number.as_f64()?)? {
                        Integral::Signed(value) => Self::try_from(value).ok(),
                        Integral::Unsigned(value) => Self::try_from(value).ok(),
                    }
                }
            }
        )*
    };
}

impl_wire_int!(
    i8 => Expected::Signed { bits: 8 },
    i16 => Expected::Signed { bits: 16 },
    i32 => Expected::Signed { bits: 32 },
    i64 => Expected::Signed { bits: 64 },
    u8 => Expected::Unsigned { bits: 8 },
    u16 => Expected::Unsigned { bits: 16 },
    u32 => Expected::Unsigned { bits: 32 },
    u64 => Expected::Unsigned { bits: 64 },
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untag_bare_and_wrapped() {
        let bare = json!("VUnit");
        assert_eq!(
            untag(&bare, ExtraKeys::Reject, &[]).expect("bare"),
            Tagged::Bare("VUnit")
        );

        let wrapped = json!({"VStr": "text"});
        match untag(&wrapped, ExtraKeys::Reject, &[]).expect("wrapped") {
            Tagged::Wrapped(tag, payload) => {
                assert_eq!(tag, "VStr");
                assert_eq!(payload, &json!("text"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_untag_rejects_other_shapes() {
        for value in [json!({}), json!(1), json!(null), json!(["VUnit"]), json!(true)] {
            assert_eq!(
                untag(&value, ExtraKeys::Reject, &[]),
                Err(DecodeError::UnrecognizedShape)
            );
        }
    }

    #[test]
    fn test_untag_extra_keys_policy() {
        let value = json!({"VStr": "text", "extra": 1});
        assert_eq!(
            untag(&value, ExtraKeys::Reject, &["VStr"]),
            Err(DecodeError::UnrecognizedShape)
        );
        assert!(matches!(
            untag(&value, ExtraKeys::Ignore, &["VStr"]),
            Ok(Tagged::Wrapped("VStr", _))
        ));

        let ambiguous = json!({"VStr": "text", "VTuple": ["a", 1]});
        assert_eq!(
            untag(&ambiguous, ExtraKeys::Ignore, &["VStr", "VTuple"]),
            Err(DecodeError::UnrecognizedShape)
        );
    }

    #[test]
    fn test_tagged() {
        assert_eq!(tagged("VStr", json!("x")), json!({"VStr": "x"}));
    }

    #[test]
    fn test_expect_array_arity() {
        let value = json!(["text"]);
        assert_eq!(
            expect_array(&value, 2),
            Err(DecodeError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            expect_array(&json!("text"), 2),
            Err(DecodeError::type_mismatch(FieldLocation::Payload, Expected::Array))
        );
        assert_eq!(expect_array(&json!(["a", 1]), 2).map(<[Json]>::len), Ok(2));
    }

    #[test]
    fn test_field_missing() {
        let value = json!({"other": 1});
        let object = expect_object(&value).expect("object");
        assert_eq!(
            field(object, "vfield"),
            Err(DecodeError::MissingField("vfield".to_string()))
        );
    }

    #[test]
    fn test_decode_int_accepts_integral_numbers() {
        let at = FieldLocation::Index(1);
        assert_eq!(decode_int::<i64>(&json!(120), at.clone()), Ok(120));
        assert_eq!(decode_int::<i64>(&json!(120.0), at.clone()), Ok(120));
        assert_eq!(decode_int::<i8>(&json!(-128), at.clone()), Ok(-128));
        assert_eq!(decode_int::<u64>(&json!(u64::MAX), at.clone()), Ok(u64::MAX));
    }

    #[test]
    fn test_decode_int_rejects_fractional_and_out_of_range() {
        let at = FieldLocation::Index(1);
        assert_eq!(
            decode_int::<i64>(&json!(1.5), at.clone()),
            Err(DecodeError::type_mismatch(at.clone(), Expected::Signed { bits: 64 }))
        );
        assert_eq!(
            decode_int::<u8>(&json!(256), at.clone()),
            Err(DecodeError::type_mismatch(at.clone(), Expected::Unsigned { bits: 8 }))
        );
        assert_eq!(
            decode_int::<u32>(&json!(-1), at.clone()),
            Err(DecodeError::type_mismatch(at.clone(), Expected::Unsigned { bits: 32 }))
        );
        assert_eq!(
            decode_int::<i64>(&json!("120"), at.clone()),
            Err(DecodeError::type_mismatch(at, Expected::Signed { bits: 64 }))
        );
    }

    #[test]
    fn test_decode_seq_and_map() {
        let at = FieldLocation::name("items");
        let items = decode_seq(&json!(["a", "b"]), at.clone(), decode_string).expect("seq");
        assert_eq!(items, vec!["a".to_string(), "b".to_string()]);

        let err = decode_seq(&json!(["a", 1]), at.clone(), decode_string);
        assert_eq!(
            err,
            Err(DecodeError::type_mismatch(at.element(1), Expected::String))
        );

        let err = decode_map(&json!({"x": true, "y": 0}), at.clone(), decode_bool);
        assert_eq!(
            err,
            Err(DecodeError::type_mismatch(at.entry("y"), Expected::Boolean))
        );

        let map = decode_map(&json!({"x": true}), at.clone(), decode_bool).expect("map");
        assert_eq!(map.get("x"), Some(&true));
        assert_eq!(
            decode_map(&json!([]), at.clone(), decode_bool),
            Err(DecodeError::type_mismatch(at, Expected::Object))
        );
    }
}
