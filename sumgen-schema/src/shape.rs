//! Variant shape classification.
//!
//! The shape of a payload is a total function of its field list:
//!
//! | fields                     | shape     |
//! |----------------------------|-----------|
//! | none                       | `Unit`    |
//! | exactly one, unnamed       | `NewType` |
//! | two or more, all unnamed   | `Tuple`   |
//! | one or more, all named     | `Struct`  |
//!
//! Anything else mixes named and unnamed fields and is rejected.

use crate::error::SchemaError;
use crate::types::{SchemaField, SchemaStruct, SchemaVariant};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural category of a variant or struct payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantShape {
    /// No fields.
    Unit,
    /// Exactly one unnamed field.
    NewType,
    /// Two or more unnamed fields.
    Tuple,
    /// One or more named fields.
    Struct,
}

impl VariantShape {
    /// Returns the lowercase shape name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::NewType => "newtype",
            Self::Tuple => "tuple",
            Self::Struct => "struct",
        }
    }
}

impl fmt::Display for VariantShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies a field list owned by `owner`.
///
/// # Errors
/// Returns [`SchemaError::MixedFieldNaming`] when named and unnamed fields
/// are mixed.
pub fn classify_fields(owner: &str, fields: &[SchemaField]) -> Result<VariantShape, SchemaError> {
    let named = fields.iter().filter(|f| f.name.is_some()).count();
    match (fields.len(), named) {
        (0, _) => Ok(VariantShape::Unit),
        (1, 0) => Ok(VariantShape::NewType),
        (_, 0) => Ok(VariantShape::Tuple),
        (total, named) if total == named => Ok(VariantShape::Struct),
        _ => Err(SchemaError::mixed(owner)),
    }
}

/// Classifies a variant.
///
/// # Errors
/// Returns [`SchemaError::MixedFieldNaming`] when the variant mixes named and
/// unnamed fields.
pub fn classify(variant: &SchemaVariant) -> Result<VariantShape, SchemaError> {
    classify_fields(&variant.name, &variant.fields)
}

/// Classifies a struct definition.
///
/// # Errors
/// Returns [`SchemaError::MixedFieldNaming`] when the struct mixes named and
/// unnamed fields.
pub fn classify_struct(def: &SchemaStruct) -> Result<VariantShape, SchemaError> {
    classify_fields(&def.name, &def.fields)
}

impl SchemaVariant {
    /// Returns the shape of this variant.
    ///
    /// # Errors
    /// Returns [`SchemaError::MixedFieldNaming`] for mixed field naming.
    pub fn shape(&self) -> Result<VariantShape, SchemaError> {
        classify(self)
    }
}

impl SchemaStruct {
    /// Returns the shape of this struct.
    ///
    /// # Errors
    /// Returns [`SchemaError::MixedFieldNaming`] for mixed field naming.
    pub fn shape(&self) -> Result<VariantShape, SchemaError> {
        classify_struct(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn variant(fields: Vec<SchemaField>) -> SchemaVariant {
        let mut v = SchemaVariant::new("V");
        v.fields = fields;
        v
    }

    #[test]
    fn test_classify_all_shapes() {
        assert_eq!(classify(&variant(vec![])), Ok(VariantShape::Unit));
        assert_eq!(
            classify(&variant(vec![SchemaField::positional(FieldType::String)])),
            Ok(VariantShape::NewType)
        );
        assert_eq!(
            classify(&variant(vec![
                SchemaField::positional(FieldType::String),
                SchemaField::positional(FieldType::Boolean),
            ])),
            Ok(VariantShape::Tuple)
        );
        assert_eq!(
            classify(&variant(vec![SchemaField::named("vfield", FieldType::String)])),
            Ok(VariantShape::Struct)
        );
    }

    #[test]
    fn test_classify_rejects_mixed_naming() {
        let mixed = variant(vec![
            SchemaField::named("a", FieldType::String),
            SchemaField::positional(FieldType::Boolean),
        ]);
        assert_eq!(
            classify(&mixed),
            Err(SchemaError::MixedFieldNaming {
                name: "V".to_string()
            })
        );
    }

    #[test]
    fn test_single_named_field_is_struct_not_newtype() {
        let single = variant(vec![SchemaField::named("only", FieldType::Boolean)]);
        assert_eq!(classify(&single), Ok(VariantShape::Struct));
    }
}
