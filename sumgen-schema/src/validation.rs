//! Schema validation utilities.
//!
//! This module checks a schema for the structural invariants code generation
//! relies on: unique names, unique wire tags, well-formed payload shapes and
//! resolvable references.

use crate::error::SchemaError;
use crate::shape::{VariantShape, classify_fields};
use crate::types::{Definition, FieldType, Schema, SchemaEnum, SchemaField, is_identifier};
use std::collections::HashSet;

/// Names that generated code uses unqualified, and so no definition may take.
const RESERVED_NAMES: &[&str] = &[
    "Self", "std", "wire", "Json", "Map", "DecodeError", "DecodeResult", "FieldLocation", "String",
    "Vec", "Box", "Option", "Some", "None", "Result", "Ok", "Err", "Default", "FnOnce", "R", "E",
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

/// Validates a schema for correctness.
///
/// # Errors
/// Returns `SchemaError` describing the first violation found.
pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
    validate_definition_names(schema)?;
    for definition in &schema.definitions {
        match definition {
            Definition::Enum(enum_def) => validate_enum(schema, enum_def)?,
            Definition::Struct(struct_def) => {
                validate_payload(schema, &struct_def.name, &struct_def.fields)?;
            }
        }
    }
    Ok(())
}

/// Validates that every definition has a unique identifier name that does
/// not clash with names the generated code relies on.
fn validate_definition_names(schema: &Schema) -> Result<(), SchemaError> {
    let handler_sets: HashSet<String> = schema
        .enums()
        .map(|e| format!("{}Handlers", e.name))
        .collect();
    let mut seen = HashSet::new();
    for definition in &schema.definitions {
        let name = definition.name();
        if !is_identifier(name) {
            return Err(SchemaError::validation(format!(
                "Definition name '{}' is not a valid identifier",
                name
            )));
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(SchemaError::validation(format!(
                "Definition name '{}' is reserved by generated code",
                name
            )));
        }
        if handler_sets.contains(name) {
            return Err(SchemaError::validation(format!(
                "Definition name '{}' collides with the handler set of an enum",
                name
            )));
        }
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateDefinition {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Validates an enum definition.
fn validate_enum(schema: &Schema, enum_def: &SchemaEnum) -> Result<(), SchemaError> {
    if enum_def.variants.is_empty() {
        tracing::warn!(
            "Enum '{}' declares no variants; no value can be decoded",
            enum_def.name
        );
    }

    let mut seen_names = HashSet::new();
    let mut seen_tags = HashSet::new();

    for variant in &enum_def.variants {
        if !is_member_name(&variant.name) {
            return Err(SchemaError::validation(format!(
                "Variant name '{}' in enum '{}' is not a valid identifier",
                variant.name, enum_def.name
            )));
        }
        if !seen_names.insert(variant.name.as_str()) {
            return Err(SchemaError::validation(format!(
                "Duplicate variant name '{}' in enum '{}'",
                variant.name, enum_def.name
            )));
        }
        if !seen_tags.insert(variant.wire_tag()) {
            return Err(SchemaError::DuplicateTag {
                enum_name: enum_def.name.clone(),
                tag: variant.wire_tag().to_string(),
            });
        }
        validate_payload(schema, &variant.name, &variant.fields)?;
    }

    Ok(())
}

/// Validates the fields of one variant or struct.
fn validate_payload(
    schema: &Schema,
    owner: &str,
    fields: &[SchemaField],
) -> Result<(), SchemaError> {
    let shape = classify_fields(owner, fields)?;

    if shape == VariantShape::Struct {
        let mut seen = HashSet::new();
        for name in fields.iter().filter_map(|f| f.name.as_deref()) {
            if !is_member_name(name) {
                return Err(SchemaError::validation(format!(
                    "Field name '{}' in '{}' is not a valid identifier",
                    name, owner
                )));
            }
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateField {
                    owner: owner.to_string(),
                    field: name.to_string(),
                });
            }
        }
    }

    for field in fields {
        validate_reference(schema, owner, &field.ty)?;
    }

    Ok(())
}

/// Variant and field names must start with a letter.
fn is_member_name(name: &str) -> bool {
    is_identifier(name) && !name.starts_with('_')
}

/// Validates that a field type's reference, if any, resolves.
fn validate_reference(schema: &Schema, owner: &str, ty: &FieldType) -> Result<(), SchemaError> {
    match ty.reference() {
        Some(name) if !schema.has_definition(name) => Err(SchemaError::TypeNotFound {
            name: name.to_string(),
            referenced_by: owner.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SchemaStruct, SchemaVariant};

    fn simple_schema() -> Schema {
        let mut schema = Schema::new("simple");
        schema.add_definition(
            SchemaEnum::new("SimpleEnum")
                .variant(SchemaVariant::new("VUnit"))
                .variant(SchemaVariant::new("VStr").field(SchemaField::positional(FieldType::String)))
                .variant(
                    SchemaVariant::new("VStruct")
                        .field(SchemaField::named("vfield", FieldType::String)),
                ),
        );
        schema
    }

    #[test]
    fn test_valid_schema() {
        assert!(validate_schema(&simple_schema()).is_ok());
    }

    #[test]
    fn test_duplicate_tag() {
        let mut schema = Schema::new("test");
        schema.add_definition(
            SchemaEnum::new("Kind")
                .variant(SchemaVariant::new("A"))
                .variant(SchemaVariant::new("B").with_tag("A")),
        );
        assert_eq!(
            validate_schema(&schema),
            Err(SchemaError::DuplicateTag {
                enum_name: "Kind".to_string(),
                tag: "A".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_field() {
        let mut schema = Schema::new("test");
        schema.add_definition(
            SchemaStruct::new("Point")
                .field(SchemaField::named("x", FieldType::Boolean))
                .field(SchemaField::named("x", FieldType::String)),
        );
        assert_eq!(
            validate_schema(&schema),
            Err(SchemaError::DuplicateField {
                owner: "Point".to_string(),
                field: "x".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_definition() {
        let mut schema = simple_schema();
        schema.add_definition(SchemaStruct::new("SimpleEnum"));
        assert_eq!(
            validate_schema(&schema),
            Err(SchemaError::DuplicateDefinition {
                name: "SimpleEnum".to_string()
            })
        );
    }

    #[test]
    fn test_unresolved_reference() {
        let mut schema = Schema::new("test");
        schema.add_definition(SchemaEnum::new("Kind").variant(
            SchemaVariant::new("V").field(SchemaField::positional(
                FieldType::parse("seq<Missing>").expect("parse"),
            )),
        ));
        assert_eq!(
            validate_schema(&schema),
            Err(SchemaError::TypeNotFound {
                name: "Missing".to_string(),
                referenced_by: "V".to_string()
            })
        );
    }

    #[test]
    fn test_mixed_naming_rejected() {
        let mut schema = Schema::new("test");
        schema.add_definition(
            SchemaEnum::new("Kind").variant(
                SchemaVariant::new("V")
                    .field(SchemaField::named("a", FieldType::String))
                    .field(SchemaField::positional(FieldType::String)),
            ),
        );
        assert!(matches!(
            validate_schema(&schema),
            Err(SchemaError::MixedFieldNaming { .. })
        ));
    }

    #[test]
    fn test_invalid_variant_name() {
        for name in ["not valid", "_", "_Hidden"] {
            let mut schema = Schema::new("test");
            schema.add_definition(SchemaEnum::new("Kind").variant(SchemaVariant::new(name)));
            assert!(
                matches!(validate_schema(&schema), Err(SchemaError::Validation { .. })),
                "variant '{}' accepted",
                name
            );
        }
    }

    #[test]
    fn test_invalid_field_name() {
        for name in ["_", "_private"] {
            let mut schema = Schema::new("test");
            schema.add_definition(
                SchemaStruct::new("Point").field(SchemaField::named(name, FieldType::Boolean)),
            );
            assert!(
                matches!(validate_schema(&schema), Err(SchemaError::Validation { .. })),
                "field '{}' accepted",
                name
            );
        }
    }

    #[test]
    fn test_reserved_definition_names() {
        for name in ["_", "String", "Json", "Result", "FieldLocation", "wire", "R", "u8"] {
            let mut schema = Schema::new("test");
            schema.add_definition(SchemaStruct::new(name));
            assert!(
                matches!(validate_schema(&schema), Err(SchemaError::Validation { .. })),
                "definition '{}' accepted",
                name
            );
        }
    }

    #[test]
    fn test_definition_named_like_handler_set() {
        let mut schema = simple_schema();
        schema.add_definition(SchemaStruct::new("SimpleEnumHandlers"));
        assert!(matches!(
            validate_schema(&schema),
            Err(SchemaError::Validation { .. })
        ));

        let mut schema = simple_schema();
        schema.add_definition(SchemaStruct::new("SimpleEnumHandler"));
        assert_eq!(validate_schema(&schema), Ok(()));
    }
}
