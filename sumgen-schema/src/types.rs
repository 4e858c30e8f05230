//! Schema type definitions.
//!
//! This module contains the data structures the front-end hands over for one
//! generation unit: sum types (enums with variants), struct definitions that
//! variants may reference, and the closed set of field types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Complete schema for one generation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Package name (namespace) of the generated code.
    pub package: String,
    /// Schema description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Definitions in declaration order.
    #[serde(default)]
    pub definitions: Vec<Definition>,
    /// Definition lookup map (built on insertion).
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl Schema {
    /// Creates a new empty schema.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            description: None,
            definitions: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Adds a definition to the schema.
    pub fn add_definition(&mut self, definition: impl Into<Definition>) {
        let definition = definition.into();
        let index = self.definitions.len();
        self.lookup.insert(definition.name().to_string(), index);
        self.definitions.push(definition);
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get_definition(&self, name: &str) -> Option<&Definition> {
        self.lookup.get(name).map(|&idx| &self.definitions[idx])
    }

    /// Returns the declaration index of a definition.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Returns true if a definition with the given name exists.
    #[must_use]
    pub fn has_definition(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Iterates over the enum definitions.
    pub fn enums(&self) -> impl Iterator<Item = &SchemaEnum> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Enum(e) => Some(e),
            Definition::Struct(_) => None,
        })
    }

    /// Iterates over the struct definitions.
    pub fn structs(&self) -> impl Iterator<Item = &SchemaStruct> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Struct(s) => Some(s),
            Definition::Enum(_) => None,
        })
    }
}

/// A named definition: a sum type or a struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Definition {
    /// Sum type.
    Enum(SchemaEnum),
    /// Product type referenced from variant fields.
    Struct(SchemaStruct),
}

impl Definition {
    /// Returns the name of the definition.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Enum(e) => &e.name,
            Self::Struct(s) => &s.name,
        }
    }

    /// Returns the fields of every payload slot in the definition.
    pub fn fields(&self) -> Box<dyn Iterator<Item = &SchemaField> + '_> {
        match self {
            Self::Enum(e) => Box::new(e.variants.iter().flat_map(|v| v.fields.iter())),
            Self::Struct(s) => Box::new(s.fields.iter()),
        }
    }

    /// Returns true if this is an enum definition.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }
}

impl From<SchemaEnum> for Definition {
    fn from(value: SchemaEnum) -> Self {
        Self::Enum(value)
    }
}

impl From<SchemaStruct> for Definition {
    fn from(value: SchemaStruct) -> Self {
        Self::Struct(value)
    }
}

/// One sum type under generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEnum {
    /// Type name, unique within the schema.
    pub name: String,
    /// Documentation carried through to emitted code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Variants in declaration order.
    #[serde(default)]
    pub variants: Vec<SchemaVariant>,
}

impl SchemaEnum {
    /// Creates a new enum with no variants.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            variants: Vec::new(),
        }
    }

    /// Appends a variant.
    #[must_use]
    pub fn variant(mut self, variant: SchemaVariant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Looks up a variant by wire tag.
    #[must_use]
    pub fn get_variant(&self, tag: &str) -> Option<&SchemaVariant> {
        self.variants.iter().find(|v| v.wire_tag() == tag)
    }
}

/// One arm of a sum type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaVariant {
    /// Variant name.
    pub name: String,
    /// Wire-level discriminant; the variant name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Documentation carried through to emitted code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Payload fields; empty for unit variants.
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl SchemaVariant {
    /// Creates a new variant with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            docs: None,
            fields: Vec::new(),
        }
    }

    /// Overrides the wire tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the wire tag.
    #[must_use]
    pub fn wire_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

/// A named product type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaStruct {
    /// Type name, unique within the schema.
    pub name: String,
    /// Documentation carried through to emitted code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    /// Fields; named for record structs, positional for tuple structs.
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl SchemaStruct {
    /// Creates a new struct with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }
}

/// One payload slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name; absent for positional fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Documentation carried through to emitted code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

impl SchemaField {
    /// Creates a positional field.
    #[must_use]
    pub fn positional(ty: FieldType) -> Self {
        Self {
            name: None,
            ty,
            docs: None,
        }
    }

    /// Creates a named field.
    #[must_use]
    pub fn named(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            docs: None,
        }
    }
}

/// Integer width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// 8 bits.
    W8,
    /// 16 bits.
    W16,
    /// 32 bits.
    W32,
    /// 64 bits.
    W64,
}

impl IntWidth {
    /// Returns the width in bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Parses a width from its bit count.
    #[must_use]
    pub fn from_bits(bits: &str) -> Option<Self> {
        match bits {
            "8" => Some(Self::W8),
            "16" => Some(Self::W16),
            "32" => Some(Self::W32),
            "64" => Some(Self::W64),
            _ => None,
        }
    }
}

/// Closed set of field types.
///
/// Nesting beyond sequences and mappings goes through references to other
/// definitions of the same schema. Textual syntax: `string`, `bool`,
/// `i8`..`i64`, `u8`..`u64`, `seq<T>`, `map<T>`, or a definition name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// Signed integer.
    Signed(IntWidth),
    /// Unsigned integer.
    Unsigned(IntWidth),
    /// Boolean.
    Boolean,
    /// Reference to another enum or struct definition.
    Reference(String),
    /// Sequence of one element type.
    Sequence(Box<FieldType>),
    /// Mapping from string keys to one value type.
    Mapping(Box<FieldType>),
}

impl FieldType {
    /// Parses the textual type syntax.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s {
            "string" | "str" => return Some(Self::String),
            "bool" | "boolean" => return Some(Self::Boolean),
            _ => {}
        }
        if let Some(inner) = generic_arg(s, "seq") {
            return Self::parse(inner).map(|t| Self::Sequence(Box::new(t)));
        }
        if let Some(inner) = generic_arg(s, "map") {
            return Self::parse(inner).map(|t| Self::Mapping(Box::new(t)));
        }
        if let Some(bits) = s.strip_prefix('i') {
            if let Some(width) = IntWidth::from_bits(bits) {
                return Some(Self::Signed(width));
            }
        }
        if let Some(bits) = s.strip_prefix('u') {
            if let Some(width) = IntWidth::from_bits(bits) {
                return Some(Self::Unsigned(width));
            }
        }
        is_identifier(s).then(|| Self::Reference(s.to_string()))
    }

    /// Returns the Rust type used to hold values of this type.
    #[must_use]
    pub fn rust_type(&self) -> String {
        match self {
            Self::String => "String".to_string(),
            Self::Signed(w) => format!("i{}", w.bits()),
            Self::Unsigned(w) => format!("u{}", w.bits()),
            Self::Boolean => "bool".to_string(),
            Self::Reference(name) => name.clone(),
            Self::Sequence(inner) => format!("Vec<{}>", inner.rust_type()),
            Self::Mapping(inner) => {
                format!("std::collections::BTreeMap<String, {}>", inner.rust_type())
            }
        }
    }

    /// Returns the referenced definition name, looking through sequences
    /// and mappings.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            Self::Sequence(inner) | Self::Mapping(inner) => inner.reference(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Signed(w) => write!(f, "i{}", w.bits()),
            Self::Unsigned(w) => write!(f, "u{}", w.bits()),
            Self::Boolean => f.write_str("bool"),
            Self::Reference(name) => f.write_str(name),
            Self::Sequence(inner) => write!(f, "seq<{}>", inner),
            Self::Mapping(inner) => write!(f, "map<{}>", inner),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid field type '{}'", value))
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

/// Extracts `T` from `name<T>`.
fn generic_arg<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

/// Returns true if `s` is an ASCII identifier other than the bare `_`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse("string"), Some(FieldType::String));
        assert_eq!(FieldType::parse("bool"), Some(FieldType::Boolean));
        assert_eq!(
            FieldType::parse("i64"),
            Some(FieldType::Signed(IntWidth::W64))
        );
        assert_eq!(
            FieldType::parse("u8"),
            Some(FieldType::Unsigned(IntWidth::W8))
        );
        assert_eq!(
            FieldType::parse("seq<map<u16>>"),
            Some(FieldType::Sequence(Box::new(FieldType::Mapping(Box::new(
                FieldType::Unsigned(IntWidth::W16)
            )))))
        );
        assert_eq!(
            FieldType::parse("SimpleEnum"),
            Some(FieldType::Reference("SimpleEnum".to_string()))
        );
        // `i128` is not a supported width, so it reads as a reference name
        assert_eq!(
            FieldType::parse("i128"),
            Some(FieldType::Reference("i128".to_string()))
        );
        assert_eq!(FieldType::parse("seq<"), None);
        assert_eq!(FieldType::parse("9lives"), None);
    }

    #[test]
    fn test_field_type_display_matches_parse() {
        for text in ["string", "bool", "i32", "u64", "seq<Pair>", "map<seq<bool>>"] {
            let ty = FieldType::parse(text).expect("parse");
            assert_eq!(ty.to_string(), text);
        }
    }

    #[test]
    fn test_field_type_rust_type() {
        assert_eq!(FieldType::String.rust_type(), "String");
        assert_eq!(
            FieldType::parse("seq<i16>").expect("parse").rust_type(),
            "Vec<i16>"
        );
        assert_eq!(
            FieldType::parse("map<Pair>").expect("parse").rust_type(),
            "std::collections::BTreeMap<String, Pair>"
        );
    }

    #[test]
    fn test_field_type_reference() {
        let ty = FieldType::parse("seq<map<Inner>>").expect("parse");
        assert_eq!(ty.reference(), Some("Inner"));
        assert_eq!(FieldType::String.reference(), None);
    }

    #[test]
    fn test_schema_lookup() {
        let mut schema = Schema::new("test");
        schema.add_definition(SchemaEnum::new("Shape").variant(SchemaVariant::new("Empty")));
        schema.add_definition(SchemaStruct::new("Point"));

        assert!(schema.has_definition("Shape"));
        assert!(schema.get_definition("Point").is_some());
        assert!(!schema.has_definition("Missing"));
        assert_eq!(schema.enums().count(), 1);
        assert_eq!(schema.structs().count(), 1);
    }

    #[test]
    fn test_variant_wire_tag_defaults_to_name() {
        let variant = SchemaVariant::new("VUnit");
        assert_eq!(variant.wire_tag(), "VUnit");
        let variant = variant.with_tag("v_unit");
        assert_eq!(variant.wire_tag(), "v_unit");
    }
}
