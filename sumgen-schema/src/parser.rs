//! Schema loaders.
//!
//! This module reads a schema either from the XML document format or from
//! the JSON serialisation of [`Schema`]:
//!
//! ```xml
//! <sumSchema package="simple" description="...">
//!     <enum name="SimpleEnum">
//!         <variant name="VUnit"/>
//!         <variant name="VTuple">
//!             <field type="string"/>
//!             <field type="i64"/>
//!         </variant>
//!     </enum>
//!     <struct name="Pair">
//!         <field name="key" type="string"/>
//!     </struct>
//! </sumSchema>
//! ```

use crate::error::ParseError;
use crate::types::{FieldType, Schema, SchemaEnum, SchemaField, SchemaStruct, SchemaVariant};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};

/// Parses a schema from an XML string.
///
/// # Arguments
/// * `xml` - XML schema content
///
/// # Returns
/// Parsed schema or parse error.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed or contains invalid schema elements.
pub fn parse_schema(xml: &str) -> Result<Schema, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut schema: Option<Schema> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match (name, schema.as_mut()) {
                    ("sumSchema", None) => schema = Some(parse_schema_element(e)?),
                    ("enum", Some(schema)) => {
                        let enum_def = parse_enum(&mut reader, e, false)?;
                        add_unique(schema, "enum", enum_def)?;
                    }
                    ("struct", Some(schema)) => {
                        let struct_def = parse_struct(&mut reader, e, false)?;
                        add_unique(schema, "struct", struct_def)?;
                    }
                    (other, _) => return Err(ParseError::unknown_element(other, "document")),
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match (name, schema.as_mut()) {
                    ("sumSchema", None) => schema = Some(parse_schema_element(e)?),
                    ("enum", Some(schema)) => {
                        let enum_def = parse_enum(&mut reader, e, true)?;
                        add_unique(schema, "enum", enum_def)?;
                    }
                    ("struct", Some(schema)) => {
                        let struct_def = parse_struct(&mut reader, e, true)?;
                        add_unique(schema, "struct", struct_def)?;
                    }
                    (other, _) => return Err(ParseError::unknown_element(other, "document")),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    schema.ok_or_else(|| ParseError::InvalidStructure {
        message: "No sumSchema element found".to_string(),
    })
}

/// Parses a schema from its JSON serialisation.
///
/// # Errors
/// Returns `ParseError` if the JSON is malformed, a field type does not
/// parse, or two definitions share a name.
pub fn parse_schema_json(json: &str) -> Result<Schema, ParseError> {
    let parsed: Schema = serde_json::from_str(json)?;

    let mut schema = Schema::new(parsed.package);
    schema.description = parsed.description;
    for definition in parsed.definitions {
        if schema.has_definition(definition.name()) {
            let kind = if definition.is_enum() { "enum" } else { "struct" };
            return Err(ParseError::duplicate(kind, definition.name()));
        }
        schema.add_definition(definition);
    }

    Ok(schema)
}

fn add_unique(
    schema: &mut Schema,
    kind: &str,
    definition: impl Into<crate::types::Definition>,
) -> Result<(), ParseError> {
    let definition = definition.into();
    if schema.has_definition(definition.name()) {
        return Err(ParseError::duplicate(kind, definition.name()));
    }
    schema.add_definition(definition);
    Ok(())
}

/// Reads an attribute value as unescaped UTF-8.
fn attr_value(raw: &[u8]) -> Result<String, ParseError> {
    let text = std::str::from_utf8(raw)?;
    let value = unescape(text).map_err(|e| ParseError::Xml(e.into()))?;
    Ok(value.into_owned())
}

/// Parses the sumSchema element attributes.
fn parse_schema_element(e: &BytesStart<'_>) -> Result<Schema, ParseError> {
    let mut package = None;
    let mut description = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(&attr.value)?;

        match key {
            "package" => package = Some(value),
            "description" => description = Some(value),
            _ => {}
        }
    }

    let package = package.ok_or_else(|| ParseError::missing_attr("sumSchema", "package"))?;
    let mut schema = Schema::new(package);
    schema.description = description;
    Ok(schema)
}

/// Collects the `name` and `description` attributes of a definition element.
fn parse_named(e: &BytesStart<'_>, element: &str) -> Result<(String, Option<String>), ParseError> {
    let mut name = None;
    let mut description = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(&attr.value)?;

        match key {
            "name" => name = Some(value),
            "description" => description = Some(value),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr(element, "name"))?;
    Ok((name, description))
}

/// Parses an enum definition.
fn parse_enum(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<SchemaEnum, ParseError> {
    let (name, description) = parse_named(e, "enum")?;
    let mut enum_def = SchemaEnum::new(name);
    enum_def.docs = description;

    if empty {
        return Ok(enum_def);
    }

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                if tag_name != "variant" {
                    return Err(ParseError::unknown_element(tag_name, &enum_def.name));
                }
                let variant = parse_variant(reader, e, false)?;
                enum_def.variants.push(variant);
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                if tag_name != "variant" {
                    return Err(ParseError::unknown_element(tag_name, &enum_def.name));
                }
                let variant = parse_variant(reader, e, true)?;
                enum_def.variants.push(variant);
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("Unterminated enum '{}'", enum_def.name),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(enum_def)
}

/// Parses a variant of an enum.
fn parse_variant(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<SchemaVariant, ParseError> {
    let mut name = None;
    let mut tag = None;
    let mut description = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(&attr.value)?;

        match key {
            "name" => name = Some(value),
            "tag" => tag = Some(value),
            "description" => description = Some(value),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("variant", "name"))?;
    let mut variant = SchemaVariant::new(name);
    variant.tag = tag;
    variant.docs = description;

    if !empty {
        variant.fields = parse_fields(reader, &variant.name)?;
    }

    Ok(variant)
}

/// Parses a struct definition.
fn parse_struct(
    reader: &mut Reader<&[u8]>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<SchemaStruct, ParseError> {
    let (name, description) = parse_named(e, "struct")?;
    let mut struct_def = SchemaStruct::new(name);
    struct_def.docs = description;

    if !empty {
        struct_def.fields = parse_fields(reader, &struct_def.name)?;
    }

    Ok(struct_def)
}

/// Parses the `field` children of a variant or struct, consuming its end tag.
fn parse_fields(reader: &mut Reader<&[u8]>, owner: &str) -> Result<Vec<SchemaField>, ParseError> {
    let mut fields = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                if tag_name != "field" {
                    return Err(ParseError::unknown_element(tag_name, owner));
                }
                let mut field = parse_field(e)?;
                if let Some(text) = read_text(reader)? {
                    field.docs.get_or_insert(text);
                }
                fields.push(field);
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let tag_name = std::str::from_utf8(&name_bytes)?;
                if tag_name != "field" {
                    return Err(ParseError::unknown_element(tag_name, owner));
                }
                fields.push(parse_field(e)?);
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(ParseError::InvalidStructure {
                    message: format!("Unterminated element '{}'", owner),
                });
            }
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(fields)
}

/// Parses a field element's attributes.
fn parse_field(e: &BytesStart<'_>) -> Result<SchemaField, ParseError> {
    let mut name = None;
    let mut ty = None;
    let mut description = None;

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr_value(&attr.value)?;

        match key {
            "name" => name = Some(value),
            "type" => {
                ty = Some(
                    FieldType::parse(&value)
                        .ok_or_else(|| ParseError::invalid_attr("field", "type", &value))?,
                )
            }
            "description" => description = Some(value),
            _ => {}
        }
    }

    let ty = ty.ok_or_else(|| ParseError::missing_attr("field", "type"))?;
    Ok(SchemaField {
        name,
        ty,
        docs: description,
    })
}

/// Reads the text content of the current element up to its end tag.
///
/// Text, CDATA sections and entity references are joined in document order
/// and the result is trimmed as a whole.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<Option<String>, ParseError> {
    let mut buf = Vec::new();
    let mut text = String::new();
    reader.config_mut().trim_text(false);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(ref t)) => text.push_str(std::str::from_utf8(t.as_ref())?),
            Ok(Event::CData(ref c)) => text.push_str(std::str::from_utf8(c.as_ref())?),
            Ok(Event::GeneralRef(ref r)) => {
                let entity = std::str::from_utf8(r.as_ref())?;
                text.push_str(&resolve_entity(entity)?);
            }
            Ok(Event::End(_)) | Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    reader.config_mut().trim_text(true);
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

/// Resolves the body of an `&...;` reference in element text.
fn resolve_entity(entity: &str) -> Result<String, ParseError> {
    let unknown = || ParseError::InvalidStructure {
        message: format!("Unknown entity reference '&{};'", entity),
    };

    if let Some(code) = entity.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        }
        .map_err(|_| unknown())?;
        return char::from_u32(value)
            .map(String::from)
            .ok_or_else(unknown);
    }

    resolve_predefined_entity(entity)
        .map(str::to_string)
        .ok_or_else(unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Definition, IntWidth};

    const SIMPLE_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sumSchema package="simple" description="Reference sum type">
    <enum name="SimpleEnum" description="Covers every variant shape">
        <variant name="VUnit"/>
        <variant name="VUnit2" tag="v_unit_2"/>
        <variant name="VStr">
            <field type="string"/>
        </variant>
        <variant name="VTuple">
            <field type="string"/>
            <field type="i64"/>
        </variant>
        <variant name="VStruct" description="Record payload">
            <field name="vfield" type="string">Carried verbatim</field>
        </variant>
    </enum>
    <struct name="Pair">
        <field type="string"/>
        <field type="map&lt;u16&gt;"/>
    </struct>
</sumSchema>"#;

    #[test]
    fn test_parse_simple_schema() {
        let schema = parse_schema(SIMPLE_SCHEMA).expect("Failed to parse schema");

        assert_eq!(schema.package, "simple");
        assert_eq!(schema.description.as_deref(), Some("Reference sum type"));
        assert_eq!(schema.definitions.len(), 2);
        assert!(schema.has_definition("SimpleEnum"));
        assert!(schema.has_definition("Pair"));
    }

    #[test]
    fn test_parse_variants() {
        let schema = parse_schema(SIMPLE_SCHEMA).expect("Failed to parse schema");
        let Some(Definition::Enum(simple)) = schema.get_definition("SimpleEnum") else {
            panic!("SimpleEnum is not an enum");
        };

        assert_eq!(simple.variants.len(), 5);
        assert_eq!(simple.variants[1].wire_tag(), "v_unit_2");
        assert_eq!(simple.variants[3].fields.len(), 2);
        assert_eq!(
            simple.variants[3].fields[1].ty,
            FieldType::Signed(IntWidth::W64)
        );

        let vstruct = &simple.variants[4];
        assert_eq!(vstruct.docs.as_deref(), Some("Record payload"));
        assert_eq!(vstruct.fields[0].name.as_deref(), Some("vfield"));
        assert_eq!(vstruct.fields[0].docs.as_deref(), Some("Carried verbatim"));
    }

    #[test]
    fn test_field_text_resolves_references() {
        let xml = r#"<sumSchema package="docs">
    <struct name="Doc">
        <field name="a" type="bool">  a &amp; b &lt;c&gt; &#233;&#x21; </field>
        <field name="b" type="bool">x <![CDATA[<raw> & ]]>y</field>
    </struct>
</sumSchema>"#;
        let schema = parse_schema(xml).expect("Failed to parse schema");
        let Some(Definition::Struct(doc)) = schema.get_definition("Doc") else {
            panic!("Doc is not a struct");
        };
        assert_eq!(doc.fields[0].docs.as_deref(), Some("a & b <c> \u{e9}!"));
        assert_eq!(doc.fields[1].docs.as_deref(), Some("x <raw> & y"));
    }

    #[test]
    fn test_field_text_rejects_unknown_entity() {
        let xml = r#"<sumSchema package="docs">
    <struct name="Doc"><field name="a" type="bool">&nbsp;</field></struct>
</sumSchema>"#;
        assert!(matches!(
            parse_schema(xml),
            Err(ParseError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_parse_struct_with_escaped_type() {
        let schema = parse_schema(SIMPLE_SCHEMA).expect("Failed to parse schema");
        let Some(Definition::Struct(pair)) = schema.get_definition("Pair") else {
            panic!("Pair is not a struct");
        };
        assert_eq!(
            pair.fields[1].ty,
            FieldType::Mapping(Box::new(FieldType::Unsigned(IntWidth::W16)))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_schema("<other/>"),
            Err(ParseError::UnknownElement { .. })
        ));
        assert!(matches!(
            parse_schema(""),
            Err(ParseError::InvalidStructure { .. })
        ));
        assert!(matches!(
            parse_schema(r#"<sumSchema package="p"><enum/></sumSchema>"#),
            Err(ParseError::MissingAttribute { .. })
        ));
        assert!(matches!(
            parse_schema(
                r#"<sumSchema package="p"><enum name="E"><variant name="V"><field type="9x"/></variant></enum></sumSchema>"#
            ),
            Err(ParseError::InvalidAttribute { .. })
        ));
        assert!(matches!(
            parse_schema(r#"<sumSchema package="p"><enum name="E"/><struct name="E"/></sumSchema>"#),
            Err(ParseError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn test_parse_schema_json() {
        let json = r#"{
            "package": "simple",
            "definitions": [
                {
                    "kind": "enum",
                    "name": "SimpleEnum",
                    "variants": [
                        { "name": "VUnit" },
                        { "name": "VTuple", "fields": [{ "type": "string" }, { "type": "i64" }] },
                        { "name": "VStruct", "fields": [{ "name": "vfield", "type": "string" }] }
                    ]
                },
                { "kind": "struct", "name": "Pair", "fields": [{ "type": "seq<bool>" }] }
            ]
        }"#;

        let schema = parse_schema_json(json).expect("Failed to parse JSON schema");
        assert_eq!(schema.package, "simple");
        assert!(schema.has_definition("SimpleEnum"));
        assert_eq!(schema.enums().next().map(|e| e.variants.len()), Some(3));
        assert_eq!(
            schema.structs().next().map(|s| s.fields[0].ty.clone()),
            Some(FieldType::Sequence(Box::new(FieldType::Boolean)))
        );
    }

    #[test]
    fn test_parse_schema_json_errors() {
        let bad_type = r#"{"package": "p", "definitions": [
            {"kind": "struct", "name": "S", "fields": [{"type": "seq<"}]}
        ]}"#;
        assert!(matches!(
            parse_schema_json(bad_type),
            Err(ParseError::Json(_))
        ));

        let duplicate = r#"{"package": "p", "definitions": [
            {"kind": "struct", "name": "S"},
            {"kind": "enum", "name": "S"}
        ]}"#;
        assert!(matches!(
            parse_schema_json(duplicate),
            Err(ParseError::DuplicateDefinition { .. })
        ));
    }
}
