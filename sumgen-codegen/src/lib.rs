//! # sumgen Codegen
//!
//! Synthesis and code generation for sumgen schemas.
//!
//! This crate provides:
//! - Codec synthesis: the externally tagged JSON wire form of every definition
//! - Dispatch synthesis: handler sets for exhaustive matching over enums
//! - Rust code generation from both plans
//! - Build script integration

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod rust;

pub use codec::{
    CodecPlan, CodecSynthesizer, DefinitionCodec, EnumCodec, PayloadCodec, RecordCodec,
    VariantCodec, WireForm,
};
pub use dispatch::{DispatchArm, DispatchPlan, DispatchSynthesizer, HandlerParam};
pub use error::CodegenError;
pub use generator::{Generator, GeneratorConfig};

use std::path::Path;
use sumgen_schema::{Schema, SchemaIr};

fn generate_from_schema(schema: &Schema, config: GeneratorConfig) -> Result<String, CodegenError> {
    let ir = SchemaIr::from_schema(schema)?;
    Generator::with_config(&ir, config).generate()
}

/// Generates Rust code from an XML schema string.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation or generation fails.
pub fn generate_from_xml(xml: &str) -> Result<String, CodegenError> {
    let schema = sumgen_schema::parse_schema(xml)?;
    generate_from_schema(&schema, GeneratorConfig::default())
}

/// Generates Rust code from a JSON schema string.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation or generation fails.
pub fn generate_from_json(json: &str) -> Result<String, CodegenError> {
    let schema = sumgen_schema::parse_schema_json(json)?;
    generate_from_schema(&schema, GeneratorConfig::default())
}

/// Generates Rust code from a schema file.
///
/// Files with a `.json` extension are read as JSON schemas, everything else
/// as XML.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, validation or generation fails.
pub fn generate_from_file(path: &Path) -> Result<String, CodegenError> {
    generate_from_file_with_config(path, GeneratorConfig::default())
}

/// Generates Rust code from a schema file with the given configuration.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, validation or generation fails.
pub fn generate_from_file_with_config(
    path: &Path,
    config: GeneratorConfig,
) -> Result<String, CodegenError> {
    let text = std::fs::read_to_string(path)?;
    tracing::info!("Generating code from schema '{}'", path.display());

    let schema = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => sumgen_schema::parse_schema_json(&text)?,
        _ => sumgen_schema::parse_schema(&text)?,
    };
    generate_from_schema(&schema, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const XML_SCHEMA: &str = r#"<sumSchema package="simple">
    <enum name="Shape">
        <variant name="Empty"/>
        <variant name="Circle"><field type="u32"/></variant>
    </enum>
</sumSchema>"#;

    #[test]
    fn test_generate_from_xml() {
        let output = generate_from_xml(XML_SCHEMA).expect("generate");
        assert!(output.contains("pub enum Shape {"));
        assert!(output.contains("Circle(u32),"));
    }

    #[test]
    fn test_generate_from_json() {
        let json = r#"{
            "package": "simple",
            "definitions": [
                {"kind": "enum", "name": "Shape", "variants": [
                    {"name": "Empty"},
                    {"name": "Circle", "fields": [{"type": "u32"}]}
                ]}
            ]
        }"#;
        let output = generate_from_json(json).expect("generate");
        assert!(output.contains("pub enum Shape {"));
        assert!(output.contains("pub struct ShapeHandlers<'h, R, E>"));
    }

    #[test]
    fn test_generate_reports_schema_errors() {
        let xml = r#"<sumSchema package="bad">
    <enum name="Mixed">
        <variant name="V"><field type="u8"/><field name="x" type="u8"/></variant>
    </enum>
</sumSchema>"#;
        assert!(matches!(
            generate_from_xml(xml),
            Err(CodegenError::Schema(sumgen_schema::SchemaError::MixedFieldNaming { .. }))
        ));
        assert!(matches!(generate_from_xml("<sumSchema"), Err(CodegenError::Parse(_))));
    }

    #[test]
    fn test_generate_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".xml")
            .tempfile()
            .expect("tempfile");
        file.write_all(XML_SCHEMA.as_bytes()).expect("write");

        let output = generate_from_file(file.path()).expect("generate");
        assert!(output.contains("pub enum Shape {"));

        let missing = Path::new("/nonexistent/schema.xml");
        assert!(matches!(generate_from_file(missing), Err(CodegenError::Io(_))));
    }

    #[test]
    fn test_generate_from_file_with_config() {
        let mut file = tempfile::Builder::new()
            .suffix(".xml")
            .tempfile()
            .expect("tempfile");
        file.write_all(XML_SCHEMA.as_bytes()).expect("write");

        let config = GeneratorConfig::new().emit_dispatch(false);
        let output = generate_from_file_with_config(file.path(), config).expect("generate");
        assert!(!output.contains("ShapeHandlers"));
    }
}
