//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use sumgen::prelude::*;
//! ```

// Runtime types
pub use sumgen_core::{
    DecodeError, DecodeOptions, DecodeResult, Dispatcher, EncodeError, ExtraKeys, FieldLocation,
    Handlers, Json, MatchError, Payload, Value, VariantValue,
};

// Schema types
pub use sumgen_schema::{
    Definition, FieldType, ParseError, Schema, SchemaEnum, SchemaError, SchemaField, SchemaIr,
    SchemaStruct, SchemaVariant, VariantShape, classify, parse_schema, parse_schema_json,
    validate_schema,
};

// Codegen types
pub use sumgen_codegen::{
    CodecPlan, CodecSynthesizer, CodegenError, DispatchPlan, DispatchSynthesizer, Generator,
    GeneratorConfig, generate_from_file, generate_from_json, generate_from_xml,
};
