//! # sumgen Schema
//!
//! Schema model for sum types and the front half of the generation pipeline.
//!
//! This crate provides:
//! - Type definitions for enums, variants, structs and fields
//! - XML and JSON schema loaders
//! - Variant shape classification
//! - Schema validation
//! - Intermediate representation in resolution order for code generation

pub mod error;
pub mod ir;
pub mod parser;
pub mod shape;
pub mod types;
pub mod validation;

pub use error::{ParseError, SchemaError};
pub use ir::{
    ResolvedDefinition, ResolvedEnum, ResolvedField, ResolvedStruct, ResolvedVariant, SchemaIr,
};
pub use parser::{parse_schema, parse_schema_json};
pub use shape::{VariantShape, classify, classify_fields, classify_struct};
pub use types::{
    Definition, FieldType, IntWidth, Schema, SchemaEnum, SchemaField, SchemaStruct, SchemaVariant,
};
pub use validation::validate_schema;
