//! # sumgen
//!
//! Code generation for tagged unions with externally tagged JSON codecs and
//! exhaustive dispatch.
//!
//! A schema describes enums whose variants carry unit, newtype, tuple or
//! struct payloads. sumgen classifies every payload, synthesizes the wire
//! codec and the dispatch plan of each enum, and emits Rust source that
//! encodes, decodes and matches over the generated types.
//!
//! ## Features
//!
//! - **One wire convention** - unit variants as bare tags, everything else as
//!   a single-key object holding the payload
//! - **Precise decode errors** - unknown tags, wrong arity, missing fields and
//!   type mismatches are reported with their location
//! - **Exhaustive dispatch** - handler sets with a default result for omitted
//!   variants
//! - **Schema-driven interpretation** - encode and decode dynamic values
//!   without generating code
//!
//! ## Quick Start
//!
//! ```ignore
//! use sumgen::prelude::*;
//!
//! let schema = parse_schema(xml)?;
//! let ir = SchemaIr::from_schema(&schema)?;
//! let code = Generator::new(&ir).generate()?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Runtime value model, wire helpers, errors and dispatcher
//! - [`schema`] - Schema IR, shape classification, validation and loaders
//! - [`codegen`] - Codec and dispatch synthesis, Rust code generation

pub mod prelude;

/// Runtime shared by the interpreter and generated code.
pub mod core {
    pub use sumgen_core::*;
}

/// Schema IR, parsing and validation.
pub mod schema {
    pub use sumgen_schema::*;
}

/// Synthesis and code generation.
pub mod codegen {
    pub use sumgen_codegen::*;
}

// Re-export commonly used items at the crate root
pub use sumgen_codegen::{Generator, GeneratorConfig, generate_from_file, generate_from_xml};
pub use sumgen_core::{DecodeError, EncodeError, MatchError, Value, VariantValue};
pub use sumgen_schema::{SchemaIr, parse_schema};
