//! # sumgen Core
//!
//! Runtime shared by the schema-driven codec interpreter and by generated
//! code.
//!
//! This crate provides:
//! - A dynamic value model for sum types (variants, payloads, records)
//! - Externally tagged JSON wire helpers with strict numeric coercion
//! - A runtime dispatcher with optional per-variant handlers
//! - Error types for decoding, encoding and dispatch

pub mod dispatch;
pub mod error;
pub mod value;
pub mod wire;

pub use dispatch::{Dispatcher, Handler, Handlers};
pub use error::{DecodeError, DecodeResult, EncodeError, Expected, FieldLocation, MatchError};
pub use value::{Payload, Value, VariantValue};
pub use wire::{DecodeOptions, ExtraKeys, Json, Tagged};
