//! Codec synthesis.
//!
//! The synthesizer turns a resolved schema into a [`CodecPlan`]: one codec
//! description per definition, stating which wire form every variant takes
//! under the external-tag convention. Emitters render the plan into source
//! text; the plan can also be interpreted directly over dynamic
//! [`Value`]s, which is what the round-trip tests and benchmarks do.

use sumgen_core::wire::{
    DecodeOptions, Json, Map, Tagged, decode_bool, decode_int, decode_map, decode_null,
    decode_seq, decode_string, expect_array, expect_object, field, tagged, untag,
};
use sumgen_core::{DecodeError, DecodeResult, EncodeError, FieldLocation, Payload, Value, VariantValue};
use sumgen_schema::{
    FieldType, IntWidth, ResolvedDefinition, ResolvedEnum, ResolvedField, ResolvedStruct,
    SchemaIr, VariantShape,
};
use std::collections::{BTreeMap, HashMap};

/// Wire form of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireForm {
    /// The bare tag string.
    BareTag,
    /// A single-key object `{ "<tag>": <payload> }`.
    Wrapped(PayloadCodec),
}

/// Encoding of a non-unit payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadCodec {
    /// The single field's own encoding.
    Direct(FieldType),
    /// A fixed-length array in declaration order.
    Array(Vec<FieldType>),
    /// An object keyed by field name, in declaration order.
    Object(Vec<(String, FieldType)>),
}

impl PayloadCodec {
    fn from_fields(shape: VariantShape, fields: &[ResolvedField]) -> Option<Self> {
        match shape {
            VariantShape::Unit => None,
            VariantShape::NewType => fields.first().map(|f| Self::Direct(f.ty.clone())),
            VariantShape::Tuple => Some(Self::Array(fields.iter().map(|f| f.ty.clone()).collect())),
            VariantShape::Struct => Some(Self::Object(
                fields
                    .iter()
                    .map(|f| (f.binding.clone(), f.ty.clone()))
                    .collect(),
            )),
        }
    }

    /// Name of the payload shape this codec expects.
    #[must_use]
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::Direct(_) => "newtype",
            Self::Array(_) => "tuple",
            Self::Object(_) => "struct",
        }
    }
}

/// Codec of one enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCodec {
    /// Variant name.
    pub name: String,
    /// Wire tag.
    pub tag: String,
    /// Wire form.
    pub form: WireForm,
}

/// Codec of one enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCodec {
    /// Enum name.
    pub name: String,
    /// Tags of the unit variants; the only strings accepted bare.
    pub units: Vec<String>,
    /// Variant codecs in declaration order.
    pub variants: Vec<VariantCodec>,
}

impl EnumCodec {
    fn from_enum(enum_def: &ResolvedEnum) -> Self {
        let variants: Vec<VariantCodec> = enum_def
            .variants
            .iter()
            .map(|v| VariantCodec {
                name: v.name.clone(),
                tag: v.tag.clone(),
                form: match PayloadCodec::from_fields(v.shape, &v.fields) {
                    Some(payload) => WireForm::Wrapped(payload),
                    None => WireForm::BareTag,
                },
            })
            .collect();
        let units = variants
            .iter()
            .filter(|v| v.form == WireForm::BareTag)
            .map(|v| v.tag.clone())
            .collect();

        Self {
            name: enum_def.name.clone(),
            units,
            variants,
        }
    }

    /// Looks up a variant codec by tag.
    #[must_use]
    pub fn variant(&self, tag: &str) -> Option<&VariantCodec> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    /// Every declared tag.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.tag.as_str()).collect()
    }
}

/// Codec of one struct definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCodec {
    /// Struct name.
    pub name: String,
    /// Payload encoding; `None` for unit structs, which travel as `null`.
    pub payload: Option<PayloadCodec>,
}

impl RecordCodec {
    fn from_struct(struct_def: &ResolvedStruct) -> Self {
        Self {
            name: struct_def.name.clone(),
            payload: PayloadCodec::from_fields(struct_def.shape, &struct_def.fields),
        }
    }
}

/// Codec of one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionCodec {
    /// Sum type codec.
    Enum(EnumCodec),
    /// Struct codec.
    Record(RecordCodec),
}

impl DefinitionCodec {
    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Enum(e) => &e.name,
            Self::Record(r) => &r.name,
        }
    }
}

/// Synthesizer deriving codecs from a resolved schema.
pub struct CodecSynthesizer<'a> {
    ir: &'a SchemaIr,
    options: DecodeOptions,
}

impl<'a> CodecSynthesizer<'a> {
    /// Creates a new codec synthesizer with strict decode options.
    #[must_use]
    pub fn new(ir: &'a SchemaIr) -> Self {
        Self {
            ir,
            options: DecodeOptions::default(),
        }
    }

    /// Sets the decode options used when the plan is interpreted.
    #[must_use]
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Synthesizes the codec plan.
    #[must_use]
    pub fn synthesize(&self) -> CodecPlan {
        let definitions: Vec<DefinitionCodec> = self
            .ir
            .definitions
            .iter()
            .map(|d| match d {
                ResolvedDefinition::Enum(e) => DefinitionCodec::Enum(EnumCodec::from_enum(e)),
                ResolvedDefinition::Struct(s) => {
                    DefinitionCodec::Record(RecordCodec::from_struct(s))
                }
            })
            .collect();
        let index = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();

        tracing::debug!(
            "Synthesized codec plan for package '{}' ({} definitions)",
            self.ir.package,
            definitions.len()
        );

        CodecPlan {
            definitions,
            index,
            options: self.options,
        }
    }
}

/// Codec descriptions for every definition of a schema, in resolution order.
#[derive(Debug, Clone)]
pub struct CodecPlan {
    /// Definition codecs in resolution order.
    pub definitions: Vec<DefinitionCodec>,
    index: HashMap<String, usize>,
    options: DecodeOptions,
}

impl CodecPlan {
    /// Looks up the codec of a definition.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DefinitionCodec> {
        self.index.get(name).map(|&idx| &self.definitions[idx])
    }

    /// Looks up the codec of an enum.
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&EnumCodec> {
        match self.get(name)? {
            DefinitionCodec::Enum(e) => Some(e),
            DefinitionCodec::Record(_) => None,
        }
    }

    /// Decode options in effect.
    #[must_use]
    pub const fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Returns a copy of the plan with different decode options.
    #[must_use]
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Encodes a value of the named definition.
    ///
    /// # Errors
    /// Returns `EncodeError` when the name is unknown or the value does not
    /// agree with the definition.
    pub fn encode(&self, name: &str, value: &Value) -> Result<Json, EncodeError> {
        let codec = self
            .get(name)
            .ok_or_else(|| EncodeError::UnknownType(name.to_string()))?;
        self.encode_definition(codec, value, FieldLocation::Payload)
    }

    /// Encodes a variant value of the named enum.
    ///
    /// # Errors
    /// Returns `EncodeError` when the enum is unknown or the value does not
    /// agree with it.
    pub fn encode_variant(&self, enum_name: &str, value: &VariantValue) -> Result<Json, EncodeError> {
        let codec = self
            .get_enum(enum_name)
            .ok_or_else(|| EncodeError::UnknownType(enum_name.to_string()))?;
        self.encode_enum(codec, value)
    }

    /// Decodes a value of the named definition.
    ///
    /// Returns `None` when the plan has no definition of that name.
    #[must_use]
    pub fn decode(&self, name: &str, wire: &Json) -> Option<DecodeResult<Value>> {
        self.get(name).map(|codec| self.decode_definition(codec, wire))
    }

    /// Decodes a variant value of the named enum.
    ///
    /// Returns `None` when the plan has no enum of that name.
    #[must_use]
    pub fn decode_variant(&self, enum_name: &str, wire: &Json) -> Option<DecodeResult<VariantValue>> {
        self.get_enum(enum_name)
            .map(|codec| self.decode_enum(codec, wire))
    }

    fn decode_definition(&self, codec: &DefinitionCodec, wire: &Json) -> DecodeResult<Value> {
        match codec {
            DefinitionCodec::Enum(e) => self.decode_enum(e, wire).map(Value::Variant),
            DefinitionCodec::Record(r) => self.decode_record(r, wire).map(Value::Record),
        }
    }

    fn decode_enum(&self, codec: &EnumCodec, wire: &Json) -> DecodeResult<VariantValue> {
        match untag(wire, self.options.extra_keys, &codec.tags())? {
            Tagged::Bare(tag) => {
                if codec.units.iter().any(|u| u == tag) {
                    Ok(VariantValue::unit(tag))
                } else {
                    Err(DecodeError::UnknownUnitTag(tag.to_string()))
                }
            }
            Tagged::Wrapped(tag, payload) => {
                let variant = codec
                    .variant(tag)
                    .ok_or_else(|| DecodeError::UnknownVariantTag(tag.to_string()))?;
                match &variant.form {
                    WireForm::BareTag => Err(DecodeError::UnrecognizedShape),
                    WireForm::Wrapped(payload_codec) => Ok(VariantValue {
                        tag: variant.tag.clone(),
                        payload: self.decode_payload(payload_codec, payload)?,
                    }),
                }
            }
        }
    }

    fn decode_record(&self, codec: &RecordCodec, wire: &Json) -> DecodeResult<Payload> {
        match &codec.payload {
            None => decode_null(wire, FieldLocation::Payload).map(|()| Payload::Unit),
            Some(payload_codec) => self.decode_payload(payload_codec, wire),
        }
    }

    fn decode_payload(&self, codec: &PayloadCodec, wire: &Json) -> DecodeResult<Payload> {
        match codec {
            PayloadCodec::Direct(ty) => {
                let value = self.decode_slot(ty, wire, FieldLocation::Index(0))?;
                Ok(Payload::NewType(Box::new(value)))
            }
            PayloadCodec::Array(types) => {
                let items = expect_array(wire, types.len())?;
                let values = types
                    .iter()
                    .zip(items)
                    .enumerate()
                    .map(|(i, (ty, item))| self.decode_slot(ty, item, FieldLocation::Index(i)))
                    .collect::<DecodeResult<Vec<_>>>()?;
                Ok(Payload::Tuple(values))
            }
            PayloadCodec::Object(fields) => {
                let object = expect_object(wire)?;
                let values = fields
                    .iter()
                    .map(|(name, ty)| -> DecodeResult<(String, Value)> {
                        let item = field(object, name)?;
                        let value = self.decode_slot(ty, item, FieldLocation::name(name))?;
                        Ok((name.clone(), value))
                    })
                    .collect::<DecodeResult<BTreeMap<_, _>>>()?;
                Ok(Payload::Struct(values))
            }
        }
    }

    fn decode_slot(&self, ty: &FieldType, wire: &Json, at: FieldLocation) -> DecodeResult<Value> {
        match ty {
            FieldType::String => decode_string(wire, at).map(Value::String),
            FieldType::Boolean => decode_bool(wire, at).map(Value::Bool),
            FieldType::Signed(width) => decode_signed(wire, at, *width).map(Value::Signed),
            FieldType::Unsigned(width) => decode_unsigned(wire, at, *width).map(Value::Unsigned),
            FieldType::Reference(name) => match self.get(name) {
                Some(codec) => self
                    .decode_definition(codec, wire)
                    .map_err(|error| error.within(at)),
                None => Err(DecodeError::UnrecognizedShape),
            },
            FieldType::Sequence(inner) => {
                decode_seq(wire, at, |item, at| self.decode_slot(inner, item, at)).map(Value::Seq)
            }
            FieldType::Mapping(inner) => {
                decode_map(wire, at, |item, at| self.decode_slot(inner, item, at)).map(Value::Map)
            }
        }
    }

    fn encode_definition(
        &self,
        codec: &DefinitionCodec,
        value: &Value,
        at: FieldLocation,
    ) -> Result<Json, EncodeError> {
        match (codec, value) {
            (DefinitionCodec::Enum(e), Value::Variant(v)) => self.encode_enum(e, v),
            (DefinitionCodec::Record(r), Value::Record(p)) => self.encode_record(r, p),
            (codec, value) => Err(EncodeError::TypeMismatch {
                field: at,
                expected: codec.name().to_string(),
                actual: value.kind(),
            }),
        }
    }

    fn encode_enum(&self, codec: &EnumCodec, value: &VariantValue) -> Result<Json, EncodeError> {
        let variant = codec
            .variant(&value.tag)
            .ok_or_else(|| EncodeError::UnknownVariant {
                enum_name: codec.name.clone(),
                tag: value.tag.clone(),
            })?;
        match &variant.form {
            WireForm::BareTag => match value.payload {
                Payload::Unit => Ok(Json::String(variant.tag.clone())),
                _ => Err(EncodeError::ShapeMismatch {
                    name: variant.tag.clone(),
                    expected: "unit",
                }),
            },
            WireForm::Wrapped(payload_codec) => {
                let payload = self.encode_payload(payload_codec, &value.payload, &variant.tag)?;
                Ok(tagged(&variant.tag, payload))
            }
        }
    }

    fn encode_record(&self, codec: &RecordCodec, payload: &Payload) -> Result<Json, EncodeError> {
        match (&codec.payload, payload) {
            (None, Payload::Unit) => Ok(Json::Null),
            (None, _) => Err(EncodeError::ShapeMismatch {
                name: codec.name.clone(),
                expected: "unit",
            }),
            (Some(payload_codec), payload) => self.encode_payload(payload_codec, payload, &codec.name),
        }
    }

    fn encode_payload(
        &self,
        codec: &PayloadCodec,
        payload: &Payload,
        owner: &str,
    ) -> Result<Json, EncodeError> {
        match (codec, payload) {
            (PayloadCodec::Direct(ty), Payload::NewType(value)) => {
                self.encode_slot(ty, value, FieldLocation::Index(0))
            }
            (PayloadCodec::Array(types), Payload::Tuple(values)) => {
                if types.len() != values.len() {
                    return Err(EncodeError::ArityMismatch {
                        expected: types.len(),
                        actual: values.len(),
                    });
                }
                types
                    .iter()
                    .zip(values)
                    .enumerate()
                    .map(|(i, (ty, value))| self.encode_slot(ty, value, FieldLocation::Index(i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Json::Array)
            }
            (PayloadCodec::Object(fields), Payload::Struct(values)) => {
                let mut object = Map::with_capacity(fields.len());
                for (name, ty) in fields {
                    let value = values
                        .get(name)
                        .ok_or_else(|| EncodeError::MissingField(name.clone()))?;
                    object.insert(name.clone(), self.encode_slot(ty, value, FieldLocation::name(name))?);
                }
                Ok(Json::Object(object))
            }
            (codec, _) => Err(EncodeError::ShapeMismatch {
                name: owner.to_string(),
                expected: codec.shape_name(),
            }),
        }
    }

    fn encode_slot(&self, ty: &FieldType, value: &Value, at: FieldLocation) -> Result<Json, EncodeError> {
        match (ty, value) {
            (FieldType::String, Value::String(s)) => Ok(Json::String(s.clone())),
            (FieldType::Boolean, Value::Bool(b)) => Ok(Json::Bool(*b)),
            (FieldType::Signed(width), Value::Signed(n)) if signed_fits(*n, *width) => {
                Ok(Json::from(*n))
            }
            (FieldType::Unsigned(width), Value::Unsigned(n)) if unsigned_fits(*n, *width) => {
                Ok(Json::from(*n))
            }
            (FieldType::Reference(name), value) => {
                let codec = self
                    .get(name)
                    .ok_or_else(|| EncodeError::UnknownType(name.clone()))?;
                self.encode_definition(codec, value, at)
            }
            (FieldType::Sequence(inner), Value::Seq(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.encode_slot(inner, item, at.element(index)))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            (FieldType::Mapping(inner), Value::Map(entries)) => {
                let mut object = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    object.insert(key.clone(), self.encode_slot(inner, item, at.entry(key.as_str()))?);
                }
                Ok(Json::Object(object))
            }
            (ty, value) => Err(EncodeError::TypeMismatch {
                field: at,
                expected: ty.to_string(),
                actual: value.kind(),
            }),
        }
    }
}

fn decode_signed(wire: &Json, at: FieldLocation, width: IntWidth) -> DecodeResult<i64> {
    match width {
        IntWidth::W8 => decode_int::<i8>(wire, at).map(i64::from),
        IntWidth::W16 => decode_int::<i16>(wire, at).map(i64::from),
        IntWidth::W32 => decode_int::<i32>(wire, at).map(i64::from),
        IntWidth::W64 => decode_int::<i64>(wire, at),
    }
}

fn decode_unsigned(wire: &Json, at: FieldLocation, width: IntWidth) -> DecodeResult<u64> {
    match width {
        IntWidth::W8 => decode_int::<u8>(wire, at).map(u64::from),
        IntWidth::W16 => decode_int::<u16>(wire, at).map(u64::from),
        IntWidth::W32 => decode_int::<u32>(wire, at).map(u64::from),
        IntWidth::W64 => decode_int::<u64>(wire, at),
    }
}

fn signed_fits(n: i64, width: IntWidth) -> bool {
    match width {
        IntWidth::W8 => i8::try_from(n).is_ok(),
        IntWidth::W16 => i16::try_from(n).is_ok(),
        IntWidth::W32 => i32::try_from(n).is_ok(),
        IntWidth::W64 => true,
    }
}

fn unsigned_fits(n: u64, width: IntWidth) -> bool {
    match width {
        IntWidth::W8 => u8::try_from(n).is_ok(),
        IntWidth::W16 => u16::try_from(n).is_ok(),
        IntWidth::W32 => u32::try_from(n).is_ok(),
        IntWidth::W64 => true,
    }
}
