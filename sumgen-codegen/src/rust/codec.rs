//! Codec code generation.
//!
//! Renders a [`DefinitionCodec`] as `to_json`/`from_json` methods built on the
//! runtime `wire` helpers, so emitted code and the plan interpreter share one
//! decoding path.

use super::{rust_ident, str_literal};
use crate::codec::{DefinitionCodec, EnumCodec, PayloadCodec, RecordCodec, VariantCodec, WireForm};
use crate::generator::GeneratorConfig;
use sumgen_core::ExtraKeys;
use sumgen_schema::FieldType;

/// Generator for JSON codec implementations.
pub struct CodecGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> CodecGenerator<'a> {
    /// Creates a new codec generator.
    #[must_use]
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generates the codec of one definition.
    #[must_use]
    pub fn generate(&self, codec: &DefinitionCodec) -> String {
        match codec {
            DefinitionCodec::Enum(enum_codec) => self.generate_enum(enum_codec),
            DefinitionCodec::Record(record_codec) => self.generate_record(record_codec),
        }
    }

    fn extra_keys(&self) -> &'static str {
        match self.config.extra_keys {
            ExtraKeys::Reject => "wire::ExtraKeys::Reject",
            ExtraKeys::Ignore => "wire::ExtraKeys::Ignore",
        }
    }

    /// Generates the codec of an enum.
    fn generate_enum(&self, codec: &EnumCodec) -> String {
        let mut output = String::new();
        let tags: Vec<String> = codec.variants.iter().map(|v| str_literal(&v.tag)).collect();

        output.push_str(&format!("impl {} {{\n", rust_ident(&codec.name)));
        output.push_str("    /// Wire tags of every variant, in declaration order.\n");
        output.push_str(&format!(
            "    pub const WIRE_TAGS: &'static [&'static str] = &[{}];\n\n",
            tags.join(", ")
        ));

        // tag
        output.push_str("    /// Returns the wire tag of the held variant.\n");
        output.push_str("    #[must_use]\n");
        output.push_str("    pub fn tag(&self) -> &'static str {\n");
        if codec.variants.is_empty() {
            output.push_str("        match *self {}\n");
        } else {
            output.push_str("        match self {\n");
            for variant in &codec.variants {
                output.push_str(&format!(
                    "            {} => {},\n",
                    wildcard_pattern(variant),
                    str_literal(&variant.tag)
                ));
            }
            output.push_str("        }\n");
        }
        output.push_str("    }\n\n");

        // to_json
        output.push_str("    /// Encodes this value as externally tagged JSON.\n");
        output.push_str("    #[must_use]\n");
        output.push_str("    pub fn to_json(&self) -> Json {\n");
        if codec.variants.is_empty() {
            output.push_str("        match *self {}\n");
        } else {
            output.push_str("        match self {\n");
            for variant in &codec.variants {
                output.push_str(&self.generate_variant_encoder(variant));
            }
            output.push_str("        }\n");
        }
        output.push_str("    }\n\n");

        // from_json
        output.push_str(&self.generate_enum_decoder(codec));

        output.push_str("}\n\n");
        output
    }

    fn generate_variant_encoder(&self, variant: &VariantCodec) -> String {
        let tag = str_literal(&variant.tag);
        let pattern = binding_pattern(variant);
        match &variant.form {
            WireForm::BareTag => format!(
                "            {} => Json::String({}.to_string()),\n",
                pattern, tag
            ),
            WireForm::Wrapped(payload) => format!(
                "            {} => wire::tagged({}, {}),\n",
                pattern,
                tag,
                payload_encode(payload)
            ),
        }
    }

    fn generate_enum_decoder(&self, codec: &EnumCodec) -> String {
        let mut output = String::new();
        let units: Vec<&VariantCodec> = codec
            .variants
            .iter()
            .filter(|v| v.form == WireForm::BareTag)
            .collect();

        output.push_str("    /// Decodes an externally tagged JSON value.\n");
        output.push_str("    ///\n");
        output.push_str("    /// # Errors\n");
        output.push_str("    /// Returns `DecodeError` if the value is not a valid encoding.\n");
        output.push_str("    pub fn from_json(value: &Json) -> DecodeResult<Self> {\n");
        output.push_str(&format!(
            "        match wire::untag(value, {}, Self::WIRE_TAGS)? {{\n",
            self.extra_keys()
        ));

        // bare strings name unit variants only
        if units.is_empty() {
            output.push_str(
                "            wire::Tagged::Bare(tag) => Err(DecodeError::UnknownUnitTag(tag.to_string())),\n",
            );
        } else {
            output.push_str("            wire::Tagged::Bare(tag) => match tag {\n");
            for variant in &units {
                output.push_str(&format!(
                    "                {} => Ok(Self::{}),\n",
                    str_literal(&variant.tag),
                    rust_ident(&variant.name)
                ));
            }
            output.push_str(
                "                other => Err(DecodeError::UnknownUnitTag(other.to_string())),\n",
            );
            output.push_str("            },\n");
        }

        let wrapped: Vec<(&VariantCodec, &PayloadCodec)> = codec
            .variants
            .iter()
            .filter_map(|v| match &v.form {
                WireForm::Wrapped(payload) => Some((v, payload)),
                WireForm::BareTag => None,
            })
            .collect();
        let payload_binding = if wrapped.is_empty() { "_" } else { "payload" };

        output.push_str(&format!(
            "            wire::Tagged::Wrapped(tag, {}) => match tag {{\n",
            payload_binding
        ));
        for (variant, payload) in &wrapped {
            output.push_str(&self.generate_payload_decoder(variant, payload));
        }
        if !units.is_empty() {
            let unit_tags: Vec<String> = units.iter().map(|v| str_literal(&v.tag)).collect();
            output.push_str(&format!(
                "                {} => Err(DecodeError::UnrecognizedShape),\n",
                unit_tags.join(" | ")
            ));
        }
        output.push_str(
            "                other => Err(DecodeError::UnknownVariantTag(other.to_string())),\n",
        );
        output.push_str("            },\n");

        output.push_str("        }\n");
        output.push_str("    }\n");
        output
    }

    fn generate_payload_decoder(&self, variant: &VariantCodec, payload: &PayloadCodec) -> String {
        let tag = str_literal(&variant.tag);
        let name = rust_ident(&variant.name);
        match payload {
            PayloadCodec::Direct(ty) => format!(
                "                {} => Ok(Self::{}({})),\n",
                tag,
                name,
                decode_expr(ty, "payload", &index_location(0)) + "?"
            ),
            PayloadCodec::Array(types) => {
                let mut output = format!("                {} => {{\n", tag);
                output.push_str(&format!(
                    "                    let items = wire::expect_array(payload, {})?;\n",
                    types.len()
                ));
                output.push_str(&format!("                    Ok(Self::{}(\n", name));
                for (i, ty) in types.iter().enumerate() {
                    output.push_str(&format!(
                        "                        {}?,\n",
                        decode_expr(ty, &format!("&items[{}]", i), &index_location(i))
                    ));
                }
                output.push_str("                    ))\n");
                output.push_str("                }\n");
                output
            }
            PayloadCodec::Object(fields) => {
                let mut output = format!("                {} => {{\n", tag);
                output.push_str("                    let object = wire::expect_object(payload)?;\n");
                output.push_str(&format!("                    Ok(Self::{} {{\n", name));
                for (field_name, ty) in fields {
                    output.push_str(&format!(
                        "                        {}: {}?,\n",
                        rust_ident(field_name),
                        object_field_decode(field_name, ty)
                    ));
                }
                output.push_str("                    })\n");
                output.push_str("                }\n");
                output
            }
        }
    }

    /// Generates the codec of a struct definition.
    fn generate_record(&self, codec: &RecordCodec) -> String {
        let mut output = String::new();
        let name = rust_ident(&codec.name);

        output.push_str(&format!("impl {} {{\n", name));

        // to_json
        output.push_str("    /// Encodes this value as JSON.\n");
        output.push_str("    #[must_use]\n");
        output.push_str("    pub fn to_json(&self) -> Json {\n");
        match &codec.payload {
            None => output.push_str("        Json::Null\n"),
            Some(payload) => {
                let bindings = payload_bindings(payload).join(", ");
                match payload {
                    PayloadCodec::Object(_) => {
                        output.push_str(&format!("        let Self {{ {} }} = self;\n", bindings));
                    }
                    _ => output.push_str(&format!("        let Self({}) = self;\n", bindings)),
                }
                output.push_str(&format!("        {}\n", payload_encode(payload)));
            }
        }
        output.push_str("    }\n\n");

        // from_json
        output.push_str("    /// Decodes a JSON value.\n");
        output.push_str("    ///\n");
        output.push_str("    /// # Errors\n");
        output.push_str("    /// Returns `DecodeError` if the value is not a valid encoding.\n");
        output.push_str("    pub fn from_json(value: &Json) -> DecodeResult<Self> {\n");
        match &codec.payload {
            None => {
                output.push_str("        wire::decode_null(value, FieldLocation::Payload)?;\n");
                output.push_str("        Ok(Self)\n");
            }
            Some(PayloadCodec::Direct(ty)) => {
                output.push_str(&format!(
                    "        Ok(Self({}?))\n",
                    decode_expr(ty, "value", &index_location(0))
                ));
            }
            Some(PayloadCodec::Array(types)) => {
                output.push_str(&format!(
                    "        let items = wire::expect_array(value, {})?;\n",
                    types.len()
                ));
                output.push_str("        Ok(Self(\n");
                for (i, ty) in types.iter().enumerate() {
                    output.push_str(&format!(
                        "            {}?,\n",
                        decode_expr(ty, &format!("&items[{}]", i), &index_location(i))
                    ));
                }
                output.push_str("        ))\n");
            }
            Some(PayloadCodec::Object(fields)) => {
                output.push_str("        let object = wire::expect_object(value)?;\n");
                output.push_str("        Ok(Self {\n");
                for (field_name, ty) in fields {
                    output.push_str(&format!(
                        "            {}: {}?,\n",
                        rust_ident(field_name),
                        object_field_decode(field_name, ty)
                    ));
                }
                output.push_str("        })\n");
            }
        }
        output.push_str("    }\n");

        output.push_str("}\n\n");
        output
    }
}

/// Pattern matching a variant without binding its payload.
fn wildcard_pattern(variant: &VariantCodec) -> String {
    let name = rust_ident(&variant.name);
    match &variant.form {
        WireForm::BareTag => format!("Self::{}", name),
        WireForm::Wrapped(PayloadCodec::Object(_)) => format!("Self::{} {{ .. }}", name),
        WireForm::Wrapped(_) => format!("Self::{}(..)", name),
    }
}

/// Local name of the `index`-th payload field.
///
/// Payload fields are always bound under these names, never under their
/// schema names, so no field can shadow a local of the generated code.
#[must_use]
pub fn alias(index: usize) -> String {
    format!("f{}", index)
}

/// `name: fN` bindings of a named payload.
#[must_use]
pub fn named_bindings(fields: &[(String, FieldType)]) -> Vec<String> {
    fields
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{}: {}", rust_ident(name), alias(i)))
        .collect()
}

/// Pattern binding every payload field of a variant by reference.
fn binding_pattern(variant: &VariantCodec) -> String {
    let name = rust_ident(&variant.name);
    match &variant.form {
        WireForm::BareTag => format!("Self::{}", name),
        WireForm::Wrapped(PayloadCodec::Object(fields)) => {
            format!("Self::{} {{ {} }}", name, named_bindings(fields).join(", "))
        }
        WireForm::Wrapped(payload) => {
            format!("Self::{}({})", name, payload_bindings(payload).join(", "))
        }
    }
}

fn payload_bindings(payload: &PayloadCodec) -> Vec<String> {
    match payload {
        PayloadCodec::Direct(_) => vec![alias(0)],
        PayloadCodec::Array(types) => (0..types.len()).map(alias).collect(),
        PayloadCodec::Object(fields) => named_bindings(fields),
    }
}

/// Encoding of a payload whose fields are bound as `f0`, `f1`, ...
fn payload_encode(payload: &PayloadCodec) -> String {
    match payload {
        PayloadCodec::Direct(ty) => encode_expr(ty, &alias(0)),
        PayloadCodec::Array(types) => {
            let items: Vec<String> = types
                .iter()
                .enumerate()
                .map(|(i, ty)| encode_expr(ty, &alias(i)))
                .collect();
            format!("Json::Array(vec![{}])", items.join(", "))
        }
        PayloadCodec::Object(fields) => {
            let entries: Vec<String> = fields
                .iter()
                .enumerate()
                .map(|(i, (name, ty))| {
                    format!("({}.to_string(), {})", str_literal(name), encode_expr(ty, &alias(i)))
                })
                .collect();
            format!("Json::Object(Map::from_iter([{}]))", entries.join(", "))
        }
    }
}

fn index_location(index: usize) -> String {
    format!("FieldLocation::Index({})", index)
}

fn object_field_decode(name: &str, ty: &FieldType) -> String {
    let literal = str_literal(name);
    decode_expr(
        ty,
        &format!("wire::field(object, {})?", literal),
        &format!("FieldLocation::name({})", literal),
    )
}

/// Expression encoding the value behind reference `binding`.
#[must_use]
pub fn encode_expr(ty: &FieldType, binding: &str) -> String {
    match ty {
        FieldType::String => format!("Json::String({}.clone())", binding),
        FieldType::Signed(_) | FieldType::Unsigned(_) => format!("Json::from(*{})", binding),
        FieldType::Boolean => format!("Json::Bool(*{})", binding),
        FieldType::Reference(_) => format!("{}.to_json()", binding),
        FieldType::Sequence(inner) => format!(
            "Json::Array({}.iter().map(|item| {}).collect())",
            binding,
            encode_expr(inner, "item")
        ),
        FieldType::Mapping(inner) => format!(
            "Json::Object({}.iter().map(|(key, item)| (key.clone(), {})).collect())",
            binding,
            encode_expr(inner, "item")
        ),
    }
}

/// Expression decoding `value` (a `&Json`) into a `DecodeResult`.
#[must_use]
pub fn decode_expr(ty: &FieldType, value: &str, location: &str) -> String {
    match ty {
        FieldType::String => format!("wire::decode_string({}, {})", value, location),
        FieldType::Boolean => format!("wire::decode_bool({}, {})", value, location),
        FieldType::Signed(width) => format!(
            "wire::decode_int::<i{}>({}, {})",
            width.bits(),
            value,
            location
        ),
        FieldType::Unsigned(width) => format!(
            "wire::decode_int::<u{}>({}, {})",
            width.bits(),
            value,
            location
        ),
        FieldType::Reference(name) => format!(
            "{}::from_json({}).map_err(|error| error.within({}))",
            rust_ident(name),
            value,
            location
        ),
        FieldType::Sequence(inner) => format!(
            "wire::decode_seq({}, {}, |item, at| {})",
            value,
            location,
            decode_expr(inner, "item", "at")
        ),
        FieldType::Mapping(inner) => format!(
            "wire::decode_map({}, {}, |item, at| {})",
            value,
            location,
            decode_expr(inner, "item", "at")
        ),
    }
}
