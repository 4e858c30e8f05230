//! Type code generation.
//!
//! Emits the type for each definition: a Rust `enum` with payload-carrying
//! variants for sum types, and a unit, tuple or record `struct` for struct
//! definitions. Enums optionally get `new_<variant>` constructors.

use super::{doc_comment, rust_ident};
use crate::generator::GeneratorConfig;
use sumgen_schema::{
    ResolvedDefinition, ResolvedEnum, ResolvedField, ResolvedStruct, ResolvedVariant, VariantShape,
};

/// Generator for type definitions.
pub struct TypeGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> TypeGenerator<'a> {
    /// Creates a new type generator.
    #[must_use]
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generates the type of one definition.
    #[must_use]
    pub fn generate(&self, definition: &ResolvedDefinition) -> String {
        match definition {
            ResolvedDefinition::Enum(enum_def) => {
                let mut output = self.generate_enum(enum_def);
                if self.config.emit_constructors {
                    output.push_str(&self.generate_constructors(enum_def));
                }
                output
            }
            ResolvedDefinition::Struct(struct_def) => self.generate_struct(struct_def),
        }
    }

    fn docs(&self, docs: Option<&str>, indent: &str) -> String {
        if self.config.emit_docs {
            doc_comment(docs, indent)
        } else {
            String::new()
        }
    }

    fn derive_line(&self) -> String {
        if self.config.derives.is_empty() {
            String::new()
        } else {
            format!("#[derive({})]\n", self.config.derives.join(", "))
        }
    }

    /// Generates an enum definition.
    fn generate_enum(&self, enum_def: &ResolvedEnum) -> String {
        let mut output = String::new();

        output.push_str(&self.docs(enum_def.docs.as_deref(), ""));
        output.push_str(&self.derive_line());
        output.push_str(&format!("pub enum {} {{\n", rust_ident(&enum_def.name)));

        for variant in &enum_def.variants {
            output.push_str(&self.docs(variant.docs.as_deref(), "    "));
            output.push_str(&self.generate_variant(variant));
        }

        output.push_str("}\n\n");
        output
    }

    fn generate_variant(&self, variant: &ResolvedVariant) -> String {
        let name = rust_ident(&variant.name);
        match variant.shape {
            VariantShape::Unit => format!("    {},\n", name),
            VariantShape::NewType | VariantShape::Tuple => {
                format!("    {}{},\n", name, self.positional(&variant.fields, "", "    "))
            }
            VariantShape::Struct => {
                let mut output = format!("    {} {{\n", name);
                for field in &variant.fields {
                    output.push_str(&self.docs(field.docs.as_deref(), "        "));
                    output.push_str(&format!(
                        "        {}: {},\n",
                        rust_ident(&field.binding),
                        field.rust_type
                    ));
                }
                output.push_str("    },\n");
                output
            }
        }
    }

    /// Renders a positional field list, one line unless a field is documented.
    fn positional(&self, fields: &[ResolvedField], visibility: &str, indent: &str) -> String {
        let documented = self.config.emit_docs && fields.iter().any(|f| f.docs.is_some());
        if !documented {
            let types: Vec<String> = fields
                .iter()
                .map(|f| format!("{}{}", visibility, f.rust_type))
                .collect();
            return format!("({})", types.join(", "));
        }

        let inner = format!("{}    ", indent);
        let mut output = String::from("(\n");
        for field in fields {
            output.push_str(&self.docs(field.docs.as_deref(), &inner));
            output.push_str(&format!("{}{}{},\n", inner, visibility, field.rust_type));
        }
        output.push_str(&format!("{})", indent));
        output
    }

    /// Generates `new_<variant>` constructors.
    fn generate_constructors(&self, enum_def: &ResolvedEnum) -> String {
        let mut output = String::new();
        output.push_str(&format!("impl {} {{\n", rust_ident(&enum_def.name)));

        for (i, variant) in enum_def.variants.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            let name = rust_ident(&variant.name);
            let params: Vec<String> = variant
                .fields
                .iter()
                .map(|f| format!("{}: {}", rust_ident(&f.binding), f.rust_type))
                .collect();
            let args: Vec<String> = variant.fields.iter().map(|f| rust_ident(&f.binding)).collect();
            let body = match variant.shape {
                VariantShape::Unit => format!("Self::{}", name),
                VariantShape::NewType | VariantShape::Tuple => {
                    format!("Self::{}({})", name, args.join(", "))
                }
                VariantShape::Struct => format!("Self::{} {{ {} }}", name, args.join(", ")),
            };

            output.push_str(&format!("    /// Creates a `{}` value.\n", variant.name));
            output.push_str("    #[must_use]\n");
            output.push_str(&format!(
                "    pub fn new_{}({}) -> Self {{\n",
                variant.handler_name,
                params.join(", ")
            ));
            output.push_str(&format!("        {}\n", body));
            output.push_str("    }\n");
        }

        output.push_str("}\n\n");
        output
    }

    /// Generates a struct definition.
    fn generate_struct(&self, struct_def: &ResolvedStruct) -> String {
        let mut output = String::new();
        let name = rust_ident(&struct_def.name);

        output.push_str(&self.docs(struct_def.docs.as_deref(), ""));
        output.push_str(&self.derive_line());

        match struct_def.shape {
            VariantShape::Unit => output.push_str(&format!("pub struct {};\n\n", name)),
            VariantShape::NewType | VariantShape::Tuple => output.push_str(&format!(
                "pub struct {}{};\n\n",
                name,
                self.positional(&struct_def.fields, "pub ", "")
            )),
            VariantShape::Struct => {
                output.push_str(&format!("pub struct {} {{\n", name));
                for field in &struct_def.fields {
                    output.push_str(&self.docs(field.docs.as_deref(), "    "));
                    output.push_str(&format!(
                        "    pub {}: {},\n",
                        rust_ident(&field.binding),
                        field.rust_type
                    ));
                }
                output.push_str("}\n\n");
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sumgen_schema::{SchemaIr, parse_schema};

    fn create_test_ir() -> SchemaIr {
        let xml = r#"<sumSchema package="test">
    <enum name="SimpleEnum" description="A simple enum">
        <variant name="VUnit"/>
        <variant name="VStr"><field type="string"/></variant>
        <variant name="VTuple"><field type="string"/><field type="i64"/></variant>
        <variant name="VStruct"><field name="vfield" type="string" description="The field"/></variant>
        <variant name="VKeyword"><field name="type" type="map&lt;bool&gt;"/></variant>
    </enum>
    <struct name="Marker"/>
    <struct name="Wrapper"><field type="seq&lt;u32&gt;"/></struct>
    <struct name="Pair"><field type="string"/><field type="i64" description="Count"/></struct>
    <struct name="Point"><field name="x" type="i32"/><field name="y" type="i32"/></struct>
</sumSchema>"#;
        let schema = parse_schema(xml).expect("Failed to parse");
        SchemaIr::from_schema(&schema).expect("Failed to resolve")
    }

    fn generate(name: &str, config: &GeneratorConfig) -> String {
        let ir = create_test_ir();
        let definition = ir.get(name).expect("definition");
        TypeGenerator::new(config).generate(definition)
    }

    #[test]
    fn test_generate_enum() {
        let output = generate("SimpleEnum", &GeneratorConfig::default());

        assert!(output.contains("/// A simple enum\n#[derive(Debug, Clone, PartialEq, Eq)]\npub enum SimpleEnum {"));
        assert!(output.contains("    VUnit,\n"));
        assert!(output.contains("    VStr(String),\n"));
        assert!(output.contains("    VTuple(String, i64),\n"));
        assert!(output.contains("        /// The field\n        vfield: String,\n"));
        assert!(output.contains("r#type: std::collections::BTreeMap<String, bool>,"));
    }

    #[test]
    fn test_generate_constructors() {
        let output = generate("SimpleEnum", &GeneratorConfig::default());

        assert!(output.contains("pub fn new_v_unit() -> Self {\n        Self::VUnit\n"));
        assert!(output.contains("pub fn new_v_tuple(f0: String, f1: i64) -> Self {"));
        assert!(output.contains("Self::VStruct { vfield }"));

        let config = GeneratorConfig::default().emit_constructors(false);
        assert!(!generate("SimpleEnum", &config).contains("new_v_unit"));
    }

    #[test]
    fn test_generate_structs() {
        let config = GeneratorConfig::default();
        assert!(generate("Marker", &config).contains("pub struct Marker;"));
        assert!(generate("Wrapper", &config).contains("pub struct Wrapper(pub Vec<u32>);"));
        assert!(generate("Point", &config).contains("    pub x: i32,\n    pub y: i32,\n"));

        let pair = generate("Pair", &config);
        assert!(pair.contains("pub struct Pair(\n    pub String,\n    /// Count\n    pub i64,\n);"));
    }

    #[test]
    fn test_generate_custom_derives() {
        let config = GeneratorConfig::default().derives(["Debug"]).emit_docs(false);
        let output = generate("Pair", &config);
        assert!(output.starts_with("#[derive(Debug)]\npub struct Pair(pub String, pub i64);"));

        let config = GeneratorConfig::default().derives(Vec::<String>::new());
        assert!(!generate("Marker", &config).contains("#[derive"));
    }
}
