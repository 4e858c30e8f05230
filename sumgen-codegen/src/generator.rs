//! Generation driver.
//!
//! [`Generator`] runs both synthesizers over a resolved schema and hands their
//! plans to the Rust emitters, one definition at a time in resolution order.

use crate::codec::{CodecPlan, CodecSynthesizer};
use crate::dispatch::{DispatchPlan, DispatchSynthesizer};
use crate::error::CodegenError;
use crate::rust::{CodecGenerator, DispatchGenerator, TypeGenerator};
use sumgen_core::{DecodeOptions, ExtraKeys};
use sumgen_schema::{ResolvedDefinition, SchemaIr};

/// Configuration for generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Path of the runtime crate used in emitted `use` lines.
    pub runtime_crate: String,
    /// Derives attached to every emitted type.
    pub derives: Vec<String>,
    /// Carry schema documentation into doc comments.
    pub emit_docs: bool,
    /// Emit `new_<variant>` constructor functions for enums.
    pub emit_constructors: bool,
    /// Emit handler sets and `apply` for enums.
    pub emit_dispatch: bool,
    /// Extra-keys policy baked into emitted decoders.
    pub extra_keys: ExtraKeys,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_crate: "sumgen_core".to_string(),
            derives: ["Debug", "Clone", "PartialEq", "Eq"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            emit_docs: true,
            emit_constructors: true,
            emit_dispatch: true,
            extra_keys: ExtraKeys::Reject,
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime crate path.
    #[must_use]
    pub fn runtime_crate(mut self, path: impl Into<String>) -> Self {
        self.runtime_crate = path.into();
        self
    }

    /// Replaces the derive list.
    #[must_use]
    pub fn derives<I, S>(mut self, derives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derives = derives.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables doc comments.
    #[must_use]
    pub fn emit_docs(mut self, enabled: bool) -> Self {
        self.emit_docs = enabled;
        self
    }

    /// Enables or disables constructor functions.
    #[must_use]
    pub fn emit_constructors(mut self, enabled: bool) -> Self {
        self.emit_constructors = enabled;
        self
    }

    /// Enables or disables dispatch code.
    #[must_use]
    pub fn emit_dispatch(mut self, enabled: bool) -> Self {
        self.emit_dispatch = enabled;
        self
    }

    /// Sets the extra-keys policy of emitted decoders.
    #[must_use]
    pub fn extra_keys(mut self, extra_keys: ExtraKeys) -> Self {
        self.extra_keys = extra_keys;
        self
    }

    /// Decode options matching the emitted decoders.
    #[must_use]
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::new().extra_keys(self.extra_keys)
    }
}

/// Rust code generator for a resolved schema.
pub struct Generator<'a> {
    ir: &'a SchemaIr,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    /// Creates a generator with the default configuration.
    #[must_use]
    pub fn new(ir: &'a SchemaIr) -> Self {
        Self::with_config(ir, GeneratorConfig::default())
    }

    /// Creates a generator with the given configuration.
    #[must_use]
    pub fn with_config(ir: &'a SchemaIr, config: GeneratorConfig) -> Self {
        Self { ir, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Synthesizes the codec plan handed to the codec emitter.
    #[must_use]
    pub fn codec_plan(&self) -> CodecPlan {
        CodecSynthesizer::new(self.ir)
            .with_options(self.config.decode_options())
            .synthesize()
    }

    /// Synthesizes the dispatch plans handed to the dispatch emitter.
    #[must_use]
    pub fn dispatch_plans(&self) -> Vec<DispatchPlan> {
        DispatchSynthesizer::new(self.ir).synthesize()
    }

    /// Generates Rust source for every definition.
    ///
    /// # Errors
    /// Returns `CodegenError` if the configuration is unusable or the plans
    /// disagree with the schema.
    pub fn generate(&self) -> Result<String, CodegenError> {
        if self.config.runtime_crate.trim().is_empty() {
            return Err(CodegenError::generation("runtime crate path is empty"));
        }

        let codec_plan = self.codec_plan();
        let dispatch_plans = self.dispatch_plans();

        let types = TypeGenerator::new(&self.config);
        let codecs = CodecGenerator::new(&self.config);
        let dispatch = DispatchGenerator::new(&self.config);

        let mut output = self.generate_header();

        for definition in &self.ir.definitions {
            tracing::debug!("Emitting definition '{}'", definition.name());

            output.push_str(&types.generate(definition));

            let codec = codec_plan
                .get(definition.name())
                .ok_or_else(|| CodegenError::UnknownType {
                    type_name: definition.name().to_string(),
                    context: "codec plan".to_string(),
                })?;
            output.push_str(&codecs.generate(codec));

            if let ResolvedDefinition::Enum(enum_def) = definition {
                if self.config.emit_dispatch {
                    let plan = dispatch_plans
                        .iter()
                        .find(|p| p.enum_name == enum_def.name)
                        .ok_or_else(|| CodegenError::UnknownType {
                            type_name: enum_def.name.clone(),
                            context: "dispatch plans".to_string(),
                        })?;
                    output.push_str(&dispatch.generate(plan));
                }
            }
        }

        Ok(output)
    }

    fn generate_header(&self) -> String {
        let mut output = String::new();
        let runtime = &self.config.runtime_crate;

        output.push_str(&format!(
            "// Generated by sumgen from package '{}'. Do not edit.\n\n",
            self.ir.package
        ));
        output.push_str("#[allow(unused_imports)]\n");
        output.push_str(&format!("use {}::wire::{{self, Json, Map}};\n", runtime));
        output.push_str("#[allow(unused_imports)]\n");
        output.push_str(&format!(
            "use {}::{{DecodeError, DecodeResult, FieldLocation}};\n\n",
            runtime
        ));

        output
    }
}
