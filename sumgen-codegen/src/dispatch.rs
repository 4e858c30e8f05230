//! Dispatch synthesis.
//!
//! A [`DispatchPlan`] describes the exhaustive match operation of one enum:
//! the handler set type, one optional handler per variant and the
//! parameters each handler receives. Emitters render it; [`DispatchPlan::dispatcher`]
//! turns it into the runtime [`Dispatcher`] for dynamic values.

use sumgen_core::Dispatcher;
use sumgen_schema::{ResolvedEnum, SchemaIr, VariantShape};

/// One handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerParam {
    /// Binding name (`f0`, `f1`, ... for positional fields).
    pub name: String,
    /// Rust type of the field the parameter borrows.
    pub rust_type: String,
}

/// One arm of the dispatch match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchArm {
    /// Variant name.
    pub variant: String,
    /// Wire tag.
    pub tag: String,
    /// Snake case handler name; the setter is `on_<handler>`.
    pub handler: String,
    /// Payload shape.
    pub shape: VariantShape,
    /// Parameters passed to the handler, in declaration order.
    pub params: Vec<HandlerParam>,
}

impl DispatchArm {
    /// Name of the generated setter registering this arm's handler.
    #[must_use]
    pub fn setter_name(&self) -> String {
        format!("on_{}", self.handler)
    }
}

/// Dispatch description of one enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    /// Enum name.
    pub enum_name: String,
    /// Name of the handler set type.
    pub handlers_type: String,
    /// Arms in declaration order.
    pub arms: Vec<DispatchArm>,
}

impl DispatchPlan {
    /// Builds the dispatch plan of one enum.
    #[must_use]
    pub fn from_enum(enum_def: &ResolvedEnum) -> Self {
        let arms = enum_def
            .variants
            .iter()
            .map(|v| DispatchArm {
                variant: v.name.clone(),
                tag: v.tag.clone(),
                handler: v.handler_name.clone(),
                shape: v.shape,
                params: v
                    .fields
                    .iter()
                    .map(|f| HandlerParam {
                        name: f.binding.clone(),
                        rust_type: f.rust_type.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            enum_name: enum_def.name.clone(),
            handlers_type: enum_def.handlers_name(),
            arms,
        }
    }

    /// Looks up an arm by wire tag.
    #[must_use]
    pub fn arm(&self, tag: &str) -> Option<&DispatchArm> {
        self.arms.iter().find(|a| a.tag == tag)
    }

    /// Creates the runtime dispatcher for this enum.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(&self.enum_name, self.arms.iter().map(|a| a.tag.as_str()))
    }
}

/// Synthesizer deriving dispatch plans from a resolved schema.
pub struct DispatchSynthesizer<'a> {
    ir: &'a SchemaIr,
}

impl<'a> DispatchSynthesizer<'a> {
    /// Creates a new dispatch synthesizer.
    #[must_use]
    pub fn new(ir: &'a SchemaIr) -> Self {
        Self { ir }
    }

    /// Synthesizes one dispatch plan per enum, in resolution order.
    #[must_use]
    pub fn synthesize(&self) -> Vec<DispatchPlan> {
        let plans: Vec<DispatchPlan> = self.ir.enums().map(DispatchPlan::from_enum).collect();
        tracing::debug!(
            "Synthesized {} dispatch plans for package '{}'",
            plans.len(),
            self.ir.package
        );
        plans
    }
}
