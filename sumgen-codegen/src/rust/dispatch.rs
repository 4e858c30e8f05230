//! Dispatch code generation.
//!
//! For each enum emits a handler set type with one optional boxed closure per
//! variant, builder-style `on_<variant>` setters, and an `apply` method that
//! runs the handler of the held variant.

use super::codec::alias;
use super::rust_ident;
use crate::dispatch::{DispatchArm, DispatchPlan};
use crate::generator::GeneratorConfig;
use sumgen_schema::VariantShape;

/// Generator for handler sets and `apply` methods.
pub struct DispatchGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> DispatchGenerator<'a> {
    /// Creates a new dispatch generator.
    #[must_use]
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generates the dispatch code of one enum.
    #[must_use]
    pub fn generate(&self, plan: &DispatchPlan) -> String {
        let mut output = String::new();
        output.push_str(&self.generate_handlers_struct(plan));
        output.push_str(&self.generate_handlers_impl(plan));
        output.push_str(&self.generate_apply(plan));
        output
    }

    fn generate_handlers_struct(&self, plan: &DispatchPlan) -> String {
        let mut output = String::new();

        if self.config.emit_docs {
            output.push_str(&format!(
                "/// Handlers for the variants of [`{}`].\n",
                rust_ident(&plan.enum_name)
            ));
            output.push_str("///\n");
            output.push_str("/// Variants without a handler yield `R::default()`.\n");
        }
        output.push_str("#[allow(clippy::type_complexity)]\n");
        output.push_str(&format!(
            "pub struct {}<'h, R, E> {{\n",
            plan.handlers_type
        ));
        for arm in &plan.arms {
            output.push_str(&format!(
                "    {}: Option<Box<dyn FnOnce({}) -> Result<R, E> + 'h>>,\n",
                rust_ident(&arm.handler),
                handler_params(arm)
            ));
        }
        output.push_str("    _marker: std::marker::PhantomData<(&'h (), fn() -> (R, E))>,\n");
        output.push_str("}\n\n");
        output
    }

    fn generate_handlers_impl(&self, plan: &DispatchPlan) -> String {
        let mut output = String::new();
        let handlers = &plan.handlers_type;

        output.push_str(&format!("impl<'h, R, E> {}<'h, R, E> {{\n", handlers));
        output.push_str("    /// Creates an empty handler set.\n");
        output.push_str("    #[must_use]\n");
        output.push_str("    pub fn new() -> Self {\n");
        output.push_str("        Self {\n");
        for arm in &plan.arms {
            output.push_str(&format!("            {}: None,\n", rust_ident(&arm.handler)));
        }
        output.push_str("            _marker: std::marker::PhantomData,\n");
        output.push_str("        }\n");
        output.push_str("    }\n");

        for arm in &plan.arms {
            output.push('\n');
            if self.config.emit_docs {
                output.push_str(&format!(
                    "    /// Registers the handler for `{}`.\n",
                    arm.variant
                ));
            }
            output.push_str("    #[must_use]\n");
            output.push_str(&format!(
                "    pub fn {}(mut self, handler: impl FnOnce({}) -> Result<R, E> + 'h) -> Self {{\n",
                arm.setter_name(),
                handler_params(arm)
            ));
            output.push_str(&format!(
                "        self.{} = Some(Box::new(handler));\n",
                rust_ident(&arm.handler)
            ));
            output.push_str("        self\n");
            output.push_str("    }\n");
        }
        output.push_str("}\n\n");

        output.push_str(&format!("impl<R, E> Default for {}<'_, R, E> {{\n", handlers));
        output.push_str("    fn default() -> Self {\n");
        output.push_str("        Self::new()\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");
        output
    }

    fn generate_apply(&self, plan: &DispatchPlan) -> String {
        let mut output = String::new();
        let handlers_param = if plan.arms.is_empty() {
            "_handlers"
        } else {
            "handlers"
        };

        output.push_str(&format!("impl {} {{\n", rust_ident(&plan.enum_name)));
        output.push_str("    /// Runs the handler registered for the held variant.\n");
        output.push_str("    ///\n");
        output.push_str("    /// # Errors\n");
        output.push_str("    /// Returns the error reported by the invoked handler.\n");
        output.push_str(&format!(
            "    pub fn apply<R: Default, E>(&self, {}: {}<'_, R, E>) -> Result<R, E> {{\n",
            handlers_param, plan.handlers_type
        ));

        if plan.arms.is_empty() {
            output.push_str("        match *self {}\n");
        } else {
            output.push_str("        match self {\n");
            for arm in &plan.arms {
                let args: Vec<String> = (0..arm.params.len()).map(alias).collect();
                output.push_str(&format!(
                    "            {} => match handlers.{} {{\n",
                    arm_pattern(arm),
                    rust_ident(&arm.handler)
                ));
                output.push_str(&format!(
                    "                Some(handler) => handler({}),\n",
                    args.join(", ")
                ));
                output.push_str("                None => Ok(R::default()),\n");
                output.push_str("            },\n");
            }
            output.push_str("        }\n");
        }

        output.push_str("    }\n");
        output.push_str("}\n\n");
        output
    }
}

/// Parameter list of a handler closure: one borrow per payload field.
fn handler_params(arm: &DispatchArm) -> String {
    arm.params
        .iter()
        .map(|p| format!("&{}", p.rust_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pattern binding the payload of an arm's variant as `f0`, `f1`, ...
fn arm_pattern(arm: &DispatchArm) -> String {
    let name = rust_ident(&arm.variant);
    match arm.shape {
        VariantShape::Unit => format!("Self::{}", name),
        VariantShape::NewType | VariantShape::Tuple => {
            let args: Vec<String> = (0..arm.params.len()).map(alias).collect();
            format!("Self::{}({})", name, args.join(", "))
        }
        VariantShape::Struct => {
            let fields: Vec<String> = arm
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}: {}", rust_ident(&p.name), alias(i)))
                .collect();
            format!("Self::{} {{ {} }}", name, fields.join(", "))
        }
    }
}
