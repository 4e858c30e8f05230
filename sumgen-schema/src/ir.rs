//! Intermediate representation for code generation.
//!
//! This module provides a validated, classified and ordered representation of
//! the schema. Every variant and struct is classified exactly once here, and
//! definitions are stored in resolution order: a definition always comes after
//! every definition its fields reference.

use crate::error::SchemaError;
use crate::shape::{VariantShape, classify, classify_struct};
use crate::types::{Definition, FieldType, Schema, SchemaField};
use crate::validation::validate_schema;
use std::collections::{HashMap, HashSet};

/// Intermediate representation of a schema for code generation.
#[derive(Debug, Clone)]
pub struct SchemaIr {
    /// Package name.
    pub package: String,
    /// Schema description.
    pub description: Option<String>,
    /// Resolved definitions in resolution order.
    pub definitions: Vec<ResolvedDefinition>,
    /// Name to position in `definitions`.
    index: HashMap<String, usize>,
}

impl SchemaIr {
    /// Creates an intermediate representation from a schema.
    ///
    /// # Errors
    /// Returns `SchemaError` if the schema fails validation or its
    /// definitions reference each other in a cycle.
    pub fn from_schema(schema: &Schema) -> Result<Self, SchemaError> {
        validate_schema(schema)?;
        let order = resolution_order(schema)?;

        let mut definitions = Vec::with_capacity(order.len());
        for idx in order {
            definitions.push(ResolvedDefinition::from_definition(&schema.definitions[idx])?);
        }

        let index = definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();

        Ok(Self {
            package: schema.package.clone(),
            description: schema.description.clone(),
            definitions,
            index,
        })
    }

    /// Gets a resolved definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedDefinition> {
        self.index.get(name).map(|&idx| &self.definitions[idx])
    }

    /// Gets a resolved enum by name.
    #[must_use]
    pub fn get_enum(&self, name: &str) -> Option<&ResolvedEnum> {
        match self.get(name)? {
            ResolvedDefinition::Enum(e) => Some(e),
            ResolvedDefinition::Struct(_) => None,
        }
    }

    /// Gets a resolved struct by name.
    #[must_use]
    pub fn get_struct(&self, name: &str) -> Option<&ResolvedStruct> {
        match self.get(name)? {
            ResolvedDefinition::Struct(s) => Some(s),
            ResolvedDefinition::Enum(_) => None,
        }
    }

    /// Definition names, dependencies first.
    pub fn resolution_order(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(ResolvedDefinition::name)
    }

    /// Iterates over the resolved enums in resolution order.
    pub fn enums(&self) -> impl Iterator<Item = &ResolvedEnum> {
        self.definitions.iter().filter_map(|d| match d {
            ResolvedDefinition::Enum(e) => Some(e),
            ResolvedDefinition::Struct(_) => None,
        })
    }

    /// Iterates over the resolved structs in resolution order.
    pub fn structs(&self) -> impl Iterator<Item = &ResolvedStruct> {
        self.definitions.iter().filter_map(|d| match d {
            ResolvedDefinition::Struct(s) => Some(s),
            ResolvedDefinition::Enum(_) => None,
        })
    }
}

/// Resolved definition.
#[derive(Debug, Clone)]
pub enum ResolvedDefinition {
    /// Sum type.
    Enum(ResolvedEnum),
    /// Product type.
    Struct(ResolvedStruct),
}

impl ResolvedDefinition {
    /// Resolves a schema definition.
    ///
    /// # Errors
    /// Returns `SchemaError` if a payload cannot be classified.
    pub fn from_definition(definition: &Definition) -> Result<Self, SchemaError> {
        Ok(match definition {
            Definition::Enum(enum_def) => {
                let mut variants = Vec::with_capacity(enum_def.variants.len());
                let mut handler_names = HashSet::new();
                for variant in &enum_def.variants {
                    let handler_name = to_snake_case(&variant.name);
                    if !handler_names.insert(handler_name.clone()) {
                        return Err(SchemaError::validation(format!(
                            "Variants of enum '{}' collide on handler name '{}'",
                            enum_def.name, handler_name
                        )));
                    }
                    variants.push(ResolvedVariant {
                        name: variant.name.clone(),
                        tag: variant.wire_tag().to_string(),
                        docs: variant.docs.clone(),
                        shape: classify(variant)?,
                        fields: resolve_fields(&variant.fields),
                        handler_name,
                    });
                }
                Self::Enum(ResolvedEnum {
                    name: enum_def.name.clone(),
                    docs: enum_def.docs.clone(),
                    variants,
                })
            }
            Definition::Struct(struct_def) => Self::Struct(ResolvedStruct {
                name: struct_def.name.clone(),
                docs: struct_def.docs.clone(),
                shape: classify_struct(struct_def)?,
                fields: resolve_fields(&struct_def.fields),
            }),
        })
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Enum(e) => &e.name,
            Self::Struct(s) => &s.name,
        }
    }

    /// Returns the definition documentation.
    #[must_use]
    pub fn docs(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => e.docs.as_deref(),
            Self::Struct(s) => s.docs.as_deref(),
        }
    }
}

/// Resolved enum.
#[derive(Debug, Clone)]
pub struct ResolvedEnum {
    /// Enum name.
    pub name: String,
    /// Documentation.
    pub docs: Option<String>,
    /// Variants in declaration order.
    pub variants: Vec<ResolvedVariant>,
}

impl ResolvedEnum {
    /// Returns every wire tag in declaration order.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.tag.as_str()).collect()
    }

    /// Looks up a variant by wire tag.
    #[must_use]
    pub fn get_variant(&self, tag: &str) -> Option<&ResolvedVariant> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    /// Name of the generated handler set type.
    #[must_use]
    pub fn handlers_name(&self) -> String {
        format!("{}Handlers", self.name)
    }
}

/// Resolved variant.
#[derive(Debug, Clone)]
pub struct ResolvedVariant {
    /// Variant name.
    pub name: String,
    /// Wire tag.
    pub tag: String,
    /// Documentation.
    pub docs: Option<String>,
    /// Payload shape.
    pub shape: VariantShape,
    /// Payload fields in declaration order.
    pub fields: Vec<ResolvedField>,
    /// Snake case name of the per-variant handler.
    pub handler_name: String,
}

/// Resolved struct.
#[derive(Debug, Clone)]
pub struct ResolvedStruct {
    /// Struct name.
    pub name: String,
    /// Documentation.
    pub docs: Option<String>,
    /// Payload shape.
    pub shape: VariantShape,
    /// Fields in declaration order.
    pub fields: Vec<ResolvedField>,
}

/// Resolved payload field.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// Field name; `None` for positional fields.
    pub name: Option<String>,
    /// Field type.
    pub ty: FieldType,
    /// Documentation.
    pub docs: Option<String>,
    /// Rust type holding values of this field.
    pub rust_type: String,
    /// Local binding used in generated code (`f0`, `f1`, ... for positional
    /// fields).
    pub binding: String,
}

fn resolve_fields(fields: &[SchemaField]) -> Vec<ResolvedField> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| ResolvedField {
            name: field.name.clone(),
            ty: field.ty.clone(),
            docs: field.docs.clone(),
            rust_type: field.ty.rust_type(),
            binding: field.name.clone().unwrap_or_else(|| format!("f{}", i)),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Computes definition indices with every dependency before its dependents.
/// Independent definitions keep declaration order.
fn resolution_order(schema: &Schema) -> Result<Vec<usize>, SchemaError> {
    let mut marks = vec![Mark::Unvisited; schema.definitions.len()];
    let mut order = Vec::with_capacity(schema.definitions.len());
    let mut path = Vec::new();

    for idx in 0..schema.definitions.len() {
        visit(schema, idx, &mut marks, &mut path, &mut order)?;
    }

    Ok(order)
}

fn visit(
    schema: &Schema,
    idx: usize,
    marks: &mut [Mark],
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), SchemaError> {
    match marks[idx] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            let start = path.iter().position(|&p| p == idx).unwrap_or(0);
            let mut names: Vec<&str> = path[start..]
                .iter()
                .map(|&p| schema.definitions[p].name())
                .collect();
            names.push(schema.definitions[idx].name());
            return Err(SchemaError::CircularReference {
                path: names.join(" -> "),
            });
        }
        Mark::Unvisited => {}
    }

    marks[idx] = Mark::Visiting;
    path.push(idx);

    let definition = &schema.definitions[idx];
    for field in definition.fields() {
        if let Some(dep) = field.ty.reference().and_then(|name| schema.position(name)) {
            visit(schema, dep, marks, path, order)?;
        }
    }

    path.pop();
    marks[idx] = Mark::Done;
    order.push(idx);
    Ok(())
}

/// Converts a string to snake_case.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() && i > 0 && !result.ends_with('_') {
            result.push('_');
        }
        result.push(c.to_ascii_lowercase());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;

    const NESTED_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sumSchema package="nested">
    <enum name="Outer">
        <variant name="Wrap">
            <field type="Inner"/>
        </variant>
        <variant name="Many">
            <field name="items" type="seq&lt;Pair&gt;"/>
        </variant>
    </enum>
    <enum name="Inner">
        <variant name="Leaf"/>
        <variant name="Node">
            <field type="Pair"/>
        </variant>
    </enum>
    <struct name="Pair">
        <field type="string"/>
        <field type="i64"/>
    </struct>
</sumSchema>"#;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("VUnit"), "v_unit");
        assert_eq!(to_snake_case("symbol"), "symbol");
        assert_eq!(to_snake_case("V_Tuple"), "v_tuple");
    }

    #[test]
    fn test_resolution_order_dependencies_first() {
        let schema = parse_schema(NESTED_SCHEMA).expect("Failed to parse");
        let ir = SchemaIr::from_schema(&schema).expect("Failed to resolve");

        let order: Vec<&str> = ir.resolution_order().collect();
        assert_eq!(order, vec!["Pair", "Inner", "Outer"]);
    }

    #[test]
    fn test_schema_ir_classifies_once() {
        let schema = parse_schema(NESTED_SCHEMA).expect("Failed to parse");
        let ir = SchemaIr::from_schema(&schema).expect("Failed to resolve");

        let outer = ir.get_enum("Outer").expect("Outer");
        assert_eq!(outer.tags(), vec!["Wrap", "Many"]);
        assert_eq!(outer.variants[0].shape, VariantShape::NewType);
        assert_eq!(outer.variants[1].shape, VariantShape::Struct);
        assert_eq!(outer.variants[1].handler_name, "many");
        assert_eq!(outer.handlers_name(), "OuterHandlers");

        let pair = ir.get_struct("Pair").expect("Pair");
        assert_eq!(pair.shape, VariantShape::Tuple);
        assert_eq!(pair.fields[0].binding, "f0");
        assert_eq!(pair.fields[1].rust_type, "i64");
        assert!(ir.get_enum("Pair").is_none());
    }

    #[test]
    fn test_circular_reference() {
        let xml = r#"<sumSchema package="cyclic">
    <enum name="A"><variant name="ToB"><field type="B"/></variant></enum>
    <enum name="B"><variant name="ToA"><field type="seq&lt;A&gt;"/></variant></enum>
</sumSchema>"#;
        let schema = parse_schema(xml).expect("Failed to parse");
        let err = SchemaIr::from_schema(&schema).expect_err("cycle");
        assert_eq!(
            err,
            SchemaError::CircularReference {
                path: "A -> B -> A".to_string()
            }
        );
    }

    #[test]
    fn test_handler_name_collision() {
        let xml = r#"<sumSchema package="clash">
    <enum name="Clash">
        <variant name="VUnit"/>
        <variant name="V_Unit"/>
    </enum>
</sumSchema>"#;
        let schema = parse_schema(xml).expect("Failed to parse");
        assert!(matches!(
            SchemaIr::from_schema(&schema),
            Err(SchemaError::Validation { .. })
        ));
    }

    #[test]
    fn test_schema_ir_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaIr>();
    }
}
