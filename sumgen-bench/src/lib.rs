//! # sumgen Bench
//!
//! Fixtures shared by the sumgen benchmarks: a reference schema covering
//! every payload shape, its codec plan and a batch of variant values.

use sumgen_codegen::{CodecPlan, CodecSynthesizer, CodegenError, DispatchPlan, DispatchSynthesizer};
use sumgen_core::{Payload, Value, VariantValue};
use sumgen_schema::{SchemaIr, parse_schema};

/// Name of the benchmarked enum.
pub const ENUM_NAME: &str = "Order";

/// Reference schema used by every benchmark.
pub const SCHEMA: &str = r#"<sumSchema package="bench">
    <enum name="Order">
        <variant name="Cancel"/>
        <variant name="Symbol"><field type="string"/></variant>
        <variant name="Limit"><field type="string"/><field type="i64"/><field type="u32"/></variant>
        <variant name="Market">
            <field name="symbol" type="string"/>
            <field name="quantity" type="u32"/>
            <field name="tags" type="seq&lt;string&gt;"/>
        </variant>
        <variant name="Legs"><field type="seq&lt;Leg&gt;"/></variant>
    </enum>
    <struct name="Leg"><field type="string"/><field type="i64"/></struct>
</sumSchema>"#;

/// Resolves the reference schema.
///
/// # Errors
/// Returns `CodegenError` if the schema fails to parse or validate.
pub fn schema_ir() -> Result<SchemaIr, CodegenError> {
    let schema = parse_schema(SCHEMA)?;
    Ok(SchemaIr::from_schema(&schema)?)
}

/// Synthesizes the codec plan of the reference schema.
///
/// # Errors
/// Returns `CodegenError` if the schema fails to parse or validate.
pub fn codec_plan() -> Result<CodecPlan, CodegenError> {
    Ok(CodecSynthesizer::new(&schema_ir()?).synthesize())
}

/// Synthesizes the dispatch plan of the benchmarked enum.
///
/// # Errors
/// Returns `CodegenError` if the schema is invalid or lacks the enum.
pub fn dispatch_plan() -> Result<DispatchPlan, CodegenError> {
    DispatchSynthesizer::new(&schema_ir()?)
        .synthesize()
        .into_iter()
        .find(|plan| plan.enum_name == ENUM_NAME)
        .ok_or_else(|| CodegenError::generation("benchmark enum missing"))
}

/// One value of every variant of the benchmarked enum.
#[must_use]
pub fn sample_values() -> Vec<VariantValue> {
    let leg = |symbol: &str, price: i64| {
        Value::Record(Payload::Tuple(vec![symbol.into(), price.into()]))
    };

    vec![
        VariantValue::unit("Cancel"),
        VariantValue::new_type("Symbol", "AAPL"),
        VariantValue::tuple("Limit", vec!["AAPL".into(), 15_025i64.into(), Value::Unsigned(100)]),
        VariantValue::record(
            "Market",
            [
                ("symbol", Value::from("MSFT")),
                ("quantity", Value::Unsigned(250)),
                (
                    "tags",
                    Value::Seq(vec!["ioc".into(), "agency".into()]),
                ),
            ],
        ),
        VariantValue::new_type(
            "Legs",
            Value::Seq(vec![leg("AAPL", 15_025), leg("MSFT", -3_210), leg("GOOG", 0)]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_resolve() {
        let plan = codec_plan().expect("plan");
        assert!(plan.get_enum(ENUM_NAME).is_some());
        assert_eq!(dispatch_plan().expect("dispatch").arms.len(), 5);
    }

    #[test]
    fn test_sample_values_round_trip() {
        let plan = codec_plan().expect("plan");
        for value in sample_values() {
            let wire = plan.encode_variant(ENUM_NAME, &value).expect("encode");
            let decoded = plan
                .decode_variant(ENUM_NAME, &wire)
                .expect("enum defined")
                .expect("decode");
            assert_eq!(decoded, value);
        }
    }
}
