//! Generates the fixture modules compiled by the integration tests.

use std::path::{Path, PathBuf};
use sumgen_codegen::{GeneratorConfig, generate_from_file_with_config};

const SCHEMAS: &[(&str, &str)] = &[
    ("schemas/simple.xml", "simple.rs"),
    ("schemas/shadowing.xml", "shadowing.rs"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    for (schema, output) in SCHEMAS {
        let schema = Path::new(schema);
        println!("cargo:rerun-if-changed={}", schema.display());

        let config = GeneratorConfig::new().runtime_crate("sumgen::core");
        let code = generate_from_file_with_config(schema, config)?;
        std::fs::write(out_dir.join(output), code)?;
    }
    Ok(())
}
