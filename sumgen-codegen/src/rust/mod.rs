//! Rust code generation modules.

pub mod codec;
pub mod dispatch;
pub mod types;

pub use codec::CodecGenerator;
pub use dispatch::DispatchGenerator;
pub use types::TypeGenerator;

/// Keywords that cannot be used as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Keywords that need the `r#` prefix.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Renders a schema name as a Rust identifier.
#[must_use]
pub fn rust_ident(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Renders a string as a Rust string literal.
#[must_use]
pub fn str_literal(value: &str) -> String {
    format!("{:?}", value)
}

/// Renders documentation as `///` lines at the given indentation.
#[must_use]
pub fn doc_comment(docs: Option<&str>, indent: &str) -> String {
    let mut output = String::new();
    if let Some(docs) = docs {
        for line in docs.lines() {
            let line = line.trim();
            if line.is_empty() {
                output.push_str(&format!("{}///\n", indent));
            } else {
                output.push_str(&format!("{}/// {}\n", indent, line));
            }
        }
    }
    output
}
