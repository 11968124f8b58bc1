//! Scanning of `${...}` interpolations for variable references.
//!
//! Only references are extracted; expressions are never evaluated.

use std::sync::LazyLock;

use regex::Regex;

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").expect("static regex"));

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:module\.([A-Za-z0-9_-]+)\.([A-Za-z0-9_-]+)|var\.([A-Za-z0-9_-]+))")
        .expect("static regex")
});

/// A variable referenced from inside an interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterpolatedVariable {
    /// `module.<name>.<field>`
    Module { name: String, field: String },
    /// `var.<name>`
    User { name: String },
}

/// Collect every reference found in `value`, walking arrays and tables.
pub fn scan_value(value: &toml::Value, out: &mut Vec<InterpolatedVariable>) {
    match value {
        toml::Value::String(s) => scan_str(s, out),
        toml::Value::Array(items) => items.iter().for_each(|v| scan_value(v, out)),
        toml::Value::Table(table) => table.values().for_each(|v| scan_value(v, out)),
        _ => {}
    }
}

/// Collect every reference found in the interpolations of `s`.
pub fn scan_str(s: &str, out: &mut Vec<InterpolatedVariable>) {
    for block in INTERPOLATION.captures_iter(s) {
        let expr = &block[1];
        for caps in REFERENCE.captures_iter(expr) {
            if let (Some(name), Some(field)) = (caps.get(1), caps.get(2)) {
                out.push(InterpolatedVariable::Module {
                    name: name.as_str().to_string(),
                    field: field.as_str().to_string(),
                });
            } else if let Some(name) = caps.get(3) {
                out.push(InterpolatedVariable::User {
                    name: name.as_str().to_string(),
                });
            }
        }
    }
}
