//! Response-key naming conventions.

/// Maps declared field names to response keys.
///
/// Applied only when a selection carries no alias; aliases are always used
/// verbatim.
pub trait FieldNameConverter: Send + Sync {
    /// Converts a declared field name into a response key.
    fn convert(&self, declared: &str) -> String;
}

/// Keeps declared names unchanged. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsIsConverter;

impl FieldNameConverter for AsIsConverter {
    fn convert(&self, declared: &str) -> String {
        declared.to_string()
    }
}

/// Lower-cases the leading character, so `Name` becomes `name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseConverter;

impl FieldNameConverter for CamelCaseConverter {
    fn convert(&self, declared: &str) -> String {
        to_camel_case(declared)
    }
}

/// Converts a PascalCase name to camelCase.
pub fn to_camel_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Converts a camelCase name to snake_case.
pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_lowercase().next().unwrap());
        } else {
            result.push(c);
        }
    }
    result
}
