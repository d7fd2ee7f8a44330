//! Namespaced form field paths.
//!
//! Every field of one editor lives under `__attributes__{namespace}__.`.
//! Composite content appends a sub-field: `.codeTextArea` / `.language`
//! for code blocks, `.protectionLevel` for secrets, and `-content`,
//! `-fileName`, `-mimeType` for files. Hosts and test harnesses depend on
//! these strings, so they must not change.

use std::fmt;

pub const ATTRIBUTE_PREFIX: &str = "__attributes__";

/// Name of the add-attribute dropdown control.
pub const ADD_CUSTOM_ATTRIBUTE_CONTROL: &str = "selectAddCustomAttribute";

pub const CODE_TEXT_AREA: &str = "codeTextArea";
pub const CODE_LANGUAGE: &str = "language";
pub const SECRET_PROTECTION_LEVEL: &str = "protectionLevel";
pub const FILE_CONTENT: &str = "content";
pub const FILE_NAME: &str = "fileName";
pub const FILE_MIME_TYPE: &str = "mimeType";

const FILE_PARTS: [&str; 3] = [FILE_CONTENT, FILE_NAME, FILE_MIME_TYPE];

/// Base storage path of one descriptor's field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(namespace: &str, name: &str) -> Self {
        FieldPath(format!("{}{}__.{}", ATTRIBUTE_PREFIX, namespace, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dotted sub-field, e.g. `….code.codeTextArea`.
    pub fn sub(&self, field: &str) -> String {
        format!("{}.{}", self.0, field)
    }

    /// Dashed file part, e.g. `….cert-fileName`.
    pub fn part(&self, field: &str) -> String {
        format!("{}-{}", self.0, field)
    }

    /// Whether `key` is this field or one of its sub-fields.
    pub fn owns(&self, key: &str) -> bool {
        let Some(rest) = key.strip_prefix(self.0.as_str()) else {
            return false;
        };
        rest.is_empty()
            || rest.starts_with('.')
            || rest
                .strip_prefix('-')
                .is_some_and(|p| FILE_PARTS.contains(&p))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix shared by every field of a namespace.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{}{}__.", ATTRIBUTE_PREFIX, namespace)
}

/// Control name of the add-attribute dropdown for a namespace.
pub fn add_attribute_control(namespace: &str) -> String {
    format!("{}{}", ADD_CUSTOM_ATTRIBUTE_CONTROL, namespace)
}

/// Split a field key into `(namespace, remainder)`.
///
/// The remainder is the descriptor name plus any sub-field suffix.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(ATTRIBUTE_PREFIX)?;
    let idx = rest.find("__.")?;
    Some((&rest[..idx], &rest[idx + 3..]))
}
