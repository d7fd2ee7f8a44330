use std::collections::BTreeMap;

/// Errors raised while turning form state into attribute requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectError {
    /// The form value does not parse as the descriptor's content type.
    #[error("attribute '{name}': expected {expected}, got '{got}'")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// A composite value (file, code block) could not be encoded.
    #[error("attribute '{name}': {message}")]
    Encoding { name: String, message: String },
}

/// Errors returned by [`AttributeEditor`](crate::AttributeEditor) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// No descriptor with this name exists in the namespace.
    #[error("unknown attribute: {name}")]
    UnknownAttribute { name: String },

    /// The field path does not belong to any active descriptor.
    #[error("unknown field path: {path}")]
    UnknownField { path: String },

    /// The attribute is already in the active set.
    #[error("attribute already active: {name}")]
    AlreadyActive { name: String },

    /// Only optional custom attributes can be added by the user.
    #[error("attribute cannot be added: {name}")]
    NotSelectable { name: String },

    /// Required and base attributes cannot be removed.
    #[error("attribute cannot be removed: {name}")]
    NotRemovable { name: String },

    /// The operation only applies to another content type.
    #[error("attribute '{name}' is {actual}, not {expected}")]
    ContentTypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// The attribute is declared read-only.
    #[error("attribute is read-only: {name}")]
    ReadOnly { name: String },

    /// One or more fields failed validation; keyed by attribute name.
    #[error("validation failed for {} attribute(s)", errors.len())]
    Validation { errors: BTreeMap<String, String> },

    /// Callbacks kept firing past the round limit.
    #[error("callbacks did not settle after {rounds} rounds")]
    CallbackLoop { rounds: usize },

    #[error(transparent)]
    Collect(#[from] CollectError),
}
