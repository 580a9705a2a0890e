//! Error types for XML merging.

use thiserror::Error;

/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, patching or writing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Baseline or diff document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// A diff operation element could not be decoded.
    #[error("Invalid patch operation: {0}")]
    PatchFormat(#[from] PatchFormatError),

    /// A selector expression is malformed or cannot be evaluated.
    #[error("Invalid selector '{expression}': {message}")]
    Selector {
        /// The selector as written in the diff.
        expression: String,
        /// What went wrong.
        message: String,
    },

    /// An `add` or `replace` selector matched no node.
    #[error("No target for selector in '{operation}': {selector}")]
    TargetNotFound {
        /// Operation tag (`add` or `replace`).
        operation: &'static str,
        /// The selector as written in the diff.
        selector: String,
    },

    /// The selected node cannot take the requested operation.
    #[error("Invalid target for selector in '{operation}': {selector} ({reason})")]
    InvalidTarget {
        /// Operation tag.
        operation: &'static str,
        /// The selector as written in the diff.
        selector: String,
        /// Why the node was rejected.
        reason: &'static str,
    },

    /// The merged document could not be written.
    #[error("Serialization error: {0}")]
    Serialization(#[source] std::io::Error),

    /// I/O error while reading input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn selector(expression: &str, message: impl Into<String>) -> Self {
        Error::Selector {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}

/// Problems with the shape of a single diff operation element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchFormatError {
    /// The element tag is not `add`, `remove` or `replace`.
    #[error("Invalid merge operation {0}")]
    UnknownOperation(String),

    /// The operation has no `sel` attribute, or it is empty.
    #[error("Missing 'sel' attribute for {0}")]
    MissingSelector(String),

    /// The operation requires a payload child that is absent.
    #[error("Missing payload for {0}")]
    MissingPayload(String),

    /// The `type` attribute of an `add` is not of the form `@name`.
    #[error("Unsupported 'type' for add: {0}")]
    InvalidAttributeType(String),
}
