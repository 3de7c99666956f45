//! Error kinds for document operations.

use thiserror::Error;

/// Result alias for everything that touches the document.
pub type Result<T> = std::result::Result<T, AasError>;

/// Every way a document operation can fail. All of them are recoverable:
/// handlers validate before mutating, so the document is left as it was.
#[derive(Error, Debug)]
pub enum AasError {
    /// The operation needs a shell and none exists.
    #[error("No AAS exists. Please create an AAS first.")]
    NoShell,

    /// Re-adding a submodel or concept description id under the reject policy.
    #[error("{kind} with id '{id}' already exists")]
    DuplicateId { kind: &'static str, id: String },

    /// Re-adding an element name inside one submodel under the reject policy.
    #[error("Element '{name}' already exists in submodel '{submodel}'")]
    DuplicateName { submodel: String, name: String },

    #[error("Submodel '{0}' not found")]
    SubmodelNotFound(String),

    #[error("Property '{name}' not found in submodel '{submodel}'")]
    PropertyNotFound { submodel: String, name: String },

    #[error("Element '{0}' is not a Property")]
    NotAProperty(String),

    #[error("Invalid value type: {0}")]
    InvalidType(String),

    #[error("Invalid value for {value_type}: {reason}")]
    InvalidValue { value_type: String, reason: String },

    #[error("File '{0}' not found")]
    FileNotFound(String),

    #[error("Could not read AAS JSON: {0}")]
    DeserializationError(String),

    /// The file parsed but held no shell.
    #[error("No AAS found in file '{0}'")]
    NoAasFound(String),

    #[error("Unknown function: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments for {operation}: {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("Path '{0}' is outside the storage directory")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AasError {
    fn from(err: serde_json::Error) -> Self {
        AasError::DeserializationError(err.to_string())
    }
}
