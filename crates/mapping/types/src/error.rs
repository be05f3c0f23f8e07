use thiserror::Error;

/// Result type for data model operations.
pub type TypesResult<T> = Result<T, TypesError>;

/// Errors from the mapping data model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("malformed descriptor {descriptor:?}: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },

    #[error("malformed class name {name:?}: {reason}")]
    MalformedClassName { name: String, reason: String },

    #[error("release not found in manifest: {0}")]
    UnknownRelease(String),

    #[error("inverted release range: {oldest} is newer than {newest}")]
    InvertedRange { oldest: String, newest: String },

    #[error("manifest parse error: {0}")]
    Manifest(String),
}
