use mapping_types::Namespace;
use thiserror::Error;

/// Result type for ancestry operations.
pub type AncestryResult<T> = Result<T, AncestryError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AncestryError {
    #[error("ancestry needs at least one release")]
    EmptySequence,

    #[error("ancestry task failed: {0}")]
    Task(String),

    #[error("namespace {0} is reserved and cannot carry lineage indices")]
    ReservedNamespace(Namespace),

    #[error("lineage index covers releases {expected:?}, got {found:?}")]
    SequenceMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}
