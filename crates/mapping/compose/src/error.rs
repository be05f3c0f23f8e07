use thiserror::Error;

use crate::contributor::ContributorId;

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Contributor configuration errors. Any of them makes the release unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("duplicate contributor id: {0}")]
    DuplicateContributor(ContributorId),

    #[error("contributor {wrapper} wraps {inner}, which is not an earlier contributor")]
    UnknownInner {
        wrapper: ContributorId,
        inner: ContributorId,
    },

    #[error("contributor {inner} is wrapped more than once (second wrapper: {wrapper})")]
    AlreadyWrapped {
        wrapper: ContributorId,
        inner: ContributorId,
    },
}
