use std::fmt;

use mapping_types::Release;
use serde::Serialize;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no release survived composition and analysis")]
    NoReleases,

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Types(#[from] mapping_types::TypesError),

    #[error(transparent)]
    Ancestry(#[from] mapping_ancestry::AncestryError),

    #[error(transparent)]
    Emit(#[from] mapping_emit::EmitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        Self::Settings(err.to_string())
    }
}

/// Stage at which a release dropped out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Compose,
    Analyze,
    Panic,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Compose => write!(f, "compose"),
            Self::Analyze => write!(f, "analyze"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

/// A release removed from the sequence before ancestry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReleaseFailure {
    pub release: String,
    pub stage: Stage,
    pub message: String,
}

impl ReleaseFailure {
    pub fn new(release: &Release, stage: Stage, message: impl fmt::Display) -> Self {
        Self {
            release: release.id.clone(),
            stage,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "release {} failed at {}: {}", self.release, self.stage, self.message)
    }
}
