use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("analysis report for release {report} cannot be applied to release {tree}")]
    ReleaseMismatch { report: String, tree: String },
}
