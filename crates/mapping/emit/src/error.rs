use thiserror::Error;

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("name {name:?} cannot be written: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("unsupported header: {0}")]
    Header(String),

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}
