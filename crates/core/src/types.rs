use thiserror::Error;

/// The main error type for Plow operations
#[derive(Debug, Error)]
pub enum PlowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Task error: {0}")]
    Task(String),
}

/// Result type alias for Plow operations
pub type PlowResult<T> = Result<T, PlowError>;
