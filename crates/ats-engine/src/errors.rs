use thiserror::Error;

/// Engine-level error type. Every pipeline stage returns `Result<T, EngineError>`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Missing or empty input; never retried on another backend.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-empty input that cannot be segmented into words.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
