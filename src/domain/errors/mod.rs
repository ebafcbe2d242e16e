// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Selected file does not declare a video MIME type
    #[error("Unsupported file type '{mime}': please choose a video file")]
    UnsupportedMediaType { mime: String },

    /// An action needs a selected file
    #[error("No video selected")]
    NoSourceFile,

    /// A trim is already in flight
    #[error("A trim is already in progress")]
    Busy,

    /// Engine runtime could not be located or started
    #[error("Failed to load media engine: {0}")]
    EngineLoad(String),

    /// Engine ran but reported failure
    #[error("Media engine exited with code {code}")]
    EngineExit { code: i32 },

    /// Engine reported success but produced nothing
    #[error("Media engine produced an empty output file")]
    EmptyOutput,

    /// Engine virtual filesystem error
    #[error("Media engine filesystem error: {0}")]
    EngineFs(String),

    /// Saving or sharing failed
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Metadata probe failed
    #[error("Failed to read media metadata: {0}")]
    Probe(String),

    /// Preview surface failed
    #[error("Preview failed: {0}")]
    Preview(String),

    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl DomainError {
    /// Whether the failure came out of the processing stage
    pub fn is_processing_failure(&self) -> bool {
        matches!(
            self,
            DomainError::EngineExit { .. } | DomainError::EmptyOutput | DomainError::EngineFs(_)
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}
