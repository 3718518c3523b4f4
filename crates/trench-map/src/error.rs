//! Map generation and persistence error types.

/// Errors that can occur while generating, saving, or loading a map.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Generation parameters that cannot produce a usable map.
    #[error("invalid generation parameters: {0}")]
    InvalidParameters(String),

    /// Failed to read a save file from disk.
    #[error("failed to read map save: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write a save file to disk.
    #[error("failed to write map save: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse a save file.
    #[error("failed to parse map save: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize a save file.
    #[error("failed to serialize map save: {0}")]
    SerializeError(#[source] ron::Error),
}
