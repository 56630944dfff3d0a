//! Error types for batch processing.

use quaver_core::CircuitError;
use thiserror::Error;

/// Errors raised while splitting, evaluating or reassembling a stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StreamError {
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    /// Per-chunk outputs disagree on how many terms they carry.
    #[error("Chunk {chunk} produced {got} terms, expected {expected}")]
    TermMismatch {
        chunk: usize,
        expected: usize,
        got: usize,
    },

    /// Channels of a multi-channel signal differ in length.
    #[error("Channel {channel} has {got} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        got: usize,
    },

    /// The chunk function failed.
    #[error("Chunk {index} failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: CircuitError,
    },

    /// A worker panicked or was cancelled.
    #[error("Worker error: {0}")]
    Worker(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
