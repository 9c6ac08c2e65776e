//! Error types for sas-client.

use thiserror::Error;

/// Main error type for all SAS client operations.
#[derive(Debug, Error)]
pub enum SasError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (analytics payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (malformed frame on decode).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A string does not fit its length prefix.
    #[error("String of {len} bytes exceeds maximum of {max} bytes")]
    StringTooLong { len: usize, max: usize },

    /// A variable parameter does not fit its 2-byte length prefix.
    #[error("Variable parameter of {len} bytes exceeds maximum of {max} bytes")]
    ParameterTooLong { len: usize, max: usize },

    /// The message would no longer fit the 2-byte frame length.
    #[error("Message of {len} bytes exceeds maximum frame size of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// Compression scheme name not recognised.
    #[error("Unknown compression scheme: {0}")]
    UnknownCompression(String),

    /// Compressing a parameter failed.
    #[error("Compression failed: {0}")]
    Compression(String),

    /// Connecting to the server took too long.
    #[error("Connection timed out")]
    ConnectTimeout,

    /// Writing a frame took too long.
    #[error("Send timed out")]
    SendTimeout,

    /// Delivery queue is full - message discarded.
    #[error("Message queue full")]
    QueueFull,

    /// The worker is gone and the queue no longer accepts messages.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias using SasError.
pub type Result<T> = std::result::Result<T, SasError>;
