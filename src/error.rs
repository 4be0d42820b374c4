//! Error types for roverlink.

use thiserror::Error;

/// Main error type for all session operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Serial device error (open, configure, enumerate).
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error on the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `connect` or `attach` called while a live connection exists.
    #[error("session is already connected")]
    AlreadyConnected,

    /// `send` or `send_opcode` called without a live connection.
    #[error("session is not connected")]
    NotConnected,
}

/// Result type alias using LinkError.
pub type Result<T> = std::result::Result<T, LinkError>;
