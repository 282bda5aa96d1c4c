//! Common error types for usbcmd.
//!
//! This module provides a centralized Error enum using thiserror, with
//! conversions from the underlying I/O and serial error types. A transaction
//! that simply receives nothing is not an error; see
//! [`Outcome::Empty`](crate::engine::Outcome::Empty).

use thiserror::Error;

/// Main error type for usbcmd operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The serial port could not be opened. Fatal to the session.
    #[error("failed to connect to {port} at {baud_rate} baud: {source}")]
    Connect {
        port: String,
        baud_rate: u32,
        #[source]
        source: tokio_serial::Error,
    },

    /// I/O errors from tokio or std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A transaction was attempted after the session started closing.
    #[error("session is closed")]
    SessionClosed,

    /// The caller cancelled the transaction before it completed.
    #[error("transaction cancelled")]
    Cancelled,

    /// Auto-detection found no device to connect to.
    #[error("no Pico serial port found; pass the port explicitly or use --list")]
    NoPortFound,
}

impl Error {
    /// Whether this error came from the transport mid-transaction.
    ///
    /// After such a failure the session is unreliable and should be closed.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Serial(_))
    }
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
