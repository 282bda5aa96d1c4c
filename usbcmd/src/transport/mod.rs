//! Physical transport to the device.
//!
//! The [`Transport`] trait abstracts over the duplex byte channel to the
//! Pico. The transaction engine drives it; it carries no knowledge of the
//! command protocol beyond splitting received bytes into lines.
//!
//! - [`serial`]: USB CDC / RS-232 serial port
//! - [`mock`]: scripted transport for deterministic tests and demos

pub mod mock;
pub mod serial;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Asynchronous line-oriented transport to the device.
#[async_trait]
pub trait Transport: Send {
    /// Write raw bytes, returning once they have been handed to the link.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Number of received bytes that can be read without waiting.
    async fn bytes_available(&mut self) -> Result<usize>;

    /// Read one line, without its delimiter.
    ///
    /// Waits up to `timeout` for the delimiter. If it does not arrive, the
    /// bytes received so far are returned as a partial line, which may be
    /// empty.
    async fn read_line(&mut self, timeout: Duration) -> Result<String>;

    /// Drop bytes received but not yet returned as a line, including any
    /// partial line and anything still queued by the OS.
    ///
    /// If a line was cut off, the rest of it is dropped when it arrives.
    /// Used after an aborted transaction so stale bytes are not read as the
    /// start of the next response.
    fn discard_partial(&mut self);

    /// Close the transport. Later writes and reads fail.
    async fn close(&mut self) -> Result<()>;
}

pub(crate) fn not_connected() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "transport is closed")
}
