//! Interactive command client for the DHT20 Pico sensor firmware.
//!
//! The firmware speaks a line-oriented text protocol over USB serial with no
//! response terminator. This crate sends one command at a time and decides
//! each response is complete from arrival timing alone; see [`engine`].
//!
//! - [`session`] opens the port and owns the transport
//! - [`engine`] runs one command/response transaction
//! - [`transport`] is the byte channel, real or mocked
//! - [`shell`] is the interactive loop on top

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod ports;
pub mod quotes;
pub mod session;
pub mod shell;
pub mod tracing;
pub mod transport;

pub use engine::Outcome;
pub use error::{Error, Result};
pub use session::Session;
