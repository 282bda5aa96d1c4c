//! Serial port transport.
//!
//! The Pico enumerates as a USB CDC ACM device, so the baud rate is nominal,
//! but it is still applied for boards that sit behind a USB-UART bridge.
//! Line settings are fixed at 8N1 with no flow control, which is what the
//! firmware console uses.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{self, Instant};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

use super::{not_connected, Transport};
use crate::codec::LineBuffer;
use crate::error::{Error, Result};
use crate::tracing::prelude::*;

const READ_CHUNK: usize = 256;

/// Serial port transport to the device.
pub struct SerialTransport {
    /// The underlying serial port stream; `None` once closed.
    port: Option<SerialStream>,
    /// Port name for logging
    port_name: String,
    /// Bytes read from the port but not yet returned as lines.
    rx: LineBuffer,
}

impl SerialTransport {
    /// Open `port` at `baud_rate`, 8N1, no flow control.
    ///
    /// Failure is reported as [`Error::Connect`].
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let stream = tokio_serial::new(port, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|source| Error::Connect {
                port: port.to_string(),
                baud_rate,
                source,
            })?;

        debug!(port = %port, baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(stream),
            port_name: port.to_string(),
            rx: LineBuffer::new(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn stream(&mut self) -> Result<&mut SerialStream> {
        self.port.as_mut().ok_or_else(|| Error::Io(not_connected()))
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        let buffered = self.rx.len();
        let queued = self.stream()?.bytes_to_read()? as usize;
        Ok(buffered + queued)
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(line) = self.rx.next_line() {
                return Ok(line);
            }

            let stream = self.stream()?;
            let read = time::timeout_at(deadline, stream.read(&mut chunk)).await;
            match read {
                Ok(Ok(0)) => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("{} closed by device", self.port_name),
                    )));
                }
                Ok(Ok(n)) => self.rx.push(&chunk[..n]),
                Ok(Err(e)) => return Err(e.into()),
                Err(_elapsed) => {
                    trace!(port = %self.port_name, "Line read timed out");
                    return Ok(self.rx.take_partial().unwrap_or_default());
                }
            }
        }
    }

    fn discard_partial(&mut self) {
        let dropped = self.rx.discard();
        if dropped > 0 {
            debug!(port = %self.port_name, bytes = dropped, "Discarding unread bytes");
        }
        if let Some(port) = &self.port {
            if let Err(e) = port.clear(ClearBuffer::Input) {
                warn!(port = %self.port_name, error = %e, "Clearing input queue failed");
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.port.take() {
            // Best effort; the port is released on drop regardless.
            if let Err(e) = stream.flush().await {
                warn!(port = %self.port_name, error = %e, "Flush on close failed");
            }
            debug!(port = %self.port_name, "Serial port closed");
        }
        self.rx.clear();
        Ok(())
    }
}
