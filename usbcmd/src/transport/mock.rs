//! Scripted transport for deterministic testing of the transaction engine.
//!
//! [`MockTransport`] answers commands with pre-loaded replies. Each reply
//! chunk carries a delay measured from the moment its command was written,
//! so timing-sensitive behavior (quiet periods, deadlines, streams that
//! never go quiet) can be reproduced exactly under tokio's paused clock.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use usbcmd::transport::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! mock.on_command("status", [
//!     (Duration::from_millis(0), "STATUS: OK"),
//!     (Duration::from_millis(20), "TEMP: 23.5"),
//! ]);
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::{self, Instant};

use super::{not_connected, Transport};
use crate::codec::{decode_lossy, LineBuffer, LINE_DELIMITER};
use crate::error::{Error, Result};

/// One piece of a scripted reply.
#[derive(Debug, Clone)]
struct Chunk {
    /// Delay after the command was written.
    delay: Duration,
    data: Vec<u8>,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Commands without a scripted reply are accepted and answered with
/// silence. Replies are reusable: writing the same command twice schedules
/// the same reply twice.
#[derive(Debug)]
pub struct MockTransport {
    /// Replies keyed by command text, without the line delimiter.
    replies: HashMap<String, Vec<Chunk>>,
    /// Data waiting for its arrival time, ordered by that time.
    scheduled: VecDeque<(Instant, Vec<u8>)>,
    /// Data that has arrived but not yet been read.
    rx: LineBuffer,
    /// Log of all bytes written, one entry per `write()` call.
    sent_log: Vec<Vec<u8>>,
    connected: bool,
    fail_writes: bool,
    fail_reads: bool,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            scheduled: VecDeque::new(),
            rx: LineBuffer::new(),
            sent_log: Vec::new(),
            connected: true,
            fail_writes: false,
            fail_reads: false,
        }
    }

    /// Answer `command` with `lines`, each delivered newline-terminated
    /// after its delay.
    pub fn on_command<I, S>(&mut self, command: &str, lines: I)
    where
        I: IntoIterator<Item = (Duration, S)>,
        S: Into<String>,
    {
        let chunks = lines.into_iter().map(|(delay, line)| {
            let mut data = line.into().into_bytes();
            data.push(LINE_DELIMITER);
            (delay, data)
        });
        self.on_command_raw(command, chunks);
    }

    /// Answer `command` with raw byte chunks, delivered exactly as given.
    pub fn on_command_raw<I>(&mut self, command: &str, chunks: I)
    where
        I: IntoIterator<Item = (Duration, Vec<u8>)>,
    {
        let chunks = chunks
            .into_iter()
            .map(|(delay, data)| Chunk { delay, data })
            .collect();
        self.replies.insert(command.to_string(), chunks);
    }

    /// Deliver `data` unprompted, `delay` from now.
    pub fn inject(&mut self, delay: Duration, data: &[u8]) {
        self.schedule(Instant::now() + delay, data.to_vec());
    }

    /// Make every later `write()` fail with a broken pipe.
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Make every later availability check and read fail with a broken pipe.
    pub fn fail_reads(&mut self) {
        self.fail_reads = true;
    }

    /// All data written through this transport, one entry per `write()`.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        !self.connected
    }

    fn schedule(&mut self, at: Instant, data: Vec<u8>) {
        self.scheduled.push_back((at, data));
        self.scheduled.make_contiguous().sort_by_key(|(at, _)| *at);
    }

    /// Move everything whose arrival time has passed into the receive buffer.
    fn deliver_due(&mut self) {
        let now = Instant::now();
        while let Some((at, _)) = self.scheduled.front() {
            if *at > now {
                break;
            }
            if let Some((_, data)) = self.scheduled.pop_front() {
                self.rx.push(&data);
            }
        }
    }

    fn check_readable(&self) -> Result<()> {
        if !self.connected {
            return Err(Error::Io(not_connected()));
        }
        if self.fail_reads {
            return Err(Error::Io(broken_pipe("mock read failure")));
        }
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn broken_pipe(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, msg.to_string())
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::Io(not_connected()));
        }
        if self.fail_writes {
            return Err(Error::Io(broken_pipe("mock write failure")));
        }

        self.sent_log.push(data.to_vec());

        let command = decode_lossy(data.strip_suffix(&[LINE_DELIMITER]).unwrap_or(data));
        if let Some(chunks) = self.replies.get(&command).cloned() {
            let now = Instant::now();
            for chunk in chunks {
                self.schedule(now + chunk.delay, chunk.data);
            }
        }
        Ok(())
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        self.check_readable()?;
        self.deliver_due();
        Ok(self.rx.len())
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        self.check_readable()?;
        let deadline = Instant::now() + timeout;

        loop {
            self.deliver_due();
            if let Some(line) = self.rx.next_line() {
                return Ok(line);
            }
            match self.scheduled.front() {
                Some((at, _)) if *at <= deadline => {
                    let at = *at;
                    time::sleep_until(at).await;
                }
                _ => {
                    time::sleep_until(deadline).await;
                    self.deliver_due();
                    let line = self.rx.next_line().or_else(|| self.rx.take_partial());
                    return Ok(line.unwrap_or_default());
                }
            }
        }
    }

    fn discard_partial(&mut self) {
        // Anything not yet arrived is treated as sitting in the OS input
        // queue, which a real port clears too.
        self.scheduled.clear();
        self.rx.discard();
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.scheduled.clear();
        self.rx.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_after_its_delay() {
        let mut mock = MockTransport::new();
        mock.on_command("status", [(ms(50), "STATUS: OK")]);

        mock.write(b"status\n").await.unwrap();
        assert_eq!(mock.bytes_available().await.unwrap(), 0);

        time::sleep(ms(50)).await;
        assert_eq!(mock.bytes_available().await.unwrap(), "STATUS: OK\n".len());
        assert_eq!(mock.read_line(ms(10)).await.unwrap(), "STATUS: OK");
        assert_eq!(mock.bytes_available().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn read_line_waits_for_late_delimiter() {
        let mut mock = MockTransport::new();
        mock.on_command_raw(
            "split",
            [(ms(0), b"HUM".to_vec()), (ms(30), b"IDITY: 41%\n".to_vec())],
        );

        mock.write(b"split\n").await.unwrap();
        let start = Instant::now();
        assert_eq!(mock.read_line(ms(100)).await.unwrap(), "HUMIDITY: 41%");
        assert_eq!(start.elapsed(), ms(30));
    }

    #[tokio::test(start_paused = true)]
    async fn read_line_returns_partial_on_timeout() {
        let mut mock = MockTransport::new();
        mock.on_command_raw("trunc", [(ms(0), b"TEMP: 2".to_vec())]);

        mock.write(b"trunc\n").await.unwrap();
        let start = Instant::now();
        assert_eq!(mock.read_line(ms(40)).await.unwrap(), "TEMP: 2");
        assert_eq!(start.elapsed(), ms(40));
    }

    #[tokio::test]
    async fn unknown_command_is_silent_and_logged() {
        let mut mock = MockTransport::new();
        mock.write(b"bogus\n").await.unwrap();
        assert_eq!(mock.bytes_available().await.unwrap(), 0);
        assert_eq!(mock.sent_data(), &[b"bogus\n".to_vec()]);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_io_errors() {
        let mut mock = MockTransport::new();
        mock.fail_reads();
        assert!(matches!(mock.bytes_available().await, Err(Error::Io(_))));

        mock.fail_writes();
        assert!(matches!(mock.write(b"x\n").await, Err(Error::Io(_))));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_drops_pending_reply_and_resyncs() {
        let mut mock = MockTransport::new();
        mock.on_command_raw(
            "log",
            [(ms(0), b"partial li".to_vec()), (ms(100), b"ne\n".to_vec())],
        );

        mock.write(b"log\n").await.unwrap();
        assert_eq!(mock.bytes_available().await.unwrap(), 10);
        mock.discard_partial();

        // The tail of the dropped line reaches the port after the discard.
        mock.inject(ms(10), b"ne\nSTATUS: OK\n");
        time::sleep(ms(200)).await;
        assert_eq!(mock.read_line(ms(10)).await.unwrap(), "STATUS: OK");
        assert_eq!(mock.bytes_available().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_mock_rejects_io() {
        let mut mock = MockTransport::new();
        mock.close().await.unwrap();
        assert!(mock.is_closed());
        assert!(mock.write(b"status\n").await.is_err());
        assert!(mock.read_line(ms(1)).await.is_err());
    }
}
