//! Command/response transactions over a line-oriented link.
//!
//! The device protocol has no response terminator and no length prefix, so
//! completion is judged from arrival timing alone. A transaction writes one
//! command line, waits a short settle delay, then polls the transport with
//! two clocks running:
//!
//! - the **overall deadline**, a hard ceiling from the start of polling that
//!   bounds a device which never answers or never stops talking;
//! - the **quiet period**, restarted by every non-empty line, whose expiry
//!   after at least one line means the device has finished its burst.
//!
//! Blank lines are swallowed. They are not returned and do not restart the
//! quiet period, but reading one counts as activity, so the loop polls again
//! straight away instead of sleeping.

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::codec::encode_command;
use crate::config::Timing;
use crate::error::{Error, Result};
use crate::tracing::prelude::*;
use crate::transport::Transport;

/// Result of one completed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// One or more non-empty lines, trimmed, in arrival order.
    Lines(Vec<String>),
    /// Nothing arrived before the overall deadline.
    Empty,
}

impl Outcome {
    /// The received lines; empty for [`Outcome::Empty`].
    pub fn lines(&self) -> &[String] {
        match self {
            Outcome::Lines(lines) => lines,
            Outcome::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}

impl From<Vec<String>> for Outcome {
    fn from(lines: Vec<String>) -> Self {
        if lines.is_empty() {
            Outcome::Empty
        } else {
            Outcome::Lines(lines)
        }
    }
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
enum Completion {
    QuietPeriodElapsed,
    DeadlineReached,
}

/// Runs transactions against a transport with fixed timing.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    timing: Timing,
}

impl TransactionEngine {
    pub fn new(timing: Timing) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Send `command` and collect the response.
    ///
    /// Transport failures are returned as errors, never as
    /// [`Outcome::Empty`]. Nothing is retried.
    pub async fn execute(
        &self,
        transport: &mut dyn Transport,
        command: &str,
    ) -> Result<Outcome> {
        self.execute_with_cancel(transport, command, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but abandons the transaction when
    /// `cancel` fires.
    ///
    /// On cancellation any bytes the transport has buffered are discarded,
    /// since there is no way to resume mid-line, and [`Error::Cancelled`] is
    /// returned.
    pub async fn execute_with_cancel(
        &self,
        transport: &mut dyn Transport,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        let result = tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.run(transport, command) => result,
        };

        if matches!(result, Err(Error::Cancelled)) {
            debug!(command = %command, "Transaction cancelled");
            transport.discard_partial();
        }
        result
    }

    async fn run(&self, transport: &mut dyn Transport, command: &str) -> Result<Outcome> {
        let t = &self.timing;

        debug!(command = %command, "TX");
        transport.write(&encode_command(command)).await?;

        time::sleep(t.settle_after_write).await;

        let start = Instant::now();
        let deadline = start + t.overall_deadline;
        let mut last_data = start;
        let mut lines: Vec<String> = Vec::new();

        let completion = loop {
            let now = Instant::now();
            if now >= deadline {
                break Completion::DeadlineReached;
            }

            if transport.bytes_available().await? > 0 {
                let read_timeout = t.read_timeout.min(deadline - now);
                let raw = transport.read_line(read_timeout).await?;
                let line = raw.trim();
                if line.is_empty() {
                    trace!("Skipping blank line");
                    continue;
                }
                debug!(line = %line, "RX");
                lines.push(line.to_string());
                last_data = Instant::now();
            } else {
                if !lines.is_empty() && last_data.elapsed() >= t.quiet_period {
                    break Completion::QuietPeriodElapsed;
                }
                time::sleep(t.poll_interval).await;
            }
        };

        debug!(
            command = %command,
            lines = lines.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            completion = %completion,
            "Transaction complete"
        );

        Ok(lines.into())
    }
}
