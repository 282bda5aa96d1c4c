//! Interactive read-eval-print loop over a session.
//!
//! Each input line is parsed once into a [`ShellCommand`]. A small set of
//! local commands is handled here; everything else is forwarded to the
//! device as-is.

use std::io::Write;
use std::str::FromStr;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::Outcome;
use crate::error::{Error, Result};
use crate::quotes;
use crate::session::Session;
use crate::tracing::prelude::*;

pub const BANNER: &str = "
    ╔═══════════════════════════════════════════╗
    ║   DHT20 Sensor Project - Command Shell    ║
    ╚═══════════════════════════════════════════╝

    Type 'help' for the Pico's command list
    Type 'exit' to quit; anything else is sent to the Pico
";

pub const PROMPT: &str = "pico> ";

const NO_RESPONSE: &str = "NO RESPONSE";
const NO_HELP_RESPONSE: &str = "  (no response from Pico)";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Blank input; nothing to do.
    Nothing,
    /// Leave the shell and close the session.
    Exit,
    /// Ask the device for its own help text.
    Help,
    /// Forward the trimmed line to the device.
    Device(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(ascii_case_insensitive)]
enum LocalCommand {
    #[strum(serialize = "exit", serialize = "quit", serialize = "q")]
    Exit,
    #[strum(serialize = "help", serialize = "?")]
    Help,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Nothing;
        }

        match LocalCommand::from_str(line) {
            Ok(LocalCommand::Exit) => return ShellCommand::Exit,
            Ok(LocalCommand::Help) => return ShellCommand::Help,
            Err(_) => {}
        }

        // `exit` and `help` ignore any arguments; `help <topic>` still asks
        // for the device's help.
        let first = line.split_whitespace().next().unwrap_or_default();
        if first.eq_ignore_ascii_case("exit") {
            return ShellCommand::Exit;
        }
        if first.eq_ignore_ascii_case("help") {
            return ShellCommand::Help;
        }

        ShellCommand::Device(line.to_string())
    }
}

/// Why the shell stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ExitReason {
    /// The user typed an exit command.
    UserExit,
    /// Input reached end of file.
    EndOfInput,
    /// Ctrl-C.
    Interrupted,
    /// The transport failed; the session could not be trusted further.
    TransportFailure,
}

/// The interactive shell. Output goes to `out`.
pub struct Shell<W> {
    session: Session,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(session: Session, out: W) -> Self {
        Self { session, out }
    }

    /// Read commands from `input` until exit, end of input, interrupt, or a
    /// transport failure, then close the session.
    ///
    /// `interrupt` doubles as the cancellation signal for a transaction in
    /// flight. The session is closed on error as well.
    pub async fn run(
        &mut self,
        input: mpsc::Receiver<String>,
        interrupt: &CancellationToken,
    ) -> Result<ExitReason> {
        let reason = match self.repl(input, interrupt).await {
            Ok(reason) => reason,
            Err(e) => {
                error!(error = %e, "Shell failed");
                if let Err(close_err) = self.session.close().await {
                    warn!(error = %close_err, "Close after shell failure failed");
                }
                return Err(e);
            }
        };

        debug!(reason = %reason, "Shell stopping");
        self.farewell().await?;
        Ok(reason)
    }

    async fn repl(
        &mut self,
        mut input: mpsc::Receiver<String>,
        interrupt: &CancellationToken,
    ) -> Result<ExitReason> {
        writeln!(self.out, "{BANNER}")?;

        let reason = loop {
            write!(self.out, "{PROMPT}")?;
            self.out.flush()?;

            let line = tokio::select! {
                biased;

                _ = interrupt.cancelled() => {
                    writeln!(self.out, "\n\nInterrupted by user")?;
                    break ExitReason::Interrupted;
                }
                line = input.recv() => line,
            };

            let Some(line) = line else {
                writeln!(self.out)?;
                break ExitReason::EndOfInput;
            };

            let stop = match ShellCommand::parse(&line) {
                ShellCommand::Nothing => None,
                ShellCommand::Exit => Some(ExitReason::UserExit),
                ShellCommand::Help => self.forward("help", NO_HELP_RESPONSE, interrupt).await?,
                ShellCommand::Device(command) => {
                    self.forward(&command, NO_RESPONSE, interrupt).await?
                }
            };

            if let Some(reason) = stop {
                break reason;
            }
        };

        Ok(reason)
    }

    /// Send a single command, print its response, and close the session.
    pub async fn run_once(&mut self, command: &str) -> Result<Outcome> {
        let outcome = self.session.execute(command).await;
        if let Ok(outcome) = &outcome {
            self.print_outcome(outcome, NO_RESPONSE)?;
        }
        self.session.close().await?;
        outcome
    }

    async fn forward(
        &mut self,
        command: &str,
        on_empty: &str,
        interrupt: &CancellationToken,
    ) -> Result<Option<ExitReason>> {
        match self.session.execute_with_cancel(command, interrupt).await {
            Ok(outcome) => {
                self.print_outcome(&outcome, on_empty)?;
                Ok(None)
            }
            Err(Error::Cancelled) => {
                writeln!(self.out, "\n\nInterrupted by user")?;
                Ok(Some(ExitReason::Interrupted))
            }
            Err(e) if e.is_transport_failure() => {
                error!(error = %e, "Transport failed during transaction");
                writeln!(self.out, "✗ Serial error: {e}")?;
                Ok(Some(ExitReason::TransportFailure))
            }
            Err(e) => Err(e),
        }
    }

    fn print_outcome(&mut self, outcome: &Outcome, on_empty: &str) -> Result<()> {
        match outcome {
            Outcome::Lines(lines) => {
                for line in lines {
                    writeln!(self.out, "  {line}")?;
                }
            }
            Outcome::Empty => writeln!(self.out, "{on_empty}")?,
        }
        Ok(())
    }

    async fn farewell(&mut self) -> Result<()> {
        writeln!(self.out, "\n{}\n", quotes::random_quote())?;
        writeln!(self.out, "\nClosing connection... Goodbye!")?;
        self.out.flush()?;
        self.session.close().await
    }
}
