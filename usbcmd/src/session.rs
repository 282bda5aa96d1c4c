//! Connection lifecycle around the transaction engine.
//!
//! A [`Session`] owns the transport from a successful open until close. It
//! runs at most one transaction at a time; `execute` takes `&mut self`, so
//! overlapping transactions cannot be expressed.

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::{SessionConfig, Timing};
use crate::engine::{Outcome, TransactionEngine};
use crate::error::{Error, Result};
use crate::tracing::prelude::*;
use crate::transport::{SerialTransport, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

/// An open connection to the device.
pub struct Session {
    transport: Box<dyn Transport>,
    engine: TransactionEngine,
    state: SessionState,
    /// Human-readable endpoint, e.g. the port path.
    endpoint: String,
}

impl Session {
    /// Open the serial port described by `config` and wait for the device to
    /// settle.
    ///
    /// Failure to open the port is [`Error::Connect`]; there is no retry.
    pub async fn open(config: &SessionConfig) -> Result<Self> {
        config.timing.validate()?;
        let transport = SerialTransport::open(&config.port, config.baud_rate)?;
        let session =
            Self::with_transport(Box::new(transport), config.timing, &config.port).await;
        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            "Connected"
        );
        Ok(session)
    }

    /// Build a session over an already-open transport.
    ///
    /// Applies the same settle-after-connect delay as [`Session::open`].
    pub async fn with_transport(
        transport: Box<dyn Transport>,
        timing: Timing,
        endpoint: &str,
    ) -> Self {
        trace!(
            endpoint = %endpoint,
            settle_ms = timing.settle_after_connect.as_millis() as u64,
            "Waiting for device to settle"
        );
        time::sleep(timing.settle_after_connect).await;

        Self {
            transport,
            engine: TransactionEngine::new(timing),
            state: SessionState::Open,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one command and collect its response.
    ///
    /// An I/O error leaves the session unreliable; the caller should close
    /// it rather than keep going.
    pub async fn execute(&mut self, command: &str) -> Result<Outcome> {
        self.ensure_open()?;
        self.engine.execute(self.transport.as_mut(), command).await
    }

    /// Send one command, abandoning it if `cancel` fires.
    pub async fn execute_with_cancel(
        &mut self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome> {
        self.ensure_open()?;
        self.engine
            .execute_with_cancel(self.transport.as_mut(), command, cancel)
            .await
    }

    /// Release the transport. Closing an already closed session does
    /// nothing.
    pub async fn close(&mut self) -> Result<()> {
        if self.state != SessionState::Open {
            return Ok(());
        }
        self.state = SessionState::Closing;
        let result = self.transport.close().await;
        self.state = SessionState::Closed;

        match &result {
            Ok(()) => info!(endpoint = %self.endpoint, "Connection closed"),
            Err(e) => warn!(endpoint = %self.endpoint, error = %e, "Error while closing"),
        }
        result
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closing | SessionState::Closed => Err(Error::SessionClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::time::Duration;
    use tokio::time::Instant;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    async fn open_mock(mock: MockTransport) -> Session {
        Session::with_transport(Box::new(mock), Timing::default(), "mock").await
    }

    #[tokio::test(start_paused = true)]
    async fn waits_settle_delay_before_ready() {
        let start = Instant::now();
        let session = open_mock(MockTransport::new()).await;
        assert_eq!(start.elapsed(), ms(2000));
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(session.endpoint(), "mock");
    }

    #[tokio::test(start_paused = true)]
    async fn executes_through_engine() {
        let mut mock = MockTransport::new();
        mock.on_command("status", [(ms(0), "STATUS: OK")]);
        let mut session = open_mock(mock).await;

        let outcome = session.execute("status").await.unwrap();

        assert_eq!(outcome, Outcome::Lines(vec!["STATUS: OK".into()]));
    }

    #[tokio::test(start_paused = true)]
    async fn close_is_idempotent_and_blocks_transactions() {
        let mut session = open_mock(MockTransport::new()).await;

        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.execute("status").await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
        let err = session
            .execute_with_cancel("status", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_is_distinct_from_empty() {
        let mut mock = MockTransport::new();
        mock.fail_writes();
        let mut session = open_mock(mock).await;

        let err = session.execute("status").await.unwrap_err();
        assert!(err.is_transport_failure());
    }

    #[tokio::test]
    async fn open_missing_port_is_connect_error() {
        let config = SessionConfig::new("/dev/usbcmd-no-such-port", 115200);
        match Session::open(&config).await {
            Err(Error::Connect { port, baud_rate, .. }) => {
                assert_eq!(port, "/dev/usbcmd-no-such-port");
                assert_eq!(baud_rate, 115200);
            }
            Err(other) => panic!("expected Connect error, got {other:?}"),
            Ok(_) => panic!("opening a missing port succeeded"),
        }
    }

    #[tokio::test]
    async fn open_rejects_invalid_timing() {
        let timing = Timing {
            poll_interval: Duration::ZERO,
            ..Timing::default()
        };
        let config = SessionConfig::new("/dev/ttyACM0", 115200).with_timing(timing);
        assert!(matches!(Session::open(&config).await, Err(Error::Config(_))));
    }
}
