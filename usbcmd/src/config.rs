//! Configuration management for usbcmd.
//!
//! Timing constants start from their defaults, may be overridden by
//! environment variables, and finally by command-line flags in the binary.

use std::time::Duration;

use crate::error::{Error, Result};

/// Baud rate used by the Pico firmware's USB CDC console.
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Timing constants of the connect and transaction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after opening the port before the session is ready. USB-serial
    /// bridges commonly reset the device on connect.
    pub settle_after_connect: Duration,

    /// Wait after writing a command before the first poll.
    pub settle_after_write: Duration,

    /// Silence after the last received line that completes a response.
    pub quiet_period: Duration,

    /// Hard ceiling on one transaction's read loop.
    pub overall_deadline: Duration,

    /// Sleep between polls while nothing is available.
    pub poll_interval: Duration,

    /// Longest a single line read waits for its delimiter.
    pub read_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_after_connect: Duration::from_millis(2000),
            settle_after_write: Duration::from_millis(100),
            quiet_period: Duration::from_millis(100),
            overall_deadline: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(10),
            read_timeout: Duration::from_millis(1000),
        }
    }
}

type Setter = fn(&mut Timing, Duration);

const ENV_OVERRIDES: &[(&str, Setter)] = &[
    ("USBCMD_SETTLE_AFTER_CONNECT_MS", |t, d| t.settle_after_connect = d),
    ("USBCMD_SETTLE_AFTER_WRITE_MS", |t, d| t.settle_after_write = d),
    ("USBCMD_QUIET_PERIOD_MS", |t, d| t.quiet_period = d),
    ("USBCMD_TIMEOUT_MS", |t, d| t.overall_deadline = d),
    ("USBCMD_POLL_INTERVAL_MS", |t, d| t.poll_interval = d),
    ("USBCMD_READ_TIMEOUT_MS", |t, d| t.read_timeout = d),
];

impl Timing {
    /// Defaults with any `USBCMD_*_MS` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply millisecond overrides looked up by variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        for (name, set) in ENV_OVERRIDES {
            if let Some(value) = lookup(name) {
                let ms = value.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!(
                        "{name} must be a whole number of milliseconds, got {value:?}"
                    ))
                })?;
                set(&mut self, Duration::from_millis(ms));
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would make the read loop spin or never run.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".into()));
        }
        if self.overall_deadline.is_zero() {
            return Err(Error::Config("overall timeout must be non-zero".into()));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::Config("read timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Serial port path (e.g. "/dev/ttyACM0" on Linux, "COM5" on Windows)
    pub port: String,

    pub baud_rate: u32,

    pub timing: Timing,
}

impl SessionConfig {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            timing: Timing::default(),
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_match_device_protocol() {
        let t = Timing::default();
        assert_eq!(t.settle_after_connect, Duration::from_millis(2000));
        assert_eq!(t.settle_after_write, Duration::from_millis(100));
        assert_eq!(t.quiet_period, Duration::from_millis(100));
        assert_eq!(t.overall_deadline, Duration::from_millis(5000));
        assert_eq!(t.poll_interval, Duration::from_millis(10));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn overrides_apply_by_name() {
        let t = Timing::default()
            .with_overrides(lookup(&[
                ("USBCMD_QUIET_PERIOD_MS", "250"),
                ("USBCMD_TIMEOUT_MS", " 8000 "),
            ]))
            .unwrap();
        assert_eq!(t.quiet_period, Duration::from_millis(250));
        assert_eq!(t.overall_deadline, Duration::from_millis(8000));
        assert_eq!(t.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn unparsable_override_is_config_error() {
        let err = Timing::default()
            .with_overrides(lookup(&[("USBCMD_POLL_INTERVAL_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("USBCMD_POLL_INTERVAL_MS")));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let err = Timing::default()
            .with_overrides(lookup(&[("USBCMD_POLL_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_deadline_rejected() {
        let t = Timing {
            overall_deadline: Duration::ZERO,
            ..Timing::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn session_config_defaults_timing() {
        let cfg = SessionConfig::new("/dev/ttyACM0", DEFAULT_BAUD_RATE);
        assert_eq!(cfg.timing, Timing::default());
        assert_eq!(cfg.baud_rate, 115200);
    }
}
