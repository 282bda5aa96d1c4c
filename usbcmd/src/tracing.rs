//! Provide tracing, tailored to this program.
//!
//! At startup, the program should call [`init_stderr`] to install a tracing
//! subscriber. Log output goes to stderr so it never interleaves with the
//! device responses the shell prints on stdout.
//!
//! The rest of the program can include `use crate::tracing::prelude::*` for
//! convenient access to the `trace!()`, `debug!()`, `info!()`, `warn!()`, and
//! `error!()` macros.

use time::OffsetDateTime;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime},
    prelude::*,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

/// Initialize logging.
///
/// Filtering follows the environment variable RUST_LOG. Without it, the
/// default level is WARN, or DEBUG when `verbose` is set so that every
/// transmitted and received line is shown.
pub fn init_stderr(verbose: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose).into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(LocalTimer),
        )
        .init();
}

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

// Timestamps in local time to the millisecond. Serial traffic is bursty and
// the interesting gaps are tens of milliseconds apart.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or(OffsetDateTime::now_utc());
        let formatted = now
            .format(time::macros::format_description!(
                "[hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| std::fmt::Error)?;
        write!(w, "{}", formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_default_level() {
        assert_eq!(default_level(false), LevelFilter::WARN);
        assert_eq!(default_level(true), LevelFilter::DEBUG);
    }

    #[test]
    fn local_timer_writes_millisecond_timestamp() {
        let mut out = String::new();
        LocalTimer
            .format_time(&mut Writer::new(&mut out))
            .expect("timestamp formats");
        // hh:mm:ss.mmm
        assert_eq!(out.len(), 12);
        assert_eq!(&out[2..3], ":");
        assert_eq!(&out[8..9], ".");
    }
}
