use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use usbcmd::config::{SessionConfig, Timing, DEFAULT_BAUD_RATE};
use usbcmd::ports;
use usbcmd::shell::{ExitReason, Shell};
use usbcmd::tracing::{self, prelude::*};
use usbcmd::Session;

const EXAMPLES: &str = "\
Examples:
  usbcmd                           # Auto-detect Pico port
  usbcmd /dev/ttyACM0              # Specify port
  usbcmd COM5                      # Windows
  usbcmd -v /dev/ttyACM0           # Verbose mode (show TX/RX)
  usbcmd -c \"mock_temp 30\"         # Run single command and exit
  usbcmd -l                        # List serial ports";

/// Interactive CLI for the DHT20 Sensor Project.
#[derive(Parser, Debug)]
#[command(name = "usbcmd", version, about, after_help = EXAMPLES)]
struct Args {
    /// Serial port (e.g. /dev/ttyACM0, COM5). Auto-detected when omitted.
    port: Option<String>,

    /// Baud rate
    #[arg(short, long = "baudrate", default_value_t = DEFAULT_BAUD_RATE)]
    baudrate: u32,

    /// Show every transmitted and received line
    #[arg(short, long)]
    verbose: bool,

    /// Execute a single command and exit
    #[arg(short, long)]
    command: Option<String>,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Overall response timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Silence in milliseconds that ends a response
    #[arg(long, value_name = "MS")]
    quiet_ms: Option<u64>,
}

impl Args {
    fn timing(&self) -> usbcmd::Result<Timing> {
        let mut timing = Timing::from_env()?;
        if let Some(ms) = self.timeout_ms {
            timing.overall_deadline = Duration::from_millis(ms);
        }
        if let Some(ms) = self.quiet_ms {
            timing.quiet_period = Duration::from_millis(ms);
        }
        timing.validate()?;
        Ok(timing)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing::init_stderr(args.verbose);

    if args.list {
        println!("Available serial ports:");
        for port in ports::list_ports().context("listing serial ports")? {
            println!("  {port}");
        }
        return Ok(());
    }

    let timing = args.timing()?;
    let port = match &args.port {
        Some(port) => port.clone(),
        None => ports::detect_port()?,
    };
    let config = SessionConfig::new(&port, args.baudrate).with_timing(timing);

    let session = Session::open(&config).await?;
    println!("Connected to {port} at {} baud\n", args.baudrate);

    let mut shell = Shell::new(session, std::io::stdout());

    if let Some(command) = &args.command {
        shell.run_once(command.trim()).await?;
        return Ok(());
    }

    let interrupt = CancellationToken::new();
    spawn_interrupt_watcher(interrupt.clone());

    let reason = shell.run(spawn_stdin_reader(), &interrupt).await?;
    info!(reason = %reason, "Exiting.");

    if reason == ExitReason::TransportFailure {
        std::process::exit(1);
    }
    Ok(())
}

// Stdin is read on a plain thread: a blocked read must not hold up runtime
// shutdown once the shell has finished.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn spawn_interrupt_watcher(interrupt: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                trace!("Ctrl-C received.");
                interrupt.cancel();
            }
            Err(e) => warn!(error = %e, "Unable to listen for Ctrl-C"),
        }
    });
}
