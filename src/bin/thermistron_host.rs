//! # thermistron-host
//!
//! Runs the monitor on the host against a simulated ADC. Commands are read
//! from stdin, replies and streamed temperatures go to stdout, logs go to
//! stderr (filter with `RUST_LOG`).
//!
//! ## Usage
//! ```bash
//! thermistron-host --interval-ms 2000 --stream
//! echo "get temps" | thermistron-host --base-celsius 18.5
//! ```

use clap::Parser;
use std::io::{BufRead, Write};
use std::time::Duration;
use thermistron::config::{MAX_COMMAND_LEN, RECEIVE_IDLE_POLL_MS};
use thermistron::store::{ConfigStore, Configuration};
use thermistron::{AdcSettings, LineSink, LineSource, MonitorError, SimulatedAdc, Thermistron};

#[derive(Parser)]
#[command(
    name = "thermistron-host",
    about = "Multi-channel thermistor monitor on a simulated ADC",
    version
)]
struct Cli {
    /// Initial sampling interval in milliseconds.
    #[arg(short, long, default_value_t = thermistron::config::DEFAULT_SAMPLING_INTERVAL_MS)]
    interval_ms: u32,

    /// Start with serial streaming enabled.
    #[arg(short, long)]
    stream: bool,

    /// Start with conversion logging enabled.
    #[arg(short, long)]
    log_temps: bool,

    /// Temperature the simulated thermistors hover around (°C).
    #[arg(short, long, default_value_t = 25.0)]
    base_celsius: f64,
}

/// Lines from stdin. After EOF it keeps reporting "no line".
struct StdinSource {
    stdin: std::io::Stdin,
    closed: bool,
}

impl LineSource for StdinSource {
    fn receive_line(
        &mut self,
        line: &mut heapless::String<MAX_COMMAND_LEN>,
    ) -> Result<usize, MonitorError> {
        line.clear();
        if self.closed {
            std::thread::sleep(Duration::from_millis(RECEIVE_IDLE_POLL_MS));
            return Ok(0);
        }

        let mut raw = String::new();
        let read = self
            .stdin
            .lock()
            .read_line(&mut raw)
            .map_err(|e| MonitorError::Transport(e.to_string()))?;
        if read == 0 {
            log::info!("stdin closed; still sampling (Ctrl-C to quit)");
            self.closed = true;
            return Ok(0);
        }

        line.push_str(raw.trim_end_matches(['\r', '\n']))
            .map_err(|_| MonitorError::LineOverflow)?;
        Ok(line.len())
    }
}

struct StdoutSink;

impl LineSink for StdoutSink {
    fn send_line(&mut self, line: &str) -> Result<(), MonitorError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| MonitorError::Transport(e.to_string()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = Configuration {
        sampling_interval_ms: cli.interval_ms,
        stream_active: cli.stream,
        log_measurements: cli.log_temps,
        ..Configuration::default()
    };
    let store = ConfigStore::with_config(config, Some(SimulatedAdc::new(cli.base_celsius)))?;

    let monitor = Thermistron::with_store(std::sync::Arc::new(store), AdcSettings::default())?;
    let running = monitor.start(
        StdinSource {
            stdin: std::io::stdin(),
            closed: false,
        },
        StdoutSink,
    )?;

    running.join()?;
    Ok(())
}
