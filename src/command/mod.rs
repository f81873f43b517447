//! Serial command interface.
//!
//! Two threads of control serve the line protocol:
//! - the **receiver** ([`run_receiver`]) pulls framed lines from a
//!   [`LineSource`] into a bounded queue;
//! - the **dispatcher** ([`CommandInterface::run_dispatcher`]) waits on that
//!   queue for one sampling interval, answers whatever arrives, and pushes the
//!   latest temperatures when the wait times out with streaming enabled.
//!
//! Replies are single-line JSON objects (see [`Reply`]). Unrecognized lines
//! are logged and get no reply.

use crate::acquisition::AcquisitionEngine;
use crate::adc::AdcUnit;
use crate::config::{
    CHANNEL_CAPACITY, COMMAND_QUEUE_LENGTH, MAX_COMMAND_LEN, RECEIVE_ERROR_BACKOFF_MS,
    RECEIVE_IDLE_POLL_MS, RESPONSE_CAPACITY,
};
use crate::error::{MonitorError, Result};
use crate::io::{LineSink, LineSource};
use crate::store::{ConfigStore, Flag};
use core::time::Duration;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};

// Sub-modules
pub mod reply;
pub mod table;

// Re-export key types
pub use reply::Reply;
pub use table::{COMMANDS, Command, CommandId, CommandMeta};

/// One received command line.
pub type CommandLine = heapless::String<MAX_COMMAND_LEN>;

/// Create the bounded queue between receiver and dispatcher.
pub fn command_queue() -> (SyncSender<CommandLine>, Receiver<CommandLine>) {
    mpsc::sync_channel(COMMAND_QUEUE_LENGTH)
}

/// What handling one line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Send this line back
    Reply(String),

    /// Nothing to send (empty or unrecognized line)
    Ignored,
}

/// Result of one dispatcher step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DispatchStep {
    /// A queued line was handled
    Handled,

    /// Wait timed out and the latest temperatures were pushed
    Streamed,

    /// Wait timed out with streaming off
    Idle,

    /// The receiver side of the queue is gone
    Disconnected,
}

/// Line protocol front end over the store and the acquisition engine.
pub struct CommandInterface<A: AdcUnit> {
    store: Arc<ConfigStore<A>>,
    engine: Arc<AcquisitionEngine<A>>,
}

impl<A: AdcUnit> core::fmt::Debug for CommandInterface<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandInterface")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<A: AdcUnit> CommandInterface<A> {
    /// Create the interface.
    pub fn new(store: Arc<ConfigStore<A>>, engine: Arc<AcquisitionEngine<A>>) -> Self {
        Self { store, engine }
    }

    /// Handle one received line.
    pub fn handle_line(&self, line: &str) -> CommandOutcome {
        let line = line.trim();
        if line.is_empty() {
            return CommandOutcome::Ignored;
        }

        match table::parse(line) {
            Ok(Some(command)) => {
                info!("Processing command: {}", line);
                CommandOutcome::Reply(self.execute(command))
            }
            Ok(None) => {
                warn!("Unknown command: {}", line);
                CommandOutcome::Ignored
            }
            Err(e) => {
                warn!("Rejected command '{}': {}", line, e);
                CommandOutcome::Reply(Reply::error(&e).to_json())
            }
        }
    }

    /// Run a parsed command; failures become error replies.
    pub fn execute(&self, command: Command) -> String {
        match self.run(command) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Command failed: {}", e);
                Reply::error(&e).to_json()
            }
        }
    }

    fn run(&self, command: Command) -> Result<String> {
        let reply = match command {
            Command::Help => Reply::help(),
            Command::Temperatures => return self.latest_json(),
            Command::ToggleStream => Reply::SerialStream {
                serial_stream_active: self.store.toggle_flag(Flag::StreamActive),
            },
            Command::ToggleTempLog => Reply::TempLog {
                temp_log_active: self.store.toggle_flag(Flag::LogMeasurements),
            },
            Command::ForceRefresh => {
                self.engine.force_refresh()?;
                Reply::CacheRefreshed {
                    temp_component_cache_refresh_ok: true,
                }
            }
            Command::SetInterval(ms) => {
                let ms = u32::try_from(ms)
                    .map_err(|_| MonitorError::InvalidArgument("sampling interval out of range"))?;
                self.store.set_sampling_interval(ms)?;
                Reply::SamplingInterval {
                    sampling_interval_ms: ms,
                }
            }
            Command::GetInterval => Reply::SamplingInterval {
                sampling_interval_ms: self.store.sampling_interval_ms(),
            },
            Command::IncrCal(index) => Reply::Calibration {
                index,
                cal_r: self.store.increment_calibration_offset(slot_index(index)?)?,
            },
            Command::DecrCal(index) => Reply::Calibration {
                index,
                cal_r: self.store.decrement_calibration_offset(slot_index(index)?)?,
            },
            Command::SetCal { index, offset } => {
                let offset = i32::try_from(offset)
                    .map_err(|_| MonitorError::InvalidArgument("calibration offset out of range"))?;
                Reply::Calibration {
                    index,
                    cal_r: self
                        .store
                        .set_calibration_offset(slot_index(index)?, offset)?,
                }
            }
        };
        Ok(reply.to_json())
    }

    fn latest_json(&self) -> Result<String> {
        let mut out = heapless::String::<RESPONSE_CAPACITY>::new();
        self.engine.get_latest_json(&mut out)?;
        Ok(String::from(out.as_str()))
    }

    // ------------------------------------------------------------------------
    // Dispatcher
    // ------------------------------------------------------------------------

    /// Push the latest temperatures if streaming is on.
    ///
    /// Returns whether a line was sent.
    pub fn stream_tick(&self, sink: &mut impl LineSink) -> Result<bool> {
        if !self.store.stream_active() {
            return Ok(false);
        }
        let json = self.latest_json()?;
        sink.send_line(&json)?;
        Ok(true)
    }

    /// Wait one sampling interval for a queued line and act on the result.
    pub fn dispatch_next(
        &self,
        queue: &Receiver<CommandLine>,
        sink: &mut impl LineSink,
    ) -> DispatchStep {
        let wait = Duration::from_millis(u64::from(self.store.sampling_interval_ms()));

        match queue.recv_timeout(wait) {
            Ok(line) => {
                debug!("Dequeued command: {}", line);
                if let CommandOutcome::Reply(reply) = self.handle_line(&line) {
                    if let Err(e) = sink.send_line(&reply) {
                        error!("Failed to send reply: {}", e);
                    }
                }
                DispatchStep::Handled
            }
            Err(RecvTimeoutError::Timeout) => match self.stream_tick(sink) {
                Ok(true) => DispatchStep::Streamed,
                Ok(false) => DispatchStep::Idle,
                Err(e) => {
                    error!("Failed to stream temperatures: {}", e);
                    DispatchStep::Idle
                }
            },
            Err(RecvTimeoutError::Disconnected) => DispatchStep::Disconnected,
        }
    }

    /// Dispatch until the receiver goes away.
    pub fn run_dispatcher(&self, queue: Receiver<CommandLine>, mut sink: impl LineSink) {
        info!("Command dispatcher started");
        while self.dispatch_next(&queue, &mut sink) != DispatchStep::Disconnected {}
        warn!("Command queue closed, dispatcher stopping");
    }
}

/// Translate a 1-based protocol index to a slot index.
///
/// Indices at or above the slot count pass through; the store rejects them.
fn slot_index(index: i64) -> Result<usize> {
    let zero_based = index.saturating_sub(1);
    usize::try_from(zero_based).map_err(|_| MonitorError::OutOfRange {
        index: zero_based,
        capacity: CHANNEL_CAPACITY,
    })
}

/// Receive lines and queue them until the dispatcher goes away.
///
/// A full queue drops the line. Transport errors back off briefly.
pub fn run_receiver(mut source: impl LineSource, queue: SyncSender<CommandLine>) {
    info!("Command receiver started");
    let mut line = CommandLine::new();

    loop {
        match source.receive_line(&mut line) {
            Ok(0) => std::thread::sleep(Duration::from_millis(RECEIVE_IDLE_POLL_MS)),
            Ok(_) => match queue.try_send(line.clone()) {
                Ok(()) => debug!("Queued command: {}", line),
                Err(TrySendError::Full(dropped)) => {
                    error!("Command queue full, dropping: {}", dropped);
                }
                Err(TrySendError::Disconnected(_)) => {
                    warn!("Dispatcher gone, receiver stopping");
                    return;
                }
            },
            Err(MonitorError::LineOverflow) => {
                warn!("Command longer than {} bytes discarded", MAX_COMMAND_LEN);
            }
            Err(e) => {
                error!("Receive failed: {}", e);
                std::thread::sleep(Duration::from_millis(RECEIVE_ERROR_BACKOFF_MS));
            }
        }
    }
}
