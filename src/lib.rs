//! # thermistron
//!
//! Firmware core of a multi-channel thermistor monitor.
//!
//! **Key pieces:**
//! - **ConfigStore** - Mutex-guarded configuration with synchronous change notification
//! - **AcquisitionEngine** - Periodic sampler working from a cached configuration snapshot
//! - **CommandInterface** - Line protocol with JSON replies and optional streaming
//! - **Flexible I/O** - ADC capability trait plus line and character transport traits
//!
//! Bounded buffers come from `heapless`; the library logs through the `log`
//! facade and never installs a logger.
//!
//! ## Optional Features
//!
//! - `host` - `thermistron-host` binary (simulated ADC on stdin/stdout)

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::result_large_err)]

// ============================================================================
// Module Declarations
// ============================================================================

// Constants and errors
pub mod config;
pub mod error;

// Hardware and transport capabilities
pub mod adc;
pub mod io;

// Core components
pub mod acquisition;
pub mod command;
pub mod store;

// Startup and host support
pub mod runtime;
pub mod sim;

// ============================================================================
// Re-exports - Public API
// ============================================================================

// Capabilities
pub use adc::{AdcChannel, AdcError, AdcSettings, AdcUnit, Attenuation, Resolution};
pub use io::{CharIo, CharLineSink, CharLineSource, LineSink, LineSource};

// Error types
pub use error::{MonitorError, Result};

// Components
pub use acquisition::{AcquisitionEngine, EngineState};
pub use command::{CommandInterface, CommandOutcome, DispatchStep, Reply};
pub use store::{ChannelConfig, ChannelSlot, ConfigListener, ConfigStore, Configuration, Flag, Label};

// Runtime
pub use runtime::{RunningMonitor, Thermistron};
pub use sim::SimulatedAdc;

// ============================================================================
// Library Metadata
// ============================================================================

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
