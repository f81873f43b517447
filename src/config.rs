//! Compile-time constants for capacities, defaults and link sizing.
//!
//! Everything here is fixed by the board design or the serial protocol.
//! Runtime-adjustable settings live in [`ConfigStore`](crate::store::ConfigStore).

use crate::adc::{Attenuation, Resolution};

// ============================================================================
// Channel and listener capacities
// ============================================================================

/// Number of physical thermistor slots on the board.
pub const CHANNEL_CAPACITY: usize = 6;

/// Maximum number of configuration listeners.
pub const LISTENER_CAPACITY: usize = 3;

/// Maximum label length in bytes.
pub const LABEL_CAPACITY: usize = 9;

// ============================================================================
// Sampling and calibration
// ============================================================================

/// Sampling interval installed at startup (ms).
pub const DEFAULT_SAMPLING_INTERVAL_MS: u32 = 10_000;

/// Smallest sampling interval accepted by the store (ms).
pub const MIN_SAMPLING_INTERVAL_MS: u32 = 1_000;

/// Step applied by `incr cal res` / `decr cal res` (ohms).
pub const CALIBRATION_STEP_OHMS: i32 = 1;

/// ADC resolution used to bind every active channel.
pub const DEFAULT_RESOLUTION: Resolution = Resolution::Bits12;

/// ADC attenuation used to bind every active channel.
pub const DEFAULT_ATTENUATION: Attenuation = Attenuation::Db12;

// ============================================================================
// Serial link sizing
// ============================================================================

/// Maximum command line length in bytes (excluding the line terminator).
pub const MAX_COMMAND_LEN: usize = 128;

/// Maximum number of words in a command line (phrase plus arguments).
pub const MAX_COMMAND_TOKENS: usize = 8;

/// Number of received lines that can wait for the dispatcher.
pub const COMMAND_QUEUE_LENGTH: usize = 5;

/// Capacity of the buffer used for streamed and requested temperature JSON.
pub const RESPONSE_CAPACITY: usize = 2048;

/// Pause after a transport error before the receiver tries again (ms).
pub const RECEIVE_ERROR_BACKOFF_MS: u64 = 100;

/// Pause between polls when the transport has no pending line (ms).
pub const RECEIVE_IDLE_POLL_MS: u64 = 20;
