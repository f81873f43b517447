//! Error types for monitor operations.
//!
//! `MonitorError` covers every failure the core can report, from rejected
//! configuration writes to per-sample hardware faults. Each variant maps to a
//! stable protocol code via [`MonitorError::code`], which is what the serial
//! interface puts in `{"error": "<code>"}` replies.

use crate::acquisition::convert::ConversionError;
use crate::adc::{AdcChannel, AdcError};
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = core::result::Result<T, MonitorError>;

/// Monitor error type.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Bad user-supplied value (interval below minimum, bad label, empty slot)
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Channel index outside `[0, capacity)`
    #[error("Index {index} out of range (capacity {capacity})")]
    OutOfRange {
        /// Requested index (0-based, or the raw protocol value when it cannot be translated)
        index: i64,
        /// Number of slots
        capacity: usize,
    },

    /// Listener is not registered
    #[error("Listener not found")]
    NotFound,

    /// Listener table is full
    #[error("Listener table full (capacity {0})")]
    ResourceExhausted(usize),

    /// Hardware capability unavailable at startup
    #[error("Initialization failed: {0}")]
    InitializationFailed(&'static str),

    /// ADC read failed for one sample
    #[error("Hardware read failed on channel {channel}: {source}")]
    HardwareReadFailure {
        /// Channel that failed
        channel: AdcChannel,
        /// Driver error
        source: AdcError,
    },

    /// ADC channel could not be configured during a cache rebuild
    #[error("Failed to bind channel {channel}: {source}")]
    ChannelBindFailure {
        /// Channel that failed
        channel: AdcChannel,
        /// Driver error
        source: AdcError,
    },

    /// Raw sample could not be turned into a temperature
    #[error("Measurement failed: {0}")]
    Measurement(#[from] ConversionError),

    /// Formatted output does not fit the caller's buffer
    #[error("Buffer too small: need {required} bytes, have {capacity}")]
    BufferTooSmall {
        /// Bytes required
        required: usize,
        /// Bytes available
        capacity: usize,
    },

    /// Command syntax not understood
    #[error("Malformed command")]
    MalformedCommand,

    /// Reply could not be serialized
    #[error("Encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Received line exceeded the line buffer
    #[error("Line buffer overflow")]
    LineOverflow,

    /// Transport I/O failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Thread of control could not be started
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl MonitorError {
    /// Protocol error code used in `{"error": "<code>"}` replies.
    pub fn code(&self) -> &'static str {
        match self {
            MonitorError::InvalidArgument(_) => "invalid_argument",
            MonitorError::OutOfRange { .. } => "out_of_range",
            MonitorError::NotFound => "not_found",
            MonitorError::ResourceExhausted(_) => "resource_exhausted",
            MonitorError::InitializationFailed(_) | MonitorError::Spawn(_) => {
                "initialization_failed"
            }
            MonitorError::HardwareReadFailure { .. } => "hardware_read_failure",
            MonitorError::ChannelBindFailure { .. } => "channel_bind_failure",
            MonitorError::Measurement(_) => "measurement_failure",
            MonitorError::BufferTooSmall { .. } => "buffer_too_small",
            MonitorError::MalformedCommand => "malformed_command",
            MonitorError::Encoding(_) => "encoding_failure",
            MonitorError::LineOverflow => "line_overflow",
            MonitorError::Transport(_) => "transport_failure",
        }
    }

    /// Shorthand for an out-of-range slot index.
    pub(crate) fn out_of_range(index: usize) -> Self {
        MonitorError::OutOfRange {
            index: index as i64,
            capacity: crate::config::CHANNEL_CAPACITY,
        }
    }
}
