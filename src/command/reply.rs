//! Reply bodies.
//!
//! Every reply is a flat, single-line JSON object.

use super::table::COMMANDS;
use crate::error::MonitorError;
use serde::Serialize;

/// Structured reply to one command.
///
/// The temperature report is not listed here; it is rendered by the
/// acquisition engine and sent as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// `{"commands": "..."}`
    Help {
        /// Comma-separated command list
        commands: String,
    },

    /// `{"sampling_interval_ms": <int>}`
    SamplingInterval {
        /// Current interval
        sampling_interval_ms: u32,
    },

    /// `{"serial_stream_active": <bool>}`
    SerialStream {
        /// New flag value
        serial_stream_active: bool,
    },

    /// `{"temp_log_active": <bool>}`
    TempLog {
        /// New flag value
        temp_log_active: bool,
    },

    /// `{"temp_component_cache_refresh_ok": true}`
    CacheRefreshed {
        /// Always `true`; failures use [`Reply::Error`]
        temp_component_cache_refresh_ok: bool,
    },

    /// `{"index": <int>, "cal_R": <int>}`
    Calibration {
        /// 1-based slot index as sent by the client
        index: i64,
        /// Calibration offset after the command (ohms)
        #[serde(rename = "cal_R")]
        cal_r: i32,
    },

    /// `{"error": "<code>"}`
    Error {
        /// Protocol error code
        error: &'static str,
    },
}

impl Reply {
    /// Error reply for `err`.
    pub fn error(err: &MonitorError) -> Self {
        Reply::Error { error: err.code() }
    }

    /// `help` reply listing every command with its arguments.
    pub fn help() -> Self {
        let mut commands = String::new();
        for (i, meta) in COMMANDS.iter().enumerate() {
            if i > 0 {
                commands.push_str(", ");
            }
            commands.push_str(meta.phrase);
            commands.push_str(meta.usage);
        }
        Reply::Help { commands }
    }

    /// Render as compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| String::from(r#"{"error":"encoding_failure"}"#))
    }
}
