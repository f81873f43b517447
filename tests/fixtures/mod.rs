//! Test fixtures for thermistron testing.
//!
//! Provides:
//! - `ScriptedAdc` / `AdcControl`: AdcUnit with scriptable samples and faults
//! - `MockIo`: Test implementation of CharIo trait
//! - `RecordingSink`: LineSink that captures every sent line
//! - `ScriptedSource`: LineSource that replays a fixed list of lines
//! - `CountingListener`: ConfigListener that counts notifications

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thermistron::config::MAX_COMMAND_LEN;
use thermistron::{
    AdcChannel, AdcError, AdcUnit, Attenuation, CharIo, ConfigListener, LineSink, LineSource,
    MonitorError, Resolution,
};

/// Raw sample returned when a channel has no scripted value.
pub const MIDSCALE_RAW: u16 = 2047;

// ============================================================================
// ScriptedAdc - Test ADC Implementation
// ============================================================================

#[derive(Debug, Default)]
struct AdcScript {
    raw: HashMap<u8, u16>,
    read_failures: HashSet<u8>,
    bind_failures: HashSet<u8>,
    binds: usize,
    reads: usize,
}

/// Handle for steering a `ScriptedAdc` after it moved into the store.
#[derive(Debug, Clone, Default)]
pub struct AdcControl(Arc<Mutex<AdcScript>>);

impl AdcControl {
    fn script(&self) -> std::sync::MutexGuard<'_, AdcScript> {
        self.0.lock().unwrap()
    }

    /// Set the raw sample returned for `channel`.
    pub fn set_raw(&self, channel: u8, raw: u16) {
        self.script().raw.insert(channel, raw);
    }

    /// Make reads of `channel` fail (or succeed again).
    pub fn fail_reads(&self, channel: u8, fail: bool) {
        let mut script = self.script();
        if fail {
            script.read_failures.insert(channel);
        } else {
            script.read_failures.remove(&channel);
        }
    }

    /// Make binding `channel` fail (or succeed again).
    pub fn fail_binds(&self, channel: u8, fail: bool) {
        let mut script = self.script();
        if fail {
            script.bind_failures.insert(channel);
        } else {
            script.bind_failures.remove(&channel);
        }
    }

    /// Total `configure_channel` calls so far.
    pub fn binds(&self) -> usize {
        self.script().binds
    }

    /// Total `read_raw` calls so far.
    pub fn reads(&self) -> usize {
        self.script().reads
    }
}

/// ADC unit driven by an `AdcControl`.
#[derive(Debug)]
pub struct ScriptedAdc {
    control: AdcControl,
}

impl ScriptedAdc {
    /// Create the ADC and its control handle.
    pub fn new() -> (Self, AdcControl) {
        let control = AdcControl::default();
        (
            Self {
                control: control.clone(),
            },
            control,
        )
    }
}

impl AdcUnit for ScriptedAdc {
    fn configure_channel(
        &mut self,
        channel: AdcChannel,
        _resolution: Resolution,
        _attenuation: Attenuation,
    ) -> Result<(), AdcError> {
        let mut script = self.control.script();
        script.binds += 1;
        if script.bind_failures.contains(&channel.0) {
            return Err(AdcError::Driver(-1));
        }
        Ok(())
    }

    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, AdcError> {
        let mut script = self.control.script();
        script.reads += 1;
        if script.read_failures.contains(&channel.0) {
            return Err(AdcError::Timeout);
        }
        Ok(script.raw.get(&channel.0).copied().unwrap_or(MIDSCALE_RAW))
    }
}

// ============================================================================
// MockIo - Test I/O Implementation
// ============================================================================

/// Mock I/O for testing.
///
/// Provides in-memory character I/O with input queue and output capture.
#[derive(Debug, Default)]
pub struct MockIo {
    /// Input queue (simulates a terminal typing)
    input: VecDeque<char>,

    /// Output capture (collects all output)
    output: Vec<char>,
}

impl MockIo {
    /// Create MockIo with pre-loaded input string.
    pub fn with_input(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            output: Vec::new(),
        }
    }

    /// Add input to queue.
    pub fn push_input(&mut self, s: &str) {
        self.input.extend(s.chars());
    }

    /// Get captured output as string.
    pub fn output(&self) -> String {
        self.output.iter().collect()
    }

    /// Clear output buffer.
    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl CharIo for MockIo {
    type Error = ();

    fn get_char(&mut self) -> Result<Option<char>, Self::Error> {
        Ok(self.input.pop_front())
    }

    fn put_char(&mut self, c: char) -> Result<(), Self::Error> {
        self.output.push(c);
        Ok(())
    }
}

// ============================================================================
// Line transport fixtures
// ============================================================================

/// LineSink that records lines; clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// All lines sent so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Forget recorded lines.
    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

impl LineSink for RecordingSink {
    fn send_line(&mut self, line: &str) -> Result<(), MonitorError> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

/// LineSource that hands out a fixed list of lines, then reports idle.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
}

impl ScriptedSource {
    /// Replay `lines` in order.
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl LineSource for ScriptedSource {
    fn receive_line(
        &mut self,
        line: &mut heapless::String<MAX_COMMAND_LEN>,
    ) -> Result<usize, MonitorError> {
        line.clear();
        match self.lines.pop_front() {
            Some(next) => {
                line.push_str(&next).map_err(|_| MonitorError::LineOverflow)?;
                Ok(line.len())
            }
            None => Ok(0),
        }
    }
}

// ============================================================================
// CountingListener
// ============================================================================

/// Listener that counts notifications.
#[derive(Debug, Default)]
pub struct CountingListener {
    calls: AtomicUsize,
}

impl CountingListener {
    /// Notifications received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConfigListener for CountingListener {
    fn on_config_changed(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
