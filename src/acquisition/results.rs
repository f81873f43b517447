//! Latest temperature per slot.

use super::cache::AcquisitionCache;
use crate::config::CHANNEL_CAPACITY;
use crate::error::{MonitorError, Result};
use crate::store::Label;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
struct ResultEntry {
    label: Label,
    celsius: f32,
}

/// Last measured temperature for every active slot.
///
/// Failed or not-yet-taken readings hold `NaN`.
#[derive(Debug, Clone, Default)]
pub struct ResultBuffer {
    entries: [Option<ResultEntry>; CHANNEL_CAPACITY],
}

/// JSON shape of the temperature report.
#[derive(Serialize)]
struct TemperatureReport<'a> {
    names: heapless::Vec<&'a str, CHANNEL_CAPACITY>,
    temperatures: heapless::Vec<Option<f64>, CHANNEL_CAPACITY>,
}

impl ResultBuffer {
    /// Create an empty buffer (no active slots).
    pub fn new() -> Self {
        Self::default()
    }

    /// Match the buffer to a newly installed cache.
    ///
    /// Slots that keep their label keep their reading; new or relabelled
    /// slots start at `NaN`; slots no longer active are cleared.
    pub fn align_to(&mut self, cache: &AcquisitionCache) {
        let mut next: [Option<ResultEntry>; CHANNEL_CAPACITY] = Default::default();
        for channel in cache.channels() {
            let celsius = match &self.entries[channel.slot] {
                Some(entry) if entry.label == channel.config.label => entry.celsius,
                _ => f32::NAN,
            };
            next[channel.slot] = Some(ResultEntry {
                label: channel.config.label.clone(),
                celsius,
            });
        }
        self.entries = next;
    }

    /// Store the reading for `slot` taken under `label`.
    ///
    /// Ignored when the slot is not in the buffer or now carries another
    /// label.
    pub fn record(&mut self, slot: usize, label: &Label, celsius: f32) {
        match self.entries.get_mut(slot) {
            Some(Some(entry)) if entry.label == *label => entry.celsius = celsius,
            _ => {}
        }
    }

    /// Latest reading for `slot`, if the slot is active.
    pub fn latest(&self, slot: usize) -> Option<f32> {
        self.entries
            .get(slot)
            .and_then(Option::as_ref)
            .map(|entry| entry.celsius)
    }

    /// Number of active slots in the buffer.
    pub fn active_count(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Render `{"names":[...],"temperatures":[...]}` into `out`.
    ///
    /// Temperatures are rounded to two decimals; `NaN` renders as `null`.
    /// When the report does not fit, `out` is left empty.
    pub fn write_json<const N: usize>(&self, out: &mut heapless::String<N>) -> Result<()> {
        out.clear();

        let mut report = TemperatureReport {
            names: heapless::Vec::new(),
            temperatures: heapless::Vec::new(),
        };
        for entry in self.entries.iter().flatten() {
            // Both vectors hold one element per slot at most
            let _ = report.names.push(entry.label.as_str());
            let _ = report.temperatures.push(round_centi(entry.celsius));
        }

        let json = serde_json::to_string(&report)?;
        if json.len() > N {
            return Err(MonitorError::BufferTooSmall {
                required: json.len(),
                capacity: N,
            });
        }
        out.push_str(&json).map_err(|_| MonitorError::BufferTooSmall {
            required: json.len(),
            capacity: N,
        })
    }
}

fn round_centi(celsius: f32) -> Option<f64> {
    if celsius.is_finite() {
        Some((f64::from(celsius) * 100.0).round() / 100.0)
    } else {
        None
    }
}
