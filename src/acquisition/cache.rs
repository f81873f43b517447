//! Acquisition-side configuration snapshot.

use crate::config::CHANNEL_CAPACITY;
use crate::store::{ChannelConfig, Configuration};
use core::time::Duration;

/// An active channel as seen by the sampling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedChannel {
    /// Slot index in the channel table
    pub slot: usize,

    /// Slot configuration at the time of the snapshot
    pub config: ChannelConfig,
}

/// Configuration subset the sampling loop works from.
///
/// Built wholesale from a store snapshot and installed by swapping an `Arc`,
/// so the loop always sees one consistent version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionCache {
    sampling_interval_ms: u32,
    log_measurements: bool,
    channels: heapless::Vec<CachedChannel, CHANNEL_CAPACITY>,
}

impl AcquisitionCache {
    /// Extract the active channels, interval and log flag.
    pub fn from_configuration(config: &Configuration) -> Self {
        let mut channels = heapless::Vec::new();
        for (slot, entry) in config.channels.iter().enumerate() {
            if let Some(channel) = entry.config() {
                // Cannot overflow: one entry per slot at most
                let _ = channels.push(CachedChannel {
                    slot,
                    config: channel.clone(),
                });
            }
        }

        Self {
            sampling_interval_ms: config.sampling_interval_ms,
            log_measurements: config.log_measurements,
            channels,
        }
    }

    /// Sampling interval captured in this snapshot.
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.sampling_interval_ms))
    }

    /// Whether conversions should be logged.
    pub fn log_measurements(&self) -> bool {
        self.log_measurements
    }

    /// Active channels in slot order.
    pub fn channels(&self) -> &[CachedChannel] {
        &self.channels
    }
}
