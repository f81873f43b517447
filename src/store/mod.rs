//! Canonical, thread-safe configuration store.
//!
//! `ConfigStore` owns the configuration singleton behind one mutex. Every
//! critical section is a plain field copy; the lock is never held across I/O
//! or listener delivery. After a successful mutation every registered
//! [`ConfigListener`] is invoked exactly once, on the caller's thread, before
//! the setter returns.

use crate::adc::{AdcChannel, AdcUnit};
use crate::config::{
    CALIBRATION_STEP_OHMS, CHANNEL_CAPACITY, DEFAULT_SAMPLING_INTERVAL_MS,
    MIN_SAMPLING_INTERVAL_MS,
};
use crate::error::{MonitorError, Result};
use log::{error, info};
use parking_lot::Mutex;
use std::sync::Arc;

// Sub-modules
pub mod channel;
pub mod listener;

// Re-export key types
pub use channel::{ChannelConfig, ChannelSlot, Label};
pub use listener::ConfigListener;

use listener::ListenerTable;

/// Boolean feature flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flag {
    /// Push temperature JSON unsolicited when idle
    StreamActive,

    /// Log every conversion
    LogMeasurements,
}

/// Snapshot of the runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Sampling period (ms), never below [`MIN_SAMPLING_INTERVAL_MS`]
    pub sampling_interval_ms: u32,

    /// Streaming enabled
    pub stream_active: bool,

    /// Conversion logging enabled
    pub log_measurements: bool,

    /// Channel table
    pub channels: [ChannelSlot; CHANNEL_CAPACITY],
}

impl Configuration {
    /// Number of active slots, derived from the slot contents.
    pub fn active_channel_count(&self) -> usize {
        self.channels.iter().filter(|slot| slot.is_active()).count()
    }

    fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::StreamActive => self.stream_active,
            Flag::LogMeasurements => self.log_measurements,
        }
    }

    fn flag_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::StreamActive => &mut self.stream_active,
            Flag::LogMeasurements => &mut self.log_measurements,
        }
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut ChannelSlot> {
        self.channels
            .get_mut(index)
            .ok_or_else(|| MonitorError::out_of_range(index))
    }
}

impl Default for Configuration {
    /// Board defaults: five populated thermistors and one free slot.
    fn default() -> Self {
        const BOARD: [(&str, u32, u8); CHANNEL_CAPACITY - 1] = [
            ("Therm1", 9_782, 0),
            ("Therm2", 9_795, 1),
            ("Therm3", 9_888, 2),
            ("Therm4", 9_963, 3),
            ("Therm5", 10_233, 4),
        ];

        let channels = core::array::from_fn(|index| {
            let Some(&(name, divider, channel)) = BOARD.get(index) else {
                return ChannelSlot::Empty;
            };
            match Label::new(name) {
                Ok(label) => ChannelSlot::Active(ChannelConfig {
                    label,
                    divider_resistance: divider,
                    calibration_offset: 0,
                    hardware_channel: AdcChannel(channel),
                }),
                Err(_) => ChannelSlot::Empty,
            }
        });

        Self {
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
            stream_active: false,
            log_measurements: false,
            channels,
        }
    }
}

/// Configuration store shared by all threads of control.
///
/// Also holds the ADC unit until the acquisition engine takes it at startup.
pub struct ConfigStore<A: AdcUnit> {
    config: Mutex<Configuration>,
    adc: Mutex<Option<A>>,
    listeners: Mutex<ListenerTable>,
}

impl<A: AdcUnit> core::fmt::Debug for ConfigStore<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("config", &*self.config.lock())
            .field("adc_available", &self.adc.lock().is_some())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl<A: AdcUnit> ConfigStore<A> {
    /// Create the store with board defaults and the ADC unit.
    pub fn new(adc: A) -> Self {
        Self::build(Configuration::default(), Some(adc))
    }

    /// Create the store from an explicit configuration.
    ///
    /// `adc` is `None` when the unit failed to initialize; the acquisition
    /// engine then refuses to start. Fails with `InvalidArgument` when the
    /// sampling interval is below [`MIN_SAMPLING_INTERVAL_MS`].
    pub fn with_config(config: Configuration, adc: Option<A>) -> Result<Self> {
        check_sampling_interval(config.sampling_interval_ms)?;
        Ok(Self::build(config, adc))
    }

    fn build(config: Configuration, adc: Option<A>) -> Self {
        info!(
            "Configuration initialized: {} ms interval, {} active channels",
            config.sampling_interval_ms,
            config.active_channel_count()
        );
        Self {
            config: Mutex::new(config),
            adc: Mutex::new(adc),
            listeners: Mutex::new(ListenerTable::new()),
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Full copy of the configuration.
    pub fn get_snapshot(&self) -> Configuration {
        self.config.lock().clone()
    }

    /// Current sampling interval (ms).
    pub fn sampling_interval_ms(&self) -> u32 {
        self.config.lock().sampling_interval_ms
    }

    /// Whether streaming is enabled.
    pub fn stream_active(&self) -> bool {
        self.config.lock().stream_active
    }

    /// Whether conversion logging is enabled.
    pub fn log_measurements(&self) -> bool {
        self.config.lock().log_measurements
    }

    /// Number of active slots.
    pub fn active_channel_count(&self) -> usize {
        self.config.lock().active_channel_count()
    }

    /// Copy of one slot.
    pub fn channel(&self, index: usize) -> Result<ChannelSlot> {
        self.config.lock()
            .channels
            .get(index)
            .cloned()
            .ok_or_else(|| MonitorError::out_of_range(index))
    }

    /// Calibration offset of an active slot (ohms).
    pub fn calibration_offset(&self, index: usize) -> Result<i32> {
        match self.channel(index)? {
            ChannelSlot::Active(config) => Ok(config.calibration_offset),
            ChannelSlot::Empty => Err(MonitorError::InvalidArgument("slot unused")),
        }
    }

    /// Hand the ADC unit to its single owner.
    ///
    /// Succeeds once; later calls fail with `InitializationFailed`.
    pub fn take_adc_unit(&self) -> Result<A> {
        self.adc.lock()
            .take()
            .ok_or(MonitorError::InitializationFailed("ADC unit unavailable"))
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Set the sampling interval; rejects values below the minimum.
    pub fn set_sampling_interval(&self, interval_ms: u32) -> Result<()> {
        check_sampling_interval(interval_ms)?;
        self.config.lock().sampling_interval_ms = interval_ms;
        info!("Sampling interval set to {} ms", interval_ms);
        self.notify_listeners();
        Ok(())
    }

    /// Set a feature flag.
    pub fn set_flag(&self, flag: Flag, value: bool) {
        *self.config.lock().flag_mut(flag) = value;
        info!("{:?} is now {}", flag, if value { "on" } else { "off" });
        self.notify_listeners();
    }

    /// Flip a feature flag and return the new value.
    pub fn toggle_flag(&self, flag: Flag) -> bool {
        let value = {
            let mut config = self.config.lock();
            let value = !config.flag(flag);
            *config.flag_mut(flag) = value;
            value
        };
        info!("{:?} is now {}", flag, if value { "on" } else { "off" });
        self.notify_listeners();
        value
    }

    /// Replace one slot.
    pub fn set_channel(&self, index: usize, slot: ChannelSlot) -> Result<()> {
        let active = {
            let mut config = self.config.lock();
            *config.slot_mut(index)? = slot;
            config.active_channel_count()
        };
        info!(
            "Channel slot {} updated, {} active channels",
            index, active
        );
        self.notify_listeners();
        Ok(())
    }

    /// Set the calibration offset of an active slot; returns the stored value.
    pub fn set_calibration_offset(&self, index: usize, offset: i32) -> Result<i32> {
        self.update_calibration(index, |_| offset)
    }

    /// Raise the calibration offset by one step; returns the stored value.
    pub fn increment_calibration_offset(&self, index: usize) -> Result<i32> {
        self.update_calibration(index, |current| {
            current.saturating_add(CALIBRATION_STEP_OHMS)
        })
    }

    /// Lower the calibration offset by one step; returns the stored value.
    pub fn decrement_calibration_offset(&self, index: usize) -> Result<i32> {
        self.update_calibration(index, |current| {
            current.saturating_sub(CALIBRATION_STEP_OHMS)
        })
    }

    fn update_calibration(&self, index: usize, update: impl FnOnce(i32) -> i32) -> Result<i32> {
        let offset = {
            let mut config = self.config.lock();
            let slot = config.slot_mut(index).inspect_err(|_| {
                error!("Channel index {} is out of bounds", index);
            })?;
            let channel = slot
                .config_mut()
                .ok_or(MonitorError::InvalidArgument("slot unused"))?;
            channel.calibration_offset = update(channel.calibration_offset);
            channel.calibration_offset
        };
        info!("Calibration offset of slot {} set to {} ohm", index, offset);
        self.notify_listeners();
        Ok(offset)
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    /// Register a change listener.
    pub fn register_listener(&self, listener: Arc<dyn ConfigListener>) -> Result<()> {
        self.listeners.lock().register(listener).inspect_err(|e| {
            error!("Cannot register configuration listener: {}", e);
        })
    }

    /// Remove a previously registered listener.
    pub fn unregister_listener(&self, listener: &Arc<dyn ConfigListener>) -> Result<()> {
        self.listeners.lock().unregister(listener)
    }

    /// Deliver a notification to every listener with no lock held.
    fn notify_listeners(&self) {
        let listeners = self.listeners.lock().snapshot();
        for listener in listeners.iter() {
            listener.on_config_changed();
        }
    }
}

fn check_sampling_interval(interval_ms: u32) -> Result<()> {
    if interval_ms < MIN_SAMPLING_INTERVAL_MS {
        error!(
            "Sampling interval must be at least {} ms (got {})",
            MIN_SAMPLING_INTERVAL_MS, interval_ms
        );
        return Err(MonitorError::InvalidArgument(
            "sampling interval below minimum",
        ));
    }
    Ok(())
}
