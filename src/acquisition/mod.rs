//! Temperature acquisition engine.
//!
//! The engine samples every active channel once per cycle, converts the raw
//! value to a temperature and publishes the result under its own lock.
//!
//! It works from an [`AcquisitionCache`] rather than the store. A change
//! notification only raises a pending flag; the sampling loop rebuilds the
//! cache at the top of its next cycle and clears the flag once the rebuild
//! succeeds. A configuration write is therefore picked up no later than the
//! second cycle after it completes.

use crate::adc::{AdcSettings, AdcUnit};
use crate::error::{MonitorError, Result};
use crate::store::{ConfigListener, ConfigStore};
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use core::time::Duration;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

// Sub-modules
pub mod cache;
pub mod convert;
pub mod results;

// Re-export key types
pub use cache::{AcquisitionCache, CachedChannel};
pub use convert::{Conversion, ConversionError};
pub use results::ResultBuffer;

/// Engine lifecycle.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// Not yet initialized
    Uninitialized = 0,

    /// Initial cache built, loop not started
    CacheLoaded = 1,

    /// Sampling loop running
    Sampling = 2,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineState::CacheLoaded,
            2 => EngineState::Sampling,
            _ => EngineState::Uninitialized,
        }
    }
}

/// Pending-refresh flag raised by configuration notifications.
#[derive(Debug, Default)]
struct RefreshSignal {
    pending: AtomicBool,
}

impl RefreshSignal {
    fn raise(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Clear the flag and report whether it was set.
    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    fn is_raised(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

impl ConfigListener for RefreshSignal {
    fn on_config_changed(&self) {
        debug!("Received configuration update notification");
        self.raise();
    }
}

/// Periodic sampler with a cached view of the configuration.
pub struct AcquisitionEngine<A: AdcUnit> {
    store: Arc<ConfigStore<A>>,
    adc: Mutex<A>,
    settings: AdcSettings,
    cache: Mutex<Arc<AcquisitionCache>>,
    results: Mutex<ResultBuffer>,
    refresh: Arc<RefreshSignal>,
    listener: Option<Arc<dyn ConfigListener>>,
    state: AtomicU8,
}

impl<A: AdcUnit> core::fmt::Debug for AcquisitionEngine<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AcquisitionEngine")
            .field("state", &self.state())
            .field("settings", &self.settings)
            .field("subscribed", &self.is_subscribed())
            .field("refresh_pending", &self.refresh_pending())
            .finish_non_exhaustive()
    }
}

impl<A: AdcUnit> AcquisitionEngine<A> {
    /// Initialize with the default ADC settings.
    pub fn init(store: Arc<ConfigStore<A>>) -> Result<Self> {
        Self::init_with(store, AdcSettings::default())
    }

    /// Take the ADC unit from the store, subscribe to changes and build the
    /// initial cache.
    ///
    /// Fails with `InitializationFailed` when the ADC unit is unavailable.
    /// A full listener table is not fatal: the engine keeps its initial cache
    /// until a forced refresh.
    pub fn init_with(store: Arc<ConfigStore<A>>, settings: AdcSettings) -> Result<Self> {
        info!("Initializing temperature acquisition...");

        let adc = store.take_adc_unit().inspect_err(|e| {
            error!("Cannot start acquisition: {}", e);
        })?;

        let initial = AcquisitionCache::from_configuration(&store.get_snapshot());
        let mut engine = Self {
            store,
            adc: Mutex::new(adc),
            settings,
            cache: Mutex::new(Arc::new(initial)),
            results: Mutex::new(ResultBuffer::new()),
            refresh: Arc::new(RefreshSignal::default()),
            listener: None,
            state: AtomicU8::new(EngineState::Uninitialized as u8),
        };

        let listener: Arc<dyn ConfigListener> = engine.refresh.clone();
        match engine.store.register_listener(listener.clone()) {
            Ok(()) => engine.listener = Some(listener),
            Err(e) => error!(
                "Failed to register for configuration updates ({}); running on the initial cache",
                e
            ),
        }

        if let Err(e) = engine.refresh_cache() {
            warn!("Initial channel binding incomplete ({}); will retry", e);
            engine.refresh.raise();
        }

        engine.set_state(EngineState::CacheLoaded);
        info!("Temperature acquisition initialized");
        Ok(engine)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether change notifications reach this engine.
    pub fn is_subscribed(&self) -> bool {
        self.listener.is_some()
    }

    /// Whether a cache rebuild is pending.
    pub fn refresh_pending(&self) -> bool {
        self.refresh.is_raised()
    }

    /// ADC settings used for channel binding.
    pub fn settings(&self) -> AdcSettings {
        self.settings
    }

    /// Rebuild the cache from the store and re-bind every active channel.
    ///
    /// The new cache is installed even when a channel fails to bind; the
    /// failure is returned so the caller keeps the refresh pending.
    pub fn refresh_cache(&self) -> Result<()> {
        let mut adc = self.adc.lock();

        let cache = Arc::new(AcquisitionCache::from_configuration(
            &self.store.get_snapshot(),
        ));
        info!(
            "[CACHE REFRESH] {} ms interval, {} active channels, logging {}",
            cache.sampling_interval().as_millis(),
            cache.channels().len(),
            if cache.log_measurements() { "on" } else { "off" }
        );

        let mut outcome = Ok(());
        for channel in cache.channels() {
            let hw = channel.config.hardware_channel;
            if let Err(source) =
                adc.configure_channel(hw, self.settings.resolution, self.settings.attenuation)
            {
                error!(
                    "[CACHE REFRESH] Failed to configure ADC channel {} for {}: {}",
                    hw, channel.config.label, source
                );
                if outcome.is_ok() {
                    outcome = Err(MonitorError::ChannelBindFailure {
                        channel: hw,
                        source,
                    });
                }
            }
        }

        self.results.lock().align_to(&cache);
        *self.cache.lock() = cache;
        outcome
    }

    /// Invalidate the cache and rebuild it on the caller's thread.
    pub fn force_refresh(&self) -> Result<()> {
        self.refresh.take();
        self.refresh_cache().inspect_err(|_| self.refresh.raise())
    }

    /// One sampling cycle without the trailing sleep.
    ///
    /// Returns the interval to wait before the next cycle, taken from the
    /// cache in force at the start of this one.
    pub fn sample_cycle(&self) -> Duration {
        self.set_state(EngineState::Sampling);

        if self.refresh.take() {
            info!("Configuration change detected, refreshing cache...");
            match self.refresh_cache() {
                Ok(()) => info!("Cache refreshed successfully"),
                Err(e) => {
                    error!("Failed to refresh cache ({}). Will retry on next cycle", e);
                    self.refresh.raise();
                }
            }
        }

        let cache = Arc::clone(&self.cache.lock());
        for channel in cache.channels() {
            let celsius = match self.measure(channel, cache.log_measurements()) {
                Ok(celsius) => celsius,
                Err(e) => {
                    warn!(
                        "Failed to measure temperature for {}: {}. Storing NaN",
                        channel.config.label, e
                    );
                    f32::NAN
                }
            };
            self.results
                .lock()
                .record(channel.slot, &channel.config.label, celsius);
        }

        cache.sampling_interval()
    }

    /// Sample forever at the cached interval.
    pub fn run_loop(&self) -> ! {
        info!("Temperature measurement loop started");
        loop {
            let interval = self.sample_cycle();
            std::thread::sleep(interval);
        }
    }

    /// Latest reading for `slot`; `None` when the slot is not active.
    pub fn latest(&self, slot: usize) -> Option<f32> {
        self.results.lock().latest(slot)
    }

    /// Render the latest readings as JSON into `out`.
    ///
    /// Fails with `BufferTooSmall` when the report exceeds `N` bytes, leaving
    /// `out` empty.
    pub fn get_latest_json<const N: usize>(&self, out: &mut heapless::String<N>) -> Result<()> {
        self.results.lock().write_json(out).inspect_err(|e| {
            error!("Failed to format latest temperatures: {}", e);
        })
    }

    fn measure(&self, channel: &CachedChannel, log_measurement: bool) -> Result<f32> {
        let config = &channel.config;
        let hw = config.hardware_channel;

        let raw = self
            .adc
            .lock()
            .read_raw(hw)
            .map_err(|source| MonitorError::HardwareReadFailure {
                channel: hw,
                source,
            })?;

        let conversion = convert::convert(
            raw,
            self.settings.resolution.max_raw(),
            config.divider_resistance,
            config.calibration_offset,
        )?;

        if log_measurement {
            info!(
                "Thermistor {}: ADC {}, Rth {:.2} ohm (incl. calibration offset {} ohm), {:.2} C",
                config.label,
                raw,
                conversion.resistance_ohms,
                config.calibration_offset,
                conversion.celsius
            );
        }
        Ok(conversion.celsius)
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn cache_snapshot(&self) -> AcquisitionCache {
        AcquisitionCache::clone(&self.cache.lock())
    }
}

impl<A: AdcUnit> Drop for AcquisitionEngine<A> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(e) = self.store.unregister_listener(&listener) {
                warn!("Failed to unregister configuration listener: {}", e);
            }
        }
    }
}
