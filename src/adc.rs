//! ADC capability consumed by the acquisition engine.
//!
//! The peripheral driver is external. The engine only needs to bind a channel
//! with a resolution and attenuation, and to read a raw sample from it.
//! Implementations represent one ADC unit.

use core::fmt;
use thiserror::Error;

/// Opaque ADC channel identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdcChannel(pub u8);

impl fmt::Display for AdcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sample resolution.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 9-bit samples
    Bits9 = 9,
    /// 10-bit samples
    Bits10 = 10,
    /// 11-bit samples
    Bits11 = 11,
    /// 12-bit samples
    Bits12 = 12,
}

impl Resolution {
    /// Number of bits per sample.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Largest raw value representable at this resolution.
    pub fn max_raw(self) -> u16 {
        (1u16 << self.bits()) - 1
    }
}

/// Input attenuation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Attenuation {
    /// No attenuation
    Db0,
    /// 2.5 dB
    Db2_5,
    /// 6 dB
    Db6,
    /// 12 dB
    Db12,
}

/// Channel binding parameters applied to every active channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AdcSettings {
    /// Sample resolution
    pub resolution: Resolution,
    /// Input attenuation
    pub attenuation: Attenuation,
}

impl Default for AdcSettings {
    fn default() -> Self {
        Self {
            resolution: crate::config::DEFAULT_RESOLUTION,
            attenuation: crate::config::DEFAULT_ATTENUATION,
        }
    }
}

/// Driver-level ADC failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdcError {
    /// Channel has not been configured
    #[error("channel not configured")]
    NotConfigured,

    /// Channel does not exist on this unit
    #[error("invalid channel")]
    InvalidChannel,

    /// Conversion did not complete in time
    #[error("conversion timed out")]
    Timeout,

    /// Driver returned an error code
    #[error("driver error {0}")]
    Driver(i32),
}

/// ADC unit capability.
///
/// `configure_channel` is called for every active channel on each cache
/// rebuild; `read_raw` once per channel per sampling cycle. Both run on the
/// sampling thread except for an explicit forced refresh.
pub trait AdcUnit: Send {
    /// Bind `channel` with the given resolution and attenuation.
    fn configure_channel(
        &mut self,
        channel: AdcChannel,
        resolution: Resolution,
        attenuation: Attenuation,
    ) -> Result<(), AdcError>;

    /// Read one raw sample from `channel`.
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, AdcError>;
}
