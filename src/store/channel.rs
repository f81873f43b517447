//! Channel slot types.

use crate::adc::AdcChannel;
use crate::config::LABEL_CAPACITY;
use crate::error::{MonitorError, Result};
use core::fmt;

/// Label older configurations used to mark an unused slot.
const LEGACY_UNUSED_LABEL: &str = "UNUSED";

/// Short channel identifier.
///
/// Never empty and never the legacy `"UNUSED"` marker, so a slot holding a
/// label is active by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(heapless::String<LABEL_CAPACITY>);

impl Label {
    /// Create a label, rejecting empty, over-long and sentinel values.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() || name == LEGACY_UNUSED_LABEL {
            return Err(MonitorError::InvalidArgument("label marks an unused slot"));
        }
        let mut label = heapless::String::new();
        label
            .push_str(name)
            .map_err(|_| MonitorError::InvalidArgument("label too long"))?;
        Ok(Self(label))
    }

    /// Label text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one monitored thermistor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Channel label
    pub label: Label,

    /// Fixed divider resistor (ohms)
    pub divider_resistance: u32,

    /// User calibration added to the computed resistance (ohms)
    pub calibration_offset: i32,

    /// ADC channel the thermistor is wired to
    pub hardware_channel: AdcChannel,
}

/// One fixed position in the channel table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelSlot {
    /// Slot holds a monitored thermistor
    Active(ChannelConfig),

    /// Slot unused
    #[default]
    Empty,
}

impl ChannelSlot {
    /// Check whether the slot is monitored.
    pub fn is_active(&self) -> bool {
        matches!(self, ChannelSlot::Active(_))
    }

    /// Channel configuration, if active.
    pub fn config(&self) -> Option<&ChannelConfig> {
        match self {
            ChannelSlot::Active(config) => Some(config),
            ChannelSlot::Empty => None,
        }
    }

    pub(crate) fn config_mut(&mut self) -> Option<&mut ChannelConfig> {
        match self {
            ChannelSlot::Active(config) => Some(config),
            ChannelSlot::Empty => None,
        }
    }
}
