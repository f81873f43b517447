//! Simulated ADC unit for host runs.
//!
//! Produces raw samples for NTC thermistors (10 kΩ at 25 °C, beta 3950) on a
//! divider matching the board's nominal 10 kΩ resistors. Each channel sits a
//! little warmer than the previous one and every reading wobbles by a few
//! tenths of a degree, so streamed output visibly changes.

use crate::adc::{AdcChannel, AdcError, AdcUnit, Attenuation, Resolution};
use log::debug;

/// Channels available on the simulated unit.
pub const SIM_CHANNEL_COUNT: u8 = 10;

const NOMINAL_OHMS: f64 = 10_000.0;
const NOMINAL_KELVIN: f64 = 298.15;
const BETA: f64 = 3_950.0;
const DIVIDER_OHMS: f64 = 10_000.0;

/// ADC unit that synthesizes thermistor readings.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    base_celsius: f64,
    configured: [Option<Resolution>; SIM_CHANNEL_COUNT as usize],
    reads: u32,
}

impl SimulatedAdc {
    /// Simulate thermistors around `base_celsius`.
    pub fn new(base_celsius: f64) -> Self {
        Self {
            base_celsius,
            configured: [None; SIM_CHANNEL_COUNT as usize],
            reads: 0,
        }
    }

    /// Temperature the next reading of `channel` will represent.
    pub fn target_celsius(&self, channel: AdcChannel) -> f64 {
        // Triangle wave, period 8 reads, amplitude 0.2 °C
        let phase = f64::from(self.reads % 8);
        let wobble = (if phase < 4.0 { phase } else { 8.0 - phase }) * 0.1 - 0.2;
        self.base_celsius + f64::from(channel.0) * 0.5 + wobble
    }

    fn slot(&self, channel: AdcChannel) -> Result<usize, AdcError> {
        if channel.0 < SIM_CHANNEL_COUNT {
            Ok(usize::from(channel.0))
        } else {
            Err(AdcError::InvalidChannel)
        }
    }
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new(25.0)
    }
}

impl AdcUnit for SimulatedAdc {
    fn configure_channel(
        &mut self,
        channel: AdcChannel,
        resolution: Resolution,
        attenuation: Attenuation,
    ) -> Result<(), AdcError> {
        let slot = self.slot(channel)?;
        debug!(
            "Simulated ADC channel {} bound at {} bits, {:?}",
            channel,
            resolution.bits(),
            attenuation
        );
        self.configured[slot] = Some(resolution);
        Ok(())
    }

    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, AdcError> {
        let slot = self.slot(channel)?;
        let resolution = self.configured[slot].ok_or(AdcError::NotConfigured)?;

        let kelvin = self.target_celsius(channel) + 273.15;
        let resistance = NOMINAL_OHMS * (BETA * (1.0 / kelvin - 1.0 / NOMINAL_KELVIN)).exp();
        let max_raw = f64::from(resolution.max_raw());
        let raw = (max_raw * resistance / (resistance + DIVIDER_OHMS)).round();

        self.reads = self.reads.wrapping_add(1);
        // Clamp inside the open range so the sample is always convertible
        Ok(raw.clamp(1.0, max_raw - 1.0) as u16)
    }
}
