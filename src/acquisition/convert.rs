//! Raw sample to temperature conversion.
//!
//! The thermistor sits on the high side of a voltage divider. A raw sample
//! `raw` out of `max_raw` gives the thermistor resistance
//! `divider * raw / (max_raw - raw) + offset`, which the Steinhart–Hart model
//! turns into kelvin.

use thiserror::Error;

/// Steinhart–Hart coefficient A.
pub const STEINHART_HART_A: f64 = 1.129_148e-3;

/// Steinhart–Hart coefficient B.
pub const STEINHART_HART_B: f64 = 2.341_25e-4;

/// Steinhart–Hart coefficient C.
pub const STEINHART_HART_C: f64 = 8.767_41e-8;

/// Kelvin to Celsius offset.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Why a raw sample could not be converted.
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum ConversionError {
    /// Sample at or beyond the ADC range limits
    #[error("raw value {raw} at or beyond limits (0, {max_raw})")]
    Saturated {
        /// Raw sample
        raw: u16,
        /// Largest raw value at the configured resolution
        max_raw: u16,
    },

    /// Calibrated resistance is zero or negative
    #[error("computed resistance {0:.2} ohm is not positive")]
    NonPositiveResistance(f64),
}

/// Result of a successful conversion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Conversion {
    /// Thermistor resistance including the calibration offset (ohms)
    pub resistance_ohms: f64,

    /// Temperature (°C)
    pub celsius: f32,
}

/// Thermistor resistance for a raw sample, calibration included.
pub fn thermistor_resistance(
    raw: u16,
    max_raw: u16,
    divider_resistance: u32,
    calibration_offset: i32,
) -> Result<f64, ConversionError> {
    if raw == 0 || raw >= max_raw {
        return Err(ConversionError::Saturated { raw, max_raw });
    }

    let raw = f64::from(raw);
    let max_raw = f64::from(max_raw);
    let resistance =
        f64::from(divider_resistance) * raw / (max_raw - raw) + f64::from(calibration_offset);

    if resistance <= 0.0 {
        return Err(ConversionError::NonPositiveResistance(resistance));
    }
    Ok(resistance)
}

/// Steinhart–Hart model: resistance (ohms, > 0) to kelvin.
pub fn steinhart_hart_kelvin(resistance_ohms: f64) -> f64 {
    let ln_r = resistance_ohms.ln();
    1.0 / (STEINHART_HART_A + STEINHART_HART_B * ln_r + STEINHART_HART_C * ln_r.powi(3))
}

/// Convert a raw sample to a temperature.
pub fn convert(
    raw: u16,
    max_raw: u16,
    divider_resistance: u32,
    calibration_offset: i32,
) -> Result<Conversion, ConversionError> {
    let resistance_ohms =
        thermistor_resistance(raw, max_raw, divider_resistance, calibration_offset)?;
    let celsius = (steinhart_hart_kelvin(resistance_ohms) - KELVIN_OFFSET) as f32;
    Ok(Conversion {
        resistance_ohms,
        celsius,
    })
}
