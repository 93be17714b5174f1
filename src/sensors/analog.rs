//! Single-ended ADC reads for the illuminance and soil-moisture probes.
//!
//! Both probes are read against the internal 1.25 V reference for
//! resolution, but the rest of the firmware (battery monitor, radio
//! calibration) assumes the AVDD reference.  [`read_with_reference`]
//! therefore always puts the default reference back after the conversion.

use crate::app::ports::AnalogPort;

/// ADC reference voltage selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdcReference {
    /// Internal 1.25 V band-gap.
    Internal1V25,
    /// External reference on AIN7.
    ExternalAin7,
    /// Supply voltage.  Default for the rest of the firmware.
    #[default]
    Avdd,
    /// External differential reference on AIN6/AIN7.
    ExternalAin6Ain7,
}

/// ADC input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AdcChannel {
    Ain0 = 0,
    Ain1 = 1,
    Ain2 = 2,
    Ain3 = 3,
    Ain4 = 4,
    Ain5 = 5,
    Ain6 = 6,
    Ain7 = 7,
}

/// Conversion resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcResolution {
    Bits8,
    Bits10,
    Bits12,
    Bits14,
}

impl AdcResolution {
    /// Largest code the conversion can produce.
    pub const fn max_code(self) -> u16 {
        match self {
            Self::Bits8 => 0x00FF,
            Self::Bits10 => 0x03FF,
            Self::Bits12 => 0x0FFF,
            Self::Bits14 => 0x3FFF,
        }
    }
}

/// Photoresistor divider.
pub const ILLUMINANCE_CHANNEL: AdcChannel = AdcChannel::Ain7;
/// Capacitive soil-moisture probe.
pub const SOIL_MOISTURE_CHANNEL: AdcChannel = AdcChannel::Ain4;
/// Reference and resolution used for both probes.
pub const PROBE_REFERENCE: AdcReference = AdcReference::Internal1V25;
pub const PROBE_RESOLUTION: AdcResolution = AdcResolution::Bits12;

/// Convert one channel against `reference`, then restore the default
/// reference before returning.
pub fn read_with_reference(
    hw: &mut impl AnalogPort,
    reference: AdcReference,
    channel: AdcChannel,
    resolution: AdcResolution,
) -> u16 {
    hw.set_reference(reference);
    let raw = hw.read(channel, resolution);
    hw.set_reference(AdcReference::default());
    raw
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// In-memory ADC for the host harness and tests.
#[derive(Debug, Clone, Default)]
pub struct SimAdc {
    reference: AdcReference,
    /// Full-scale (16-bit) value per channel; scaled down to the resolution.
    values: [u16; 8],
    conversions: u32,
}

impl SimAdc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a full-scale reading for `channel`.
    pub fn set_value(&mut self, channel: AdcChannel, value: u16) {
        self.values[channel as usize] = value;
    }

    pub fn reference(&self) -> AdcReference {
        self.reference
    }

    pub fn conversions(&self) -> u32 {
        self.conversions
    }
}

impl AnalogPort for SimAdc {
    fn set_reference(&mut self, reference: AdcReference) {
        self.reference = reference;
    }

    fn read(&mut self, channel: AdcChannel, resolution: AdcResolution) -> u16 {
        self.conversions += 1;
        let shift = 16 - resolution.max_code().count_ones();
        self.values[channel as usize] >> shift
    }
}
