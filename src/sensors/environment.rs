//! Environmental sensor (temperature / pressure / humidity) read protocol.
//!
//! The sensor keeps its own mode state, so a reading is always the same
//! sequence:
//!
//! ```text
//!  init ──▶ configure(osr, filter, standby) ──▶ mode=Normal
//!       ──▶ settling delay ──▶ fetch compensated values
//! ```
//!
//! Any failure aborts the sequence.  The caller keeps its previous values;
//! the next cycle starts again from `init`.

use embedded_hal::delay::DelayNs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::app::ports::EnvSensorPort;
use crate::error::SensorError;

// ═══════════════════════════════════════════════════════════════
//  Settings
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Oversampling {
    Skip,
    X1,
    X2,
    X4,
    X8,
    X16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    Off,
    Coeff2,
    Coeff4,
    Coeff8,
    Coeff16,
}

/// Inactive time between measurements in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standby {
    Ms0_5,
    Ms10,
    Ms20,
    Ms62_5,
    Ms125,
    Ms250,
    Ms500,
    Ms1000,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSettings {
    pub osr_humidity: Oversampling,
    pub osr_pressure: Oversampling,
    pub osr_temperature: Oversampling,
    pub filter: Filter,
    pub standby: Standby,
}

impl Default for EnvSettings {
    /// Indoor-navigation profile: heavy pressure oversampling and IIR filter.
    fn default() -> Self {
        Self {
            osr_humidity: Oversampling::X1,
            osr_pressure: Oversampling::X16,
            osr_temperature: Oversampling::X2,
            filter: Filter::Coeff16,
            standby: Standby::Ms62_5,
        }
    }
}

/// Sensor power mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Sleep,
    Forced,
    Normal,
}

/// Compensated reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
    pub humidity_pct: f32,
}

// ═══════════════════════════════════════════════════════════════
//  Read protocol
// ═══════════════════════════════════════════════════════════════

/// Run the full init → configure → normal → settle → fetch sequence.
pub fn read_environment(
    hw: &mut (impl EnvSensorPort + DelayNs),
    settings: &EnvSettings,
    settle_ms: u32,
) -> Result<EnvReading, SensorError> {
    hw.env_init()?;
    hw.env_configure(settings)?;
    hw.env_set_mode(EnvMode::Normal)?;
    hw.delay_ms(settle_ms);
    let reading = hw.env_fetch()?;
    debug!(
        "Env: T={:.2}C P={:.1}hPa H={:.1}%",
        reading.temperature_c, reading.pressure_hpa, reading.humidity_pct
    );
    Ok(reading)
}

// ═══════════════════════════════════════════════════════════════
//  Simulation
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimState {
    Reset,
    Sleeping { configured: bool },
    Measuring,
}

/// Host-side sensor model that enforces the mode sequence.
#[derive(Debug, Clone)]
pub struct SimEnvSensor {
    state: SimState,
    present: bool,
    reading: EnvReading,
    settings: Option<EnvSettings>,
}

impl SimEnvSensor {
    pub fn new(reading: EnvReading) -> Self {
        Self {
            state: SimState::Reset,
            present: true,
            reading,
            settings: None,
        }
    }

    /// Simulate a missing / unresponsive device.
    pub fn set_present(&mut self, present: bool) {
        self.present = present;
    }

    pub fn set_reading(&mut self, reading: EnvReading) {
        self.reading = reading;
    }

    pub fn settings(&self) -> Option<EnvSettings> {
        self.settings
    }

    pub fn is_measuring(&self) -> bool {
        self.state == SimState::Measuring
    }
}

impl EnvSensorPort for SimEnvSensor {
    fn env_init(&mut self) -> Result<(), SensorError> {
        if !self.present {
            self.state = SimState::Reset;
            return Err(SensorError::InitFailed);
        }
        self.state = SimState::Sleeping { configured: false };
        Ok(())
    }

    fn env_configure(&mut self, settings: &EnvSettings) -> Result<(), SensorError> {
        match self.state {
            SimState::Sleeping { .. } => {
                self.settings = Some(*settings);
                self.state = SimState::Sleeping { configured: true };
                Ok(())
            }
            _ => Err(SensorError::ConfigureFailed),
        }
    }

    fn env_set_mode(&mut self, mode: EnvMode) -> Result<(), SensorError> {
        match (self.state, mode) {
            (SimState::Reset, _) => Err(SensorError::ModeFailed),
            (_, EnvMode::Sleep) => {
                self.state = SimState::Sleeping { configured: self.settings.is_some() };
                Ok(())
            }
            (SimState::Sleeping { configured: true } | SimState::Measuring, _) => {
                self.state = SimState::Measuring;
                Ok(())
            }
            (SimState::Sleeping { configured: false }, _) => Err(SensorError::ModeFailed),
        }
    }

    fn env_fetch(&mut self) -> Result<EnvReading, SensorError> {
        if self.state != SimState::Measuring {
            return Err(SensorError::NotReady);
        }
        if !self.present {
            return Err(SensorError::ReadFailed);
        }
        Ok(self.reading)
    }
}
