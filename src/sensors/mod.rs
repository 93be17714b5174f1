//! Sensor subsystem: the measurement cache and the power-gated
//! sampling cycle that fills it.
//!
//! ```text
//!  power hold
//!    ├─ battery voltage / percent
//!    ├─ sensor rail ON
//!    │    ├─ environmental  (init → configure → normal → settle → fetch)
//!    │    ├─ illuminance    (ADC, 1.25 V ref → restore AVDD)
//!    │    └─ soil moisture  (ADC, 1.25 V ref → restore AVDD)
//!    ├─ sensor rail OFF
//!  power conserve
//! ```
//!
//! Individual read failures are logged and the previous value is kept.
//! A flaky sensor must not stop the node from reporting.

pub mod analog;
pub mod battery;
pub mod environment;

use log::{debug, warn};

use crate::app::ports::SamplingPorts;
use crate::config::NodeConfig;
use analog::{ILLUMINANCE_CHANNEL, PROBE_REFERENCE, PROBE_RESOLUTION, SOIL_MOISTURE_CHANNEL};

/// Last sampled value of every channel.  No history: last value wins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasurementCache {
    /// °C
    pub temperature_c: f32,
    /// hPa
    pub pressure_hpa: f32,
    /// %RH
    pub humidity_pct: f32,
    /// Raw 12-bit ADC code.
    pub illuminance_raw: u16,
    /// Raw 12-bit ADC code.
    pub soil_moisture_raw: u16,
    /// Volts
    pub battery_volts: f32,
    /// 0–100 %
    pub battery_pct: f32,
}

impl MeasurementCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Summary of one sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOutcome {
    /// `false` when the environmental values in the cache are stale.
    pub environment_fresh: bool,
}

/// Take one snapshot of every channel into `cache`.
///
/// The power hold and the sensor rail are always released before
/// returning, whatever the individual reads do.
pub fn sample_all(
    cache: &mut MeasurementCache,
    config: &NodeConfig,
    hw: &mut impl SamplingPorts,
) -> SampleOutcome {
    hw.request_hold();

    cache.battery_volts = hw.voltage();
    cache.battery_pct = hw.remaining_percent();

    hw.set_sensor_power(true);

    let environment_fresh = match environment::read_environment(hw, &config.env, config.env_settle_ms) {
        Ok(reading) => {
            cache.temperature_c = reading.temperature_c;
            cache.pressure_hpa = reading.pressure_hpa;
            cache.humidity_pct = reading.humidity_pct;
            true
        }
        Err(e) => {
            warn!("Sampling: environmental sensor {}, keeping previous values", e);
            false
        }
    };

    cache.illuminance_raw =
        analog::read_with_reference(hw, PROBE_REFERENCE, ILLUMINANCE_CHANNEL, PROBE_RESOLUTION);
    cache.soil_moisture_raw =
        analog::read_with_reference(hw, PROBE_REFERENCE, SOIL_MOISTURE_CHANNEL, PROBE_RESOLUTION);

    hw.set_sensor_power(false);
    hw.request_conserve();

    debug!(
        "Sampling: bat={:.2}V ({:.0}%) T={:.2}C P={:.1}hPa H={:.1}% lux_raw={} soil_raw={}",
        cache.battery_volts,
        cache.battery_pct,
        cache.temperature_c,
        cache.pressure_hpa,
        cache.humidity_pct,
        cache.illuminance_raw,
        cache.soil_moisture_raw,
    );

    SampleOutcome { environment_fresh }
}
