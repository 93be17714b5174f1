//! Report cycle: sample everything, then push the reported attributes.
//!
//! Reporting is deliberately "always send the last known value", not
//! change-triggered: every cycle issues the full [`REPORTED`] list even if
//! a value did not change or the sensor behind it failed.

use log::info;

use super::ports::{AttrValue, ReportingPort, SamplingPorts};
use crate::config::NodeConfig;
use crate::sensors::{self, MeasurementCache, SampleOutcome};

// ───────────────────────────────────────────────────────────────
// Endpoints, clusters, attributes
// ───────────────────────────────────────────────────────────────

/// Main sensor endpoint (battery + environmental sensor).
pub const FIRST_ENDPOINT: u8 = 1;
/// Auxiliary temperature endpoint.
pub const SECOND_ENDPOINT: u8 = 2;

pub mod cluster {
    pub const POWER_CFG: u16 = 0x0001;
    pub const TEMPERATURE: u16 = 0x0402;
    pub const PRESSURE: u16 = 0x0403;
    pub const HUMIDITY: u16 = 0x0405;
}

pub mod attr {
    pub const BATTERY_PERCENTAGE_REMAINING: u16 = 0x0021;
    pub const MEASURED_VALUE: u16 = 0x0000;
}

/// Which cached quantity feeds a reported attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    BatteryPercent,
    Temperature,
    Pressure,
    Humidity,
}

/// One attribute pushed every report cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedAttr {
    pub endpoint: u8,
    pub cluster: u16,
    pub attribute: u16,
    pub source: Source,
}

/// Reported attributes, in push order.
pub const REPORTED: [ReportedAttr; 5] = [
    ReportedAttr {
        endpoint: FIRST_ENDPOINT,
        cluster: cluster::POWER_CFG,
        attribute: attr::BATTERY_PERCENTAGE_REMAINING,
        source: Source::BatteryPercent,
    },
    ReportedAttr {
        endpoint: FIRST_ENDPOINT,
        cluster: cluster::TEMPERATURE,
        attribute: attr::MEASURED_VALUE,
        source: Source::Temperature,
    },
    ReportedAttr {
        endpoint: FIRST_ENDPOINT,
        cluster: cluster::PRESSURE,
        attribute: attr::MEASURED_VALUE,
        source: Source::Pressure,
    },
    ReportedAttr {
        endpoint: FIRST_ENDPOINT,
        cluster: cluster::HUMIDITY,
        attribute: attr::MEASURED_VALUE,
        source: Source::Humidity,
    },
    ReportedAttr {
        endpoint: SECOND_ENDPOINT,
        cluster: cluster::TEMPERATURE,
        attribute: attr::MEASURED_VALUE,
        source: Source::Temperature,
    },
];

// ───────────────────────────────────────────────────────────────
// Unit conversion
// ───────────────────────────────────────────────────────────────

/// Protocol encoding of a cached value.
///
/// | Source          | Unit           | Type |
/// |-----------------|----------------|------|
/// | BatteryPercent  | 0.5 %          | u8   |
/// | Temperature     | 0.01 °C        | i16  |
/// | Pressure        | 1 hPa          | i16  |
/// | Humidity        | 0.01 %RH       | u16  |
pub fn encode(source: Source, cache: &MeasurementCache) -> AttrValue {
    match source {
        Source::BatteryPercent => AttrValue::U8((cache.battery_pct * 2.0).round().clamp(0.0, 200.0) as u8),
        Source::Temperature => AttrValue::I16(
            (cache.temperature_c * 100.0)
                .round()
                .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16,
        ),
        Source::Pressure => AttrValue::I16(
            cache
                .pressure_hpa
                .round()
                .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16,
        ),
        Source::Humidity => AttrValue::U16((cache.humidity_pct * 100.0).round().clamp(0.0, 10_000.0) as u16),
    }
}

// ───────────────────────────────────────────────────────────────
// Cycle
// ───────────────────────────────────────────────────────────────

/// Sample, then report every entry of [`REPORTED`].
pub fn run(
    cache: &mut MeasurementCache,
    config: &NodeConfig,
    hw: &mut (impl ReportingPort + SamplingPorts),
) -> SampleOutcome {
    let outcome = sensors::sample_all(cache, config, hw);

    for entry in &REPORTED {
        let value = encode(entry.source, cache);
        hw.report_attribute_changed(entry.endpoint, entry.cluster, entry.attribute, value);
    }

    info!(
        "Report: {} attributes pushed (env {})",
        REPORTED.len(),
        if outcome.environment_fresh { "fresh" } else { "stale" }
    );
    outcome
}
