//! Node configuration parameters
//!
//! All tunable timing and retry parameters for the sensor node.
//! The host harness loads overrides from a JSON file; on target the
//! values are compiled in.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::environment::EnvSettings;

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- Rejoin backoff ---
    /// Number of growing rejoin delays before the delay is pinned to the maximum
    pub rejoin_tries: u8,
    /// Rejoin delay after the first parent loss (milliseconds)
    pub rejoin_start_delay_ms: u32,
    /// Multiplier applied to the rejoin delay on each further failure (>= 1.0)
    pub rejoin_backoff_factor: f32,
    /// Ceiling for the rejoin delay once the tries are used up (milliseconds)
    pub rejoin_max_delay_ms: u32,

    // --- Reporting ---
    /// Steady-state report period (milliseconds)
    pub report_period_ms: u32,
    /// Delay before the first report after (re)joining (milliseconds)
    pub first_report_delay_ms: u32,

    // --- Input ---
    /// Button hold time that triggers leave / steering (milliseconds)
    pub reset_hold_ms: u32,

    // --- Sensors ---
    /// Settling time after switching the environmental sensor to normal mode
    pub env_settle_ms: u32,
    /// Environmental sensor oversampling / filter / standby
    pub env: EnvSettings,

    // --- Radio ---
    /// Transmit power set at startup (dBm)
    pub tx_power_dbm: i8,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Rejoin backoff
            rejoin_tries: 20,
            rejoin_start_delay_ms: 10_000,  // 10 s
            rejoin_backoff_factor: 1.2,
            rejoin_max_delay_ms: 1_800_000, // 30 min

            // Reporting
            report_period_ms: 1_800_000, // 30 min
            first_report_delay_ms: 60_000, // 1 min

            // Input
            reset_hold_ms: 10_000,

            // Sensors
            env_settle_ms: 70,
            env: EnvSettings::default(),

            // Radio
            tx_power_dbm: 4,
        }
    }
}

impl NodeConfig {
    /// Reject inconsistent values instead of silently clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rejoin_backoff_factor.is_finite() || self.rejoin_backoff_factor < 1.0 {
            return Err(ConfigError::ValidationFailed(
                "rejoin_backoff_factor must be a finite value >= 1.0",
            ));
        }
        if self.rejoin_start_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("rejoin_start_delay_ms must be > 0"));
        }
        if self.rejoin_start_delay_ms > self.rejoin_max_delay_ms {
            return Err(ConfigError::ValidationFailed(
                "rejoin_start_delay_ms must not exceed rejoin_max_delay_ms",
            ));
        }
        if self.report_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("report_period_ms must be > 0"));
        }
        if self.first_report_delay_ms == 0 {
            return Err(ConfigError::ValidationFailed("first_report_delay_ms must be > 0"));
        }
        if self.reset_hold_ms == 0 {
            return Err(ConfigError::ValidationFailed("reset_hold_ms must be > 0"));
        }
        if !(-22..=20).contains(&self.tx_power_dbm) {
            return Err(ConfigError::ValidationFailed("tx_power_dbm out of range (-22..=20)"));
        }
        Ok(())
    }

    /// Parse a JSON document, falling back to defaults for missing fields.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|_| ConfigError::ValidationFailed("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }
}
