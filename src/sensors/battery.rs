//! Battery monitor.
//!
//! Remaining capacity is a linear map of the cell voltage between the
//! empty and full thresholds of a 2×AA / lithium coin pack.  Good enough
//! for a "replace soon" indication; alkaline discharge is far from linear.

use crate::app::ports::BatteryPort;

/// Voltage at which the node browns out.
pub const EMPTY_VOLTS: f32 = 2.0;
/// Voltage of a fresh pack.
pub const FULL_VOLTS: f32 = 3.0;

/// Remaining capacity (0–100 %) for a pack voltage.
pub fn percent_from_voltage(volts: f32) -> f32 {
    if !volts.is_finite() {
        return 0.0;
    }
    ((volts - EMPTY_VOLTS) / (FULL_VOLTS - EMPTY_VOLTS) * 100.0).clamp(0.0, 100.0)
}

/// Simulated battery with an injectable voltage.
#[derive(Debug, Clone)]
pub struct SimBattery {
    volts: f32,
}

impl SimBattery {
    pub fn new(volts: f32) -> Self {
        Self { volts }
    }

    /// Drain the pack by `volts`, never below zero.
    pub fn discharge(&mut self, volts: f32) {
        self.volts = (self.volts - volts).max(0.0);
    }
}

impl BatteryPort for SimBattery {
    fn voltage(&mut self) -> f32 {
        self.volts
    }

    fn remaining_percent(&mut self) -> f32 {
        percent_from_voltage(self.volts)
    }
}
