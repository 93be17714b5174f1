//! Switched supply for the external sensors.
//!
//! A single high-side switch powers the environmental sensor and both
//! analog probes.  It is only on for the duration of one sampling cycle.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct SensorRail<P: OutputPin> {
    pin: P,
    on: bool,
    switch_ons: u32,
}

impl<P: OutputPin> SensorRail<P> {
    /// Takes the enable pin and drives it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("SensorRail: failed to drive enable pin low");
        }
        Self {
            pin,
            on: false,
            switch_ons: 0,
        }
    }

    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            warn!("SensorRail: enable pin write failed (requested {})", on);
            return;
        }
        self.on = on;
        if on {
            self.switch_ons += 1;
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Number of off→on transitions since construction.
    pub fn switch_ons(&self) -> u32 {
        self.switch_ons
    }
}
