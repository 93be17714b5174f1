//! Hardware adapter: bridges the simulated board to the node's port traits.
//!
//! Owns the network stack, timers, reporting service, LED, sensor rail
//! and every sensor model, and implements all of [`NodePorts`] on one
//! struct so the dispatcher takes a single `&mut`.  This is the only
//! module that knows which concrete peripheral backs each port.
//!
//! [`NodePorts`]: crate::app::ports::NodePorts

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, warn};

use super::log_sink::LogReporter;
use super::network::SimNetwork;
use super::timers::SoftTimers;
use crate::app::ports::{
    AnalogPort, AttrValue, BatteryPort, BindCapacity, EnvSensorPort, IndicatorId, IndicatorMode,
    IndicatorPort, NetworkPort, PowerPort, ReportingPort, SensorRailPort, TimerPort,
};
use crate::commissioning::{CommissioningRequest, NetworkStatus};
use crate::drivers::indicator::Indicator;
use crate::drivers::sensor_rail::SensorRail;
use crate::error::SensorError;
use crate::events::TimerEvent;
use crate::sensors::analog::{AdcChannel, AdcReference, AdcResolution, SimAdc};
use crate::sensors::battery::SimBattery;
use crate::sensors::environment::{EnvMode, EnvReading, EnvSettings, SimEnvSensor};

/// GPIO output that only remembers its level.
#[derive(Debug, Default)]
pub struct SimPin {
    high: bool,
}

impl SimPin {
    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// Power-manager bookkeeping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PowerState {
    pub held: bool,
    pub holds: u32,
    pub conserves: u32,
}

/// Concrete adapter that combines the whole simulated board.
pub struct HardwareAdapter {
    pub network: SimNetwork,
    pub timers: SoftTimers,
    pub reporter: LogReporter,
    pub adc: SimAdc,
    pub battery: SimBattery,
    pub env: SimEnvSensor,
    indicator: Indicator<SimPin>,
    rail: SensorRail<SimPin>,
    power: PowerState,
    busy_wait_ns: u64,
}

impl HardwareAdapter {
    pub fn new(network: SimNetwork, battery: SimBattery, env: SimEnvSensor) -> Self {
        Self {
            network,
            timers: SoftTimers::new(),
            reporter: LogReporter::new(),
            adc: SimAdc::new(),
            battery,
            env,
            indicator: Indicator::new(SimPin::default()),
            rail: SensorRail::new(SimPin::default()),
            power: PowerState::default(),
            busy_wait_ns: 0,
        }
    }

    /// Advance the board clock: timers and LED sequence.  Returns the
    /// timer events that expired.
    pub fn advance(&mut self, elapsed_ms: u64) -> crate::events::EventMask {
        self.indicator.tick(u32::try_from(elapsed_ms).unwrap_or(u32::MAX));
        self.timers.advance(elapsed_ms)
    }

    pub fn indicator(&self) -> &Indicator<SimPin> {
        &self.indicator
    }

    pub fn rail(&self) -> &SensorRail<SimPin> {
        &self.rail
    }

    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Total time spent in blocking delays.
    pub fn busy_wait_ms(&self) -> u64 {
        self.busy_wait_ns / 1_000_000
    }
}

// ── NetworkPort ───────────────────────────────────────────────

impl NetworkPort for HardwareAdapter {
    fn status(&self) -> NetworkStatus {
        self.network.status()
    }

    fn is_on_network(&self) -> bool {
        self.network.is_on_network()
    }

    fn start_commissioning(&mut self, request: CommissioningRequest) {
        self.network.start_commissioning(request);
    }

    fn attempt_recovery(&mut self) {
        self.network.attempt_recovery();
    }

    fn leave_network(&mut self) {
        self.network.leave_network();
    }

    fn set_transmit_power(&mut self, dbm: i8) {
        self.network.set_transmit_power(dbm);
    }

    fn bind_capacity(&self) -> BindCapacity {
        self.network.bind_capacity()
    }
}

// ── ReportingPort / TimerPort ─────────────────────────────────

impl ReportingPort for HardwareAdapter {
    fn report_attribute_changed(&mut self, endpoint: u8, cluster: u16, attribute: u16, value: AttrValue) {
        self.reporter.report_attribute_changed(endpoint, cluster, attribute, value);
    }
}

impl TimerPort for HardwareAdapter {
    fn arm_once(&mut self, event: TimerEvent, delay_ms: u32) {
        self.timers.arm_once(event, delay_ms);
    }

    fn arm_repeating(&mut self, event: TimerEvent, period_ms: u32) {
        self.timers.arm_repeating(event, period_ms);
    }

    fn cancel(&mut self, event: TimerEvent) {
        self.timers.cancel(event);
    }
}

// ── IndicatorPort ─────────────────────────────────────────────

impl IndicatorPort for HardwareAdapter {
    fn set_mode(&mut self, id: IndicatorId, mode: IndicatorMode) {
        match id {
            IndicatorId::Status => self.indicator.set_mode(mode),
        }
    }

    fn blink(&mut self, id: IndicatorId, count: u8, on_ms: u32, off_ms: u32) {
        match id {
            IndicatorId::Status => self.indicator.blink(count, on_ms, off_ms),
        }
    }
}

// ── PowerPort ─────────────────────────────────────────────────

impl PowerPort for HardwareAdapter {
    fn request_hold(&mut self) {
        if self.power.held {
            warn!("Power: hold requested while already held");
        }
        self.power.held = true;
        self.power.holds += 1;
    }

    fn request_conserve(&mut self) {
        self.power.held = false;
        self.power.conserves += 1;
        debug!("Power: conserve");
    }
}

// ── Sensor ports ──────────────────────────────────────────────

impl BatteryPort for HardwareAdapter {
    fn voltage(&mut self) -> f32 {
        self.battery.voltage()
    }

    fn remaining_percent(&mut self) -> f32 {
        self.battery.remaining_percent()
    }
}

impl SensorRailPort for HardwareAdapter {
    fn set_sensor_power(&mut self, on: bool) {
        self.rail.set(on);
    }
}

impl AnalogPort for HardwareAdapter {
    fn set_reference(&mut self, reference: AdcReference) {
        self.adc.set_reference(reference);
    }

    fn read(&mut self, channel: AdcChannel, resolution: AdcResolution) -> u16 {
        if !self.rail.is_on() {
            return 0;
        }
        self.adc.read(channel, resolution)
    }
}

impl EnvSensorPort for HardwareAdapter {
    fn env_init(&mut self) -> Result<(), SensorError> {
        if !self.rail.is_on() {
            return Err(SensorError::InitFailed);
        }
        self.env.env_init()
    }

    fn env_configure(&mut self, settings: &EnvSettings) -> Result<(), SensorError> {
        self.env.env_configure(settings)
    }

    fn env_set_mode(&mut self, mode: EnvMode) -> Result<(), SensorError> {
        self.env.env_set_mode(mode)
    }

    fn env_fetch(&mut self) -> Result<EnvReading, SensorError> {
        self.env.env_fetch()
    }
}

impl DelayNs for HardwareAdapter {
    fn delay_ns(&mut self, ns: u32) {
        self.busy_wait_ns += u64::from(ns);
    }
}
