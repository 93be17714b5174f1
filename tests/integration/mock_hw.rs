//! Mock board for integration tests.
//!
//! Implements every port the node touches and records each call so tests
//! can assert on the full command history, in order, without a radio or
//! sensor bus.

use embedded_hal::delay::DelayNs;
use flowernode::app::ports::{
    AnalogPort, AttrValue, BatteryPort, BindCapacity, EnvSensorPort, IndicatorId, IndicatorMode,
    IndicatorPort, NetworkPort, PowerPort, ReportingPort, SensorRailPort, TimerPort,
};
use flowernode::commissioning::{CommissioningRequest, NetworkStatus};
use flowernode::error::SensorError;
use flowernode::events::TimerEvent;
use flowernode::sensors::analog::{AdcChannel, AdcReference, AdcResolution};
use flowernode::sensors::environment::{EnvMode, EnvReading, EnvSettings};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetTxPower(i8),
    StartCommissioning(CommissioningRequest),
    AttemptRecovery,
    LeaveNetwork,
    Report {
        endpoint: u8,
        cluster: u16,
        attribute: u16,
        value: AttrValue,
    },
    ArmOnce(TimerEvent, u32),
    ArmRepeating(TimerEvent, u32),
    Cancel(TimerEvent),
    SetMode(IndicatorMode),
    Blink { count: u8, on_ms: u32, off_ms: u32 },
    Hold,
    Conserve,
    SetReference(AdcReference),
    AdcRead(AdcChannel),
    EnvInit,
    EnvConfigure,
    EnvSetMode(EnvMode),
    EnvFetch,
    SensorPower(bool),
    DelayMs(u32),
}

/// Which step of the environmental read protocol fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFault {
    Init,
    Configure,
    Mode,
    Fetch,
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub calls: Vec<Call>,
    pub status: NetworkStatus,
    pub on_network: bool,
    pub bind: BindCapacity,
    pub battery_volts: f32,
    pub battery_pct: f32,
    pub env_reading: EnvReading,
    pub env_fault: Option<EnvFault>,
    pub adc_value: u16,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            status: NetworkStatus::NoNetwork,
            on_network: false,
            bind: BindCapacity {
                max_entries: 4,
                used_entries: 0,
            },
            battery_volts: 2.9,
            battery_pct: 90.0,
            env_reading: EnvReading {
                temperature_c: 21.5,
                pressure_hpa: 1012.0,
                humidity_pct: 45.0,
            },
            env_fault: None,
            adc_value: 1234,
        }
    }

    /// A board whose node is joined and talking to its parent.
    pub fn connected() -> Self {
        Self {
            status: NetworkStatus::Connected,
            on_network: true,
            ..Self::new()
        }
    }

    /// A board whose node holds credentials but lost its parent.
    pub fn orphaned() -> Self {
        Self {
            status: NetworkStatus::Orphan,
            on_network: true,
            ..Self::new()
        }
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn reports(&self) -> Vec<(u8, u16, u16, AttrValue)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Report {
                    endpoint,
                    cluster,
                    attribute,
                    value,
                } => Some((*endpoint, *cluster, *attribute, *value)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    fn env_step(&mut self, step: EnvFault, call: Call, error: SensorError) -> Result<(), SensorError> {
        self.calls.push(call);
        if self.env_fault == Some(step) { Err(error) } else { Ok(()) }
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ── Port implementations ──────────────────────────────────────

impl NetworkPort for MockBoard {
    fn status(&self) -> NetworkStatus {
        self.status
    }

    fn is_on_network(&self) -> bool {
        self.on_network
    }

    fn start_commissioning(&mut self, request: CommissioningRequest) {
        self.calls.push(Call::StartCommissioning(request));
    }

    fn attempt_recovery(&mut self) {
        self.calls.push(Call::AttemptRecovery);
    }

    fn leave_network(&mut self) {
        self.calls.push(Call::LeaveNetwork);
    }

    fn set_transmit_power(&mut self, dbm: i8) {
        self.calls.push(Call::SetTxPower(dbm));
    }

    fn bind_capacity(&self) -> BindCapacity {
        self.bind
    }
}

impl ReportingPort for MockBoard {
    fn report_attribute_changed(&mut self, endpoint: u8, cluster: u16, attribute: u16, value: AttrValue) {
        self.calls.push(Call::Report {
            endpoint,
            cluster,
            attribute,
            value,
        });
    }
}

impl TimerPort for MockBoard {
    fn arm_once(&mut self, event: TimerEvent, delay_ms: u32) {
        self.calls.push(Call::ArmOnce(event, delay_ms));
    }

    fn arm_repeating(&mut self, event: TimerEvent, period_ms: u32) {
        self.calls.push(Call::ArmRepeating(event, period_ms));
    }

    fn cancel(&mut self, event: TimerEvent) {
        self.calls.push(Call::Cancel(event));
    }
}

impl IndicatorPort for MockBoard {
    fn set_mode(&mut self, _id: IndicatorId, mode: IndicatorMode) {
        self.calls.push(Call::SetMode(mode));
    }

    fn blink(&mut self, _id: IndicatorId, count: u8, on_ms: u32, off_ms: u32) {
        self.calls.push(Call::Blink { count, on_ms, off_ms });
    }
}

impl PowerPort for MockBoard {
    fn request_hold(&mut self) {
        self.calls.push(Call::Hold);
    }

    fn request_conserve(&mut self) {
        self.calls.push(Call::Conserve);
    }
}

impl BatteryPort for MockBoard {
    fn voltage(&mut self) -> f32 {
        self.battery_volts
    }

    fn remaining_percent(&mut self) -> f32 {
        self.battery_pct
    }
}

impl AnalogPort for MockBoard {
    fn set_reference(&mut self, reference: AdcReference) {
        self.calls.push(Call::SetReference(reference));
    }

    fn read(&mut self, channel: AdcChannel, _resolution: AdcResolution) -> u16 {
        self.calls.push(Call::AdcRead(channel));
        self.adc_value
    }
}

impl EnvSensorPort for MockBoard {
    fn env_init(&mut self) -> Result<(), SensorError> {
        self.env_step(EnvFault::Init, Call::EnvInit, SensorError::InitFailed)
    }

    fn env_configure(&mut self, _settings: &EnvSettings) -> Result<(), SensorError> {
        self.env_step(EnvFault::Configure, Call::EnvConfigure, SensorError::ConfigureFailed)
    }

    fn env_set_mode(&mut self, mode: EnvMode) -> Result<(), SensorError> {
        self.env_step(EnvFault::Mode, Call::EnvSetMode(mode), SensorError::ModeFailed)
    }

    fn env_fetch(&mut self) -> Result<EnvReading, SensorError> {
        self.env_step(EnvFault::Fetch, Call::EnvFetch, SensorError::ReadFailed)?;
        Ok(self.env_reading)
    }
}

impl SensorRailPort for MockBoard {
    fn set_sensor_power(&mut self, on: bool) {
        self.calls.push(Call::SensorPower(on));
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(Call::DelayMs(ms));
    }
}
