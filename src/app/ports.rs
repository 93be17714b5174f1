//! Port traits: the hexagonal boundary between the node core and its
//! collaborators.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Node (domain)
//! ```
//!
//! The network stack, the reporting service, timers, the indicator LED,
//! power management and the sensor bus all sit behind these traits.  The
//! [`Node`](super::node::Node) consumes them via generics, so the core never
//! touches a radio or a register directly and every path can be driven by
//! a recording test double.
//!
//! Every call is fire-and-forget from the core's point of view: arming a
//! timer, requesting recovery or reporting an attribute returns at once and
//! any outcome re-enters the node later as an event or notification.

use embedded_hal::delay::DelayNs;

use crate::commissioning::{CommissioningEvent, CommissioningRequest, NetworkStatus};
use crate::error::SensorError;
use crate::events::{SysMessage, TimerEvent};
use crate::sensors::analog::{AdcChannel, AdcReference, AdcResolution};
use crate::sensors::environment::{EnvMode, EnvReading, EnvSettings};

// ───────────────────────────────────────────────────────────────
// Network stack
// ───────────────────────────────────────────────────────────────

/// Binding table usage reported by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindCapacity {
    pub max_entries: u16,
    pub used_entries: u16,
}

/// The mesh network stack (join, rejoin, leave).
pub trait NetworkPort {
    /// Current device state.
    fn status(&self) -> NetworkStatus;

    /// Whether the node holds network credentials (stays `true` while orphaned).
    fn is_on_network(&self) -> bool;

    /// Start a commissioning procedure.  The outcome arrives later as a
    /// [`CommissioningEvent`].
    fn start_commissioning(&mut self, request: CommissioningRequest);

    /// Try to find a parent again.  The outcome arrives later as a
    /// `ParentLost` commissioning notification.
    fn attempt_recovery(&mut self);

    /// Leave the network and drop credentials.
    fn leave_network(&mut self);

    /// Radio transmit power in dBm.
    fn set_transmit_power(&mut self, dbm: i8);

    /// Binding table usage.
    fn bind_capacity(&self) -> BindCapacity;
}

// ───────────────────────────────────────────────────────────────
// Reporting service
// ───────────────────────────────────────────────────────────────

/// Attribute value handed to the reporting service, in protocol units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrValue {
    U8(u8),
    I16(i16),
    U16(u16),
}

/// Queues an attribute report for asynchronous delivery.
pub trait ReportingPort {
    fn report_attribute_changed(&mut self, endpoint: u8, cluster: u16, attribute: u16, value: AttrValue);
}

// ───────────────────────────────────────────────────────────────
// Timer service
// ───────────────────────────────────────────────────────────────

/// One-shot and repeating timers keyed by [`TimerEvent`].  Expiry raises
/// the event's bit in the pending mask.
pub trait TimerPort {
    /// Fire once after `delay_ms`.  If the event is already armed as
    /// repeating, only its next deadline moves; the period is kept.
    fn arm_once(&mut self, event: TimerEvent, delay_ms: u32);

    /// Fire every `period_ms`, first after one period.
    fn arm_repeating(&mut self, event: TimerEvent, period_ms: u32);

    /// Disarm.  Cancelling an unarmed timer is a no-op.
    fn cancel(&mut self, event: TimerEvent);
}

// ───────────────────────────────────────────────────────────────
// Indicator
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorId {
    /// The single status LED.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    Off,
    On,
    /// Single short blink.
    Blink,
    /// Continuous flashing for a long while.
    Flash,
    Toggle,
}

pub trait IndicatorPort {
    fn set_mode(&mut self, id: IndicatorId, mode: IndicatorMode);
    fn blink(&mut self, id: IndicatorId, count: u8, on_ms: u32, off_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Power management
// ───────────────────────────────────────────────────────────────

/// Sleep control.  Not reference-counted: one release undoes any number
/// of holds, so callers must pair them.
pub trait PowerPort {
    /// Keep the device awake.
    fn request_hold(&mut self);
    /// Allow low-power sleep again.
    fn request_conserve(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Sensor bus
// ───────────────────────────────────────────────────────────────

/// Raw ADC access.
pub trait AnalogPort {
    fn set_reference(&mut self, reference: AdcReference);
    fn read(&mut self, channel: AdcChannel, resolution: AdcResolution) -> u16;
}

/// Environmental (temperature / pressure / humidity) sensor with its own
/// mode state.  Register-level protocol lives in the adapter.
pub trait EnvSensorPort {
    fn env_init(&mut self) -> Result<(), SensorError>;
    fn env_configure(&mut self, settings: &EnvSettings) -> Result<(), SensorError>;
    fn env_set_mode(&mut self, mode: EnvMode) -> Result<(), SensorError>;
    fn env_fetch(&mut self) -> Result<EnvReading, SensorError>;
}

pub trait BatteryPort {
    /// Battery voltage in volts.
    fn voltage(&mut self) -> f32;
    /// Remaining capacity in percent (0–100).
    fn remaining_percent(&mut self) -> f32;
}

/// The switched supply feeding every external sensor.
pub trait SensorRailPort {
    fn set_sensor_power(&mut self, on: bool);
}

/// Everything the sampling cycle touches.
pub trait SamplingPorts:
    PowerPort + BatteryPort + AnalogPort + EnvSensorPort + SensorRailPort + DelayNs
{
}

impl<T> SamplingPorts for T where
    T: PowerPort + BatteryPort + AnalogPort + EnvSensorPort + SensorRailPort + DelayNs
{
}

/// Everything the dispatcher touches.  A single adapter implements all of
/// it, which avoids juggling several mutable borrows per event.
pub trait NodePorts: NetworkPort + ReportingPort + TimerPort + IndicatorPort + SamplingPorts {}

impl<T> NodePorts for T where T: NetworkPort + ReportingPort + TimerPort + IndicatorPort + SamplingPorts {}

// ───────────────────────────────────────────────────────────────
// Event source and listeners
// ───────────────────────────────────────────────────────────────

/// The asynchronous message queue feeding the dispatcher.
pub trait MessageSource {
    /// Next message in arrival order, `None` once the queue is empty.
    fn receive(&mut self) -> Option<SysMessage>;
}

/// A binding was created on the node by a remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindNotification {
    pub cluster_id: u16,
    pub dst_addr: u16,
    pub dst_endpoint: u8,
}

/// Receives commissioning notifications from the network stack.
pub trait CommissioningListener<H> {
    fn on_commissioning(&mut self, event: CommissioningEvent, hw: &mut H);
}

/// Receives bind notifications from the network stack.
pub trait BindListener<H> {
    fn on_bind(&mut self, notification: &BindNotification, hw: &mut H);
}
