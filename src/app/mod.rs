//! Application core: pure domain logic, zero I/O.
//!
//! The [`node::Node`] dispatcher routes pending events to the key handler,
//! the commissioning state machine and the report cycle.  All interaction
//! with the radio, timers and sensors goes through the **port traits** in
//! [`ports`], keeping this layer testable without real peripherals.

pub mod key;
pub mod node;
pub mod ports;
pub mod report;
