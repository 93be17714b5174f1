//! FlowerNode library.
//!
//! The connectivity-resilient core of a battery-powered mesh sensor node:
//! commissioning and rejoin backoff, the key handler, the power-gated
//! sampling cycle and the periodic report.  Everything outside the core
//! sits behind the port traits in [`app::ports`]; [`adapters`] provides
//! the host-side implementations used by the simulator and tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod commissioning;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod sensors;
