//! Board-level output drivers built on `embedded-hal` pins.

pub mod indicator;
pub mod sensor_rail;
