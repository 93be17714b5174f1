//! Unified error types for the sensor node core.
//!
//! Nothing in the core is fatal: every variant here ends up logged and
//! absorbed by the caller (stale sensor value, dropped message, rejected
//! config).  All variants are `Copy` so they can be passed around without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be brought up or read.
    Sensor(SensorError),
    /// Configuration is inconsistent.
    Config(ConfigError),
    /// The asynchronous message queue rejected a message.
    Queue(QueueError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Queue(e) => write!(f, "queue: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device did not answer or reported the wrong chip id.
    InitFailed,
    /// Oversampling / filter / standby settings were not accepted.
    ConfigureFailed,
    /// The power-mode change was rejected.
    ModeFailed,
    /// A data fetch was attempted before the device was measuring.
    NotReady,
    /// Bus transaction failed while fetching data.
    ReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "init failed"),
            Self::ConfigureFailed => write!(f, "configure failed"),
            Self::ModeFailed => write!(f, "mode change failed"),
            Self::NotReady => write!(f, "not measuring"),
            Self::ReadFailed => write!(f, "read failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.  The string names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The fixed-capacity queue is full; the message was dropped.
    Full,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "message queue full"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
