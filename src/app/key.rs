//! Key handler: edge detection on the single user button and the
//! long-press reset timer.
//!
//! | Edge            | Action                                                  |
//! |-----------------|---------------------------------------------------------|
//! | same code again | dropped, no side effects                                |
//! | → no key        | cancel reset-hold timer (even if never armed)           |
//! | → any key       | recover if orphaned, arm reset-hold timer               |
//!
//! The hold time is a quarter of the configured value while the node has
//! no network, so a factory-new node reaches steering quickly.

use log::{debug, info};

use super::ports::{NetworkPort, TimerPort};
use crate::commissioning::NetworkStatus;
use crate::config::NodeConfig;
use crate::events::{KeyCode, TimerEvent};

/// What a key message resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Same code as last time.
    Repeat,
    /// Key released; reset timer cancelled.
    Released,
    /// Key pressed; reset timer armed for `hold_ms`.
    Pressed { hold_ms: u32 },
}

/// Single-slot memory of the previous key code.
///
/// Starts empty, so the first message is never taken for a repeat, not even
/// a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    last_code: Option<KeyCode>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_code(&self) -> Option<KeyCode> {
        self.last_code
    }

    /// Process one key-change message.  `shift` is only logged.
    pub fn handle(
        &mut self,
        shift: u8,
        code: KeyCode,
        config: &NodeConfig,
        hw: &mut (impl NetworkPort + TimerPort),
    ) -> KeyAction {
        if self.last_code == Some(code) {
            return KeyAction::Repeat;
        }
        let status = hw.status();
        debug!(
            "Key: code=0x{:02X} shift=0x{:02X} status={:?} on_network={}",
            code.0,
            shift,
            status,
            hw.is_on_network()
        );
        self.last_code = Some(code);

        if code.is_release() {
            hw.cancel(TimerEvent::ResetHold);
            return KeyAction::Released;
        }

        if status == NetworkStatus::Orphan {
            info!("Key: orphaned, trying to restore network");
            hw.attempt_recovery();
        }

        let mut hold_ms = config.reset_hold_ms;
        if !hw.is_on_network() {
            hold_ms >>= 2;
        }

        info!("Key: pressed, reset in {} ms if held", hold_ms);
        hw.arm_once(TimerEvent::ResetHold, hold_ms);
        KeyAction::Pressed { hold_ms }
    }
}
