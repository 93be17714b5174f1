//! Integration tests for the key handler: edge detection, orphan recovery
//! and the reset-hold timer.

use crate::mock_hw::{Call, MockBoard};

use flowernode::app::key::{KeyAction, KeyState};
use flowernode::config::NodeConfig;
use flowernode::events::{KeyCode, TimerEvent};

const BUTTON: KeyCode = KeyCode(0x01);

#[test]
fn press_off_network_uses_quarter_hold() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::new();
    let action = keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);

    assert_eq!(action, KeyAction::Pressed { hold_ms: 2_500 });
    assert_eq!(hw.calls, vec![Call::ArmOnce(TimerEvent::ResetHold, 2_500)]);
}

#[test]
fn press_on_network_uses_full_hold() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::connected();
    keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);
    assert_eq!(hw.calls, vec![Call::ArmOnce(TimerEvent::ResetHold, 10_000)]);
}

#[test]
fn press_while_orphaned_recovers_before_arming() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::orphaned();
    keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);

    assert_eq!(
        hw.calls,
        vec![Call::AttemptRecovery, Call::ArmOnce(TimerEvent::ResetHold, 10_000)]
    );
}

#[test]
fn repeated_code_is_ignored() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::new();
    keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);
    hw.clear();

    let action = keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);
    assert_eq!(action, KeyAction::Repeat);
    assert!(hw.calls.is_empty());
}

#[test]
fn release_cancels_reset_hold() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::new();
    keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);
    hw.clear();

    let action = keys.handle(0, KeyCode::NONE, &NodeConfig::default(), &mut hw);
    assert_eq!(action, KeyAction::Released);
    assert_eq!(hw.calls, vec![Call::Cancel(TimerEvent::ResetHold)]);
    assert_eq!(keys.last_code(), Some(KeyCode::NONE));
}

#[test]
fn first_release_on_fresh_handler_cancels_reset_hold() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::new();
    assert_eq!(keys.last_code(), None);

    let action = keys.handle(0, KeyCode::NONE, &NodeConfig::default(), &mut hw);
    assert_eq!(action, KeyAction::Released);
    assert_eq!(hw.calls, vec![Call::Cancel(TimerEvent::ResetHold)]);

    hw.clear();
    let again = keys.handle(0, KeyCode::NONE, &NodeConfig::default(), &mut hw);
    assert_eq!(again, KeyAction::Repeat);
    assert!(hw.calls.is_empty());
}

#[test]
fn different_key_rearms() {
    let mut keys = KeyState::new();
    let mut hw = MockBoard::connected();
    keys.handle(0, BUTTON, &NodeConfig::default(), &mut hw);
    keys.handle(0x02, KeyCode(0x03), &NodeConfig::default(), &mut hw);

    assert_eq!(hw.count(|c| matches!(c, Call::ArmOnce(TimerEvent::ResetHold, _))), 2);
    assert_eq!(keys.last_code(), Some(KeyCode(0x03)));
}

#[test]
fn hold_scales_with_config() {
    let config = NodeConfig {
        reset_hold_ms: 3,
        ..NodeConfig::default()
    };
    let mut keys = KeyState::new();
    let mut hw = MockBoard::new();
    let action = keys.handle(0, BUTTON, &config, &mut hw);
    assert_eq!(action, KeyAction::Pressed { hold_ms: 0 });
}
