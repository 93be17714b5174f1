//! Integration tests for the commissioning listener and rejoin backoff,
//! driven through the Node the way the network stack drives it.

use crate::mock_hw::{Call, MockBoard};

use flowernode::app::node::Node;
use flowernode::app::ports::{CommissioningListener, IndicatorMode};
use flowernode::commissioning::{
    CommissioningEvent, CommissioningMode as Mode, CommissioningStatus as Status, LinkState,
};
use flowernode::config::NodeConfig;
use flowernode::events::TimerEvent;

fn notify(node: &mut Node, hw: &mut MockBoard, mode: Mode, status: Status) {
    node.on_commissioning(CommissioningEvent::new(mode, status), hw);
}

fn rejoin_delays(hw: &MockBoard) -> Vec<u32> {
    hw.calls
        .iter()
        .filter_map(|c| match c {
            Call::ArmOnce(TimerEvent::Rejoin, d) => Some(*d),
            _ => None,
        })
        .collect()
}

fn doubling_config() -> NodeConfig {
    NodeConfig {
        rejoin_tries: 3,
        rejoin_start_delay_ms: 1_000,
        rejoin_backoff_factor: 2.0,
        rejoin_max_delay_ms: 30_000,
        ..NodeConfig::default()
    }
}

// ── Initialization ────────────────────────────────────────────

#[test]
fn init_without_network_blinks_three_times() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::Initialization, Status::NoNetwork);

    assert_eq!(
        hw.calls,
        vec![Call::Blink {
            count: 3,
            on_ms: 250,
            off_ms: 250
        }]
    );
    assert_eq!(node.commissioning().link(), LinkState::NoNetwork);
    assert!(node.commissioning().backoff().is_initial());
}

#[test]
fn init_restored_schedules_first_report() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::Initialization, Status::NetworkRestored);

    assert_eq!(hw.calls, vec![Call::ArmOnce(TimerEvent::Report, 60_000)]);
    assert_eq!(node.commissioning().link(), LinkState::Connected);
}

#[test]
fn init_other_outcomes_are_ignored() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::Initialization, Status::InProgress);
    notify(&mut node, &mut hw, Mode::Formation, Status::FormationFailure);
    notify(&mut node, &mut hw, Mode::FindingBinding, Status::Success);
    notify(&mut node, &mut hw, Mode::Touchlink, Status::Failure);

    assert!(hw.calls.is_empty());
    assert_eq!(node.commissioning().link(), LinkState::Unknown);
}

// ── Steering ──────────────────────────────────────────────────

#[test]
fn steering_success_blinks_five_then_schedules_report() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::NetworkSteering, Status::Success);

    assert_eq!(
        hw.calls,
        vec![
            Call::Blink {
                count: 5,
                on_ms: 250,
                off_ms: 250
            },
            Call::ArmOnce(TimerEvent::Report, 60_000),
        ]
    );
}

#[test]
fn steering_failure_shows_searching() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::NetworkSteering, Status::NoScanResponse);

    assert_eq!(hw.calls, vec![Call::SetMode(IndicatorMode::Blink)]);
    assert_eq!(node.commissioning().link(), LinkState::Searching);
    assert!(node.commissioning().backoff().is_initial());
}

// ── Parent loss / backoff ─────────────────────────────────────

#[test]
fn parent_loss_backs_off_then_pins_at_max() {
    let mut node = Node::new(doubling_config());
    let mut hw = MockBoard::new();
    for _ in 0..6 {
        notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    }

    assert_eq!(rejoin_delays(&hw), vec![1_000, 2_000, 4_000, 30_000, 30_000, 30_000]);
    assert_eq!(hw.count(|c| *c == Call::SetMode(IndicatorMode::Flash)), 6);
    assert_eq!(node.commissioning().backoff().attempts_remaining(), 0);
    assert_eq!(node.commissioning().link(), LinkState::ParentLost);
}

#[test]
fn parent_loss_catch_all_covers_every_non_restored_status() {
    let mut node = Node::new(doubling_config());
    let mut hw = MockBoard::new();
    for status in [
        Status::Failure,
        Status::BindingTableFull,
        Status::Success,
        Status::InProgress,
        Status::Other(0x42),
    ] {
        notify(&mut node, &mut hw, Mode::ParentLost, status);
    }
    assert_eq!(rejoin_delays(&hw).len(), 5);
}

#[test]
fn unnamed_status_code_is_handled_like_any_other_outcome() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::Initialization, Status::Other(0xFE));
    assert!(hw.calls.is_empty());

    notify(&mut node, &mut hw, Mode::NetworkSteering, Status::Other(0xFE));
    assert_eq!(hw.calls, vec![Call::SetMode(IndicatorMode::Blink)]);
    assert_eq!(node.commissioning().link(), LinkState::Searching);
}

#[test]
fn default_backoff_grows_by_factor() {
    let mut node = Node::new(NodeConfig::default());
    let mut hw = MockBoard::new();
    for _ in 0..3 {
        notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    }
    assert_eq!(rejoin_delays(&hw), vec![10_000, 12_000, 14_400]);
}

#[test]
fn restored_parent_resets_backoff_without_timer() {
    let mut node = Node::new(doubling_config());
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    hw.clear();

    notify(&mut node, &mut hw, Mode::ParentLost, Status::NetworkRestored);
    assert!(hw.calls.is_empty());
    assert!(node.commissioning().backoff().is_initial());
    assert_eq!(node.commissioning().link(), LinkState::Connected);

    notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    assert_eq!(rejoin_delays(&hw), vec![1_000]);
}

#[test]
fn reconnect_after_long_outage_starts_from_scratch() {
    let mut node = Node::new(doubling_config());
    let mut hw = MockBoard::new();
    for _ in 0..10 {
        notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    }
    notify(&mut node, &mut hw, Mode::NetworkSteering, Status::Success);
    assert!(node.commissioning().backoff().is_initial());
    assert_eq!(node.commissioning().backoff().attempts_remaining(), 3);
}

#[test]
fn zero_tries_uses_max_delay_immediately() {
    let mut node = Node::new(NodeConfig {
        rejoin_tries: 0,
        ..doubling_config()
    });
    let mut hw = MockBoard::new();
    notify(&mut node, &mut hw, Mode::ParentLost, Status::NoNetwork);
    assert_eq!(rejoin_delays(&hw), vec![30_000]);
}
