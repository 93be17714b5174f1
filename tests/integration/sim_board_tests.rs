//! End-to-end scenarios on the simulated board: real timers, scripted
//! network stack, LED and sensor models wired to the Node.

use flowernode::adapters::hardware::HardwareAdapter;
use flowernode::adapters::log_sink::AttrReport;
use flowernode::adapters::network::{Notification, SimNetwork};
use flowernode::app::node::Node;
use flowernode::app::ports::{AttrValue, BindListener, CommissioningListener, NetworkPort};
use flowernode::app::report::{attr, cluster, SECOND_ENDPOINT};
use flowernode::commissioning::{LinkState, NetworkStatus};
use flowernode::config::NodeConfig;
use flowernode::events::{EventMask, KeyCode, MessageQueue, SysMessage, TimerEvent};
use flowernode::sensors::battery::SimBattery;
use flowernode::sensors::environment::{EnvReading, SimEnvSensor};

struct Rig {
    node: Node,
    hw: HardwareAdapter,
    queue: MessageQueue,
}

impl Rig {
    fn new(network: SimNetwork) -> Self {
        let hw = HardwareAdapter::new(
            network,
            SimBattery::new(2.9),
            SimEnvSensor::new(EnvReading {
                temperature_c: 19.0,
                pressure_hpa: 995.0,
                humidity_pct: 60.0,
            }),
        );
        let mut rig = Self {
            node: Node::new(NodeConfig::default()),
            hw,
            queue: MessageQueue::new(),
        };
        rig.node.start(&mut rig.hw);
        rig.pump(EventMask::NONE);
        rig
    }

    fn pump(&mut self, mut pending: EventMask) {
        loop {
            while let Some(n) = self.hw.network.take_notification() {
                match n {
                    Notification::Commissioning(ev) => self.node.on_commissioning(ev, &mut self.hw),
                    Notification::State(s) => self.queue.post(SysMessage::StateChange(s)).unwrap(),
                    Notification::Bind(b) => self.node.on_bind(&b, &mut self.hw),
                }
            }
            pending |= self.queue.pending();
            if pending.is_empty() {
                return;
            }
            let rest = self.node.dispatch(pending, &mut self.hw, &mut self.queue);
            assert_ne!(rest, pending, "dispatcher made no progress");
            pending = rest;
        }
    }

    fn run_for(&mut self, ms: u64) {
        let end = self.hw.timers.now_ms() + ms;
        while let Some(deadline) = self.hw.timers.next_deadline().filter(|d| *d <= end) {
            let fired = self.hw.advance(deadline - self.hw.timers.now_ms());
            self.pump(fired);
        }
        let rest = end - self.hw.timers.now_ms();
        let fired = self.hw.advance(rest);
        self.pump(fired);
    }

    fn key(&mut self, code: u8) {
        self.queue
            .post(SysMessage::KeyChange {
                shift: 0,
                keys: KeyCode(code),
            })
            .unwrap();
        self.pump(EventMask::NONE);
    }
}

#[test]
fn commissioned_node_rejoins_and_reports_early() {
    let mut rig = Rig::new(SimNetwork::commissioned());
    assert_eq!(rig.hw.network.status(), NetworkStatus::Connected);
    assert_eq!(rig.hw.network.tx_power_dbm(), Some(4));
    assert_eq!(rig.hw.timers.remaining_ms(TimerEvent::Report), Some(60_000));

    rig.run_for(60_000);
    assert_eq!(rig.hw.reporter.sent(), 5);
    assert_eq!(
        rig.hw.reporter.last(),
        Some(AttrReport {
            endpoint: SECOND_ENDPOINT,
            cluster: cluster::TEMPERATURE,
            attribute: attr::MEASURED_VALUE,
            value: AttrValue::I16(1900),
        })
    );
    assert!(!rig.hw.power().held);
    assert!(!rig.hw.rail().is_on());

    rig.run_for(1_800_000);
    assert_eq!(rig.hw.reporter.sent(), 10);
}

#[test]
fn long_press_joins_open_network() {
    let mut network = SimNetwork::new();
    network.set_permit_join(true);
    let mut rig = Rig::new(network);
    assert_eq!(rig.node.commissioning().link(), LinkState::NoNetwork);

    rig.key(0x01);
    rig.run_for(2_500);
    assert!(rig.hw.network.is_on_network());
    assert_eq!(rig.node.commissioning().link(), LinkState::Connected);

    rig.key(0x00);
    assert!(!rig.hw.timers.is_armed(TimerEvent::ResetHold));
}

#[test]
fn short_press_does_nothing() {
    let mut network = SimNetwork::new();
    network.set_permit_join(true);
    let mut rig = Rig::new(network);

    rig.key(0x01);
    rig.run_for(1_000);
    rig.key(0x00);
    rig.run_for(10_000);
    assert!(!rig.hw.network.is_on_network());
}

#[test]
fn long_press_on_network_leaves() {
    let mut rig = Rig::new(SimNetwork::commissioned());
    rig.key(0x01);
    rig.run_for(10_000);
    assert!(!rig.hw.network.is_on_network());
    assert_eq!(rig.hw.network.status(), NetworkStatus::NoNetwork);
}

#[test]
fn parent_outage_recovers_through_backoff() {
    let mut rig = Rig::new(SimNetwork::commissioned());
    rig.run_for(60_000);

    rig.hw.network.lose_parent();
    rig.pump(EventMask::NONE);
    assert_eq!(rig.node.commissioning().link(), LinkState::ParentLost);
    assert_eq!(rig.hw.timers.remaining_ms(TimerEvent::Rejoin), Some(10_000));
    assert!(rig.hw.indicator().is_sequencing());

    // First retry fails and backs off.
    rig.run_for(10_000);
    assert_eq!(rig.hw.network.recoveries(), 1);
    assert_eq!(rig.hw.timers.remaining_ms(TimerEvent::Rejoin), Some(12_000));

    rig.hw.network.set_parent_reachable(true);
    rig.run_for(12_000);
    assert_eq!(rig.hw.network.status(), NetworkStatus::Connected);
    assert!(rig.node.commissioning().backoff().is_initial());
    assert!(!rig.hw.timers.is_armed(TimerEvent::Rejoin));
}

#[test]
fn sensor_dropout_keeps_reporting_stale_values() {
    let mut rig = Rig::new(SimNetwork::commissioned());
    rig.run_for(60_000);
    let before = *rig.node.measurements();

    rig.hw.env.set_present(false);
    rig.hw.env.set_reading(EnvReading {
        temperature_c: 30.0,
        pressure_hpa: 1020.0,
        humidity_pct: 20.0,
    });
    rig.run_for(1_800_000);

    assert_eq!(rig.hw.reporter.sent(), 10);
    assert!((rig.node.measurements().temperature_c - before.temperature_c).abs() < f32::EPSILON);

    rig.hw.env.set_present(true);
    rig.run_for(1_800_000);
    assert!((rig.node.measurements().temperature_c - 30.0).abs() < f32::EPSILON);
}

#[test]
fn remote_bind_is_acknowledged() {
    let mut rig = Rig::new(SimNetwork::commissioned());
    assert!(rig.hw.network.remote_bind(0x0402, 0x0000, 1));
    rig.pump(EventMask::NONE);
    assert_eq!(rig.hw.network.bind_capacity().used_entries, 1);
    assert!(rig.hw.indicator().is_sequencing());
}
