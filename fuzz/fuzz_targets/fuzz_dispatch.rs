//! Fuzz target: `Node::dispatch` on the simulated board
//!
//! Interprets the input as a script of key edges, clock steps, network
//! faults and raw event masks.  After every step the board must be back
//! asleep with the sensor rail off, and any armed rejoin delay must stay
//! within the configured cap.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use flowernode::adapters::hardware::HardwareAdapter;
use flowernode::adapters::network::{Notification, SimNetwork};
use flowernode::app::node::Node;
use flowernode::app::ports::{BindListener, CommissioningListener};
use flowernode::config::NodeConfig;
use flowernode::events::{EventMask, KeyCode, MessageQueue, SysMessage, TimerEvent};
use flowernode::sensors::battery::SimBattery;
use flowernode::sensors::environment::{EnvReading, SimEnvSensor};
use libfuzzer_sys::fuzz_target;

fn pump(node: &mut Node, hw: &mut HardwareAdapter, queue: &mut MessageQueue, mut pending: EventMask) {
    // Bounded so a livelock shows up as a failed assertion, not a hang.
    for _ in 0..64 {
        while let Some(n) = hw.network.take_notification() {
            match n {
                Notification::Commissioning(ev) => node.on_commissioning(ev, hw),
                Notification::State(s) => {
                    let _ = queue.post(SysMessage::StateChange(s));
                }
                Notification::Bind(b) => node.on_bind(&b, hw),
            }
        }
        pending |= queue.pending();
        if pending.is_empty() {
            return;
        }
        let rest = node.dispatch(pending, hw, queue);
        if rest == pending {
            return;
        }
        pending = rest;
    }
    panic!("dispatcher did not settle");
}

fuzz_target!(|data: &[u8]| {
    let config = NodeConfig::default();
    let max_delay = config.rejoin_max_delay_ms;
    let mut node = Node::new(config);
    let mut hw = HardwareAdapter::new(
        SimNetwork::commissioned(),
        SimBattery::new(2.9),
        SimEnvSensor::new(EnvReading {
            temperature_c: 20.0,
            pressure_hpa: 1000.0,
            humidity_pct: 50.0,
        }),
    );
    let mut queue = MessageQueue::new();

    node.start(&mut hw);
    pump(&mut node, &mut hw, &mut queue, EventMask::NONE);

    for pair in data.chunks(2) {
        let op = pair[0];
        let arg = pair.get(1).copied().unwrap_or(0);
        match op % 8 {
            0 => {
                let _ = queue.post(SysMessage::KeyChange {
                    shift: 0,
                    keys: KeyCode(arg & 0x03),
                });
                pump(&mut node, &mut hw, &mut queue, EventMask::NONE);
            }
            1 | 2 => {
                let fired = hw.advance(u64::from(arg) * 1_000);
                pump(&mut node, &mut hw, &mut queue, fired);
            }
            3 => hw.network.lose_parent(),
            4 => hw.network.set_parent_reachable(arg & 1 == 1),
            5 => hw.network.set_permit_join(arg & 1 == 1),
            6 => hw.env.set_present(arg & 1 == 1),
            _ => {
                let raw = EventMask(u16::from(arg) << (op >> 4));
                pump(&mut node, &mut hw, &mut queue, raw);
            }
        }

        assert!(!hw.rail().is_on());
        assert!(!hw.power().held);
        if let Some(left) = hw.timers.remaining_ms(TimerEvent::Rejoin) {
            assert!(left <= u64::from(max_delay));
        }
    }
});
