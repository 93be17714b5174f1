//! FlowerNode host simulator.
//!
//! Runs the node core against the simulated board on a virtual clock and
//! replays a fixed day-in-the-life script: factory-new boot, a long press
//! to join, steady reporting, a parent outage with backoff recovery, a
//! remote bind and a flaky environmental sensor.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                       │
//! │                                                              │
//! │  SimNetwork   SoftTimers   LogReporter   Indicator/Rail/ADC  │
//! │       └────────────┴────────────┴──────────────┘             │
//! │                     HardwareAdapter                          │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │   Node: Commissioning · KeyState · Report cycle        │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  MessageQueue (SYS_MSG) · pending EventMask                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `flowernode-sim [CONFIG.json] [HOURS]`

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use flowernode::adapters::hardware::HardwareAdapter;
use flowernode::adapters::network::{Notification, SimNetwork};
use flowernode::app::node::Node;
use flowernode::app::ports::{BindListener, CommissioningListener};
use flowernode::app::report::cluster;
use flowernode::config::NodeConfig;
use flowernode::events::{EventMask, KeyCode, MessageQueue, SysMessage};
use flowernode::sensors::analog::{ILLUMINANCE_CHANNEL, SOIL_MOISTURE_CHANNEL};
use flowernode::sensors::battery::SimBattery;
use flowernode::sensors::environment::{EnvReading, SimEnvSensor};

const DEFAULT_HOURS: u64 = 6;
const MS_PER_HOUR: u64 = 3_600_000;
const BUTTON: KeyCode = KeyCode(0x01);
/// Pack drain per report cycle.
const DRAIN_PER_REPORT_VOLTS: f32 = 0.002;

/// One scripted stimulus.
#[derive(Debug, Clone, Copy)]
enum Step {
    Press,
    Release,
    LoseParent,
    ParentBack,
    SensorPresent(bool),
    RemoteBind,
}

/// `(time_ms, step)`, sorted by time.
const SCRIPT: &[(u64, Step)] = &[
    (5_000, Step::Press),
    (9_000, Step::Release),
    (2 * MS_PER_HOUR, Step::LoseParent),
    (2 * MS_PER_HOUR + 45_000, Step::ParentBack),
    (3 * MS_PER_HOUR, Step::RemoteBind),
    (4 * MS_PER_HOUR, Step::SensorPresent(false)),
    (5 * MS_PER_HOUR, Step::SensorPresent(true)),
];

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => NodeConfig::default(),
    };
    let hours = match args.next() {
        Some(h) => h.parse::<u64>().with_context(|| format!("invalid hour count '{h}'"))?,
        None => DEFAULT_HOURS,
    };

    info!("╔══════════════════════════════════════╗");
    info!("║  FlowerNode sim v{:<20}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let mut network = SimNetwork::new();
    network.set_permit_join(true);
    let mut hw = HardwareAdapter::new(
        network,
        SimBattery::new(2.95),
        SimEnvSensor::new(EnvReading {
            temperature_c: 21.4,
            pressure_hpa: 1008.2,
            humidity_pct: 52.0,
        }),
    );
    hw.adc.set_value(ILLUMINANCE_CHANNEL, 0x6A00);
    hw.adc.set_value(SOIL_MOISTURE_CHANNEL, 0x9100);

    let mut node = Node::new(config);
    let mut queue = MessageQueue::new();

    node.start(&mut hw);
    pump(&mut node, &mut hw, &mut queue, EventMask::NONE);

    let end_ms = run_length_ms(hours)?;
    let mut script = SCRIPT.iter().peekable();

    loop {
        let now = hw.timers.now_ms();
        let next_step = script.peek().map(|(t, _)| *t);
        let next = [next_step, hw.timers.next_deadline(), Some(end_ms)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(end_ms);

        let fired = hw.advance(next - now);
        if fired.contains(EventMask::REPORT) {
            hw.battery.discharge(DRAIN_PER_REPORT_VOLTS);
        }

        while let Some((_, step)) = script.next_if(|(t, _)| *t <= next) {
            apply(*step, &mut hw, &mut queue);
        }

        pump(&mut node, &mut hw, &mut queue, fired);

        if next == end_ms {
            break;
        }
    }

    let m = node.measurements();
    info!(
        "Done after {} h: {} reports sent, {} recoveries, battery {:.3} V",
        hours,
        hw.reporter.sent(),
        hw.network.recoveries(),
        m.battery_volts
    );
    Ok(())
}

fn run_length_ms(hours: u64) -> Result<u64> {
    match hours.checked_mul(MS_PER_HOUR) {
        Some(ms) => Ok(ms),
        None => bail!("hour count {hours} is too large"),
    }
}

fn load_config(path: &Path) -> Result<NodeConfig> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = NodeConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!("Config loaded from {}", path.display());
    Ok(config)
}

fn apply(step: Step, hw: &mut HardwareAdapter, queue: &mut MessageQueue) {
    info!("t={}s script: {:?}", hw.timers.now_ms() / 1_000, step);
    match step {
        Step::Press => post(queue, SysMessage::KeyChange { shift: 0, keys: BUTTON }),
        Step::Release => post(queue, SysMessage::KeyChange { shift: 0, keys: KeyCode::NONE }),
        Step::LoseParent => hw.network.lose_parent(),
        Step::ParentBack => hw.network.set_parent_reachable(true),
        Step::SensorPresent(present) => hw.env.set_present(present),
        Step::RemoteBind => {
            hw.network.remote_bind(cluster::TEMPERATURE, 0x0000, 1);
        }
    }
}

fn post(queue: &mut MessageQueue, msg: SysMessage) {
    if let Err(e) = queue.post(msg) {
        warn!("Message dropped: {}", e);
    }
}

/// Route stack notifications and run the dispatcher until nothing it
/// recognizes is pending.
fn pump(node: &mut Node, hw: &mut HardwareAdapter, queue: &mut MessageQueue, mut pending: EventMask) {
    loop {
        while let Some(n) = hw.network.take_notification() {
            match n {
                Notification::Commissioning(event) => node.on_commissioning(event, hw),
                Notification::State(status) => post(queue, SysMessage::StateChange(status)),
                Notification::Bind(bind) => node.on_bind(&bind, hw),
            }
        }

        pending |= queue.pending();
        if pending.is_empty() {
            return;
        }
        let rest = node.dispatch(pending, hw, queue);
        if rest == pending {
            warn!("Dropping unhandled events {:?}", rest);
            return;
        }
        pending = rest;
    }
}
