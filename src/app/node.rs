//! The node: event dispatcher and hexagonal core.
//!
//! [`Node`] owns every piece of mutable state (backoff, key memory,
//! measurement cache) and exposes two entry points:
//!
//! - [`Node::start`]: one-time initialization.
//! - [`Node::dispatch`]: handle one class of pending events and return the
//!   bits still outstanding.
//!
//! ```text
//!  MessageSource ──▶ ┌────────────────────────────┐ ──▶ ReportingPort
//!  EventMask ──────▶ │            Node            │ ──▶ TimerPort
//!                    │  KeyState · Commissioning  │ ──▶ IndicatorPort
//!  NetworkPort ◀───▶ │  MeasurementCache          │ ──▶ Sampling ports
//!                    └────────────────────────────┘
//! ```
//!
//! Dispatch is run-to-completion on a single thread; the external
//! scheduler calls it again while bits remain.

use log::{debug, info};

use super::key::KeyState;
use super::ports::{
    BindListener, BindNotification, CommissioningListener, IndicatorId, IndicatorMode,
    MessageSource, NodePorts,
};
use super::report;
use crate::commissioning::{
    Commissioning, CommissioningEvent, CommissioningRequest, NetworkStatus, Transition,
};
use crate::config::NodeConfig;
use crate::events::{EventMask, IncomingMessage, SysMessage, TimerEvent};
use crate::sensors::MeasurementCache;

pub struct Node {
    config: NodeConfig,
    commissioning: Commissioning,
    keys: KeyState,
    cache: MeasurementCache,
}

impl Node {
    /// Construct the node from configuration.
    ///
    /// Does **not** touch any port; call [`start`](Self::start) next.
    pub fn new(config: NodeConfig) -> Self {
        let commissioning = Commissioning::new(&config);
        Self {
            config,
            commissioning,
            keys: KeyState::new(),
            cache: MeasurementCache::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the node up: radio power, silent rejoin of the stored network,
    /// the steady-state report timer, and sleep.
    pub fn start(&mut self, hw: &mut impl NodePorts) {
        info!("Node: starting v{}", env!("CARGO_PKG_VERSION"));
        hw.set_transmit_power(self.config.tx_power_dbm);
        hw.start_commissioning(CommissioningRequest::RejoinExistingOnStartup);
        hw.arm_repeating(TimerEvent::Report, self.config.report_period_ms);
        hw.request_conserve();
        info!(
            "Node: battery {:.2} V ({:.0}%)",
            hw.voltage(),
            hw.remaining_percent()
        );
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Handle the highest-priority class in `events` and return the rest.
    ///
    /// Priority: queued messages, rejoin timer, reset-hold timer, report
    /// timer.  Exactly one recognized class is consumed per call; bits
    /// this node does not own are passed through unchanged.
    pub fn dispatch(
        &mut self,
        events: EventMask,
        hw: &mut impl NodePorts,
        queue: &mut impl MessageSource,
    ) -> EventMask {
        if events.contains(EventMask::SYS_MSG) {
            while let Some(msg) = queue.receive() {
                self.handle_message(msg, hw);
            }
            return events.without(EventMask::SYS_MSG);
        }

        if events.contains(EventMask::REJOIN) {
            info!("Node: rejoin timer fired, attempting recovery");
            hw.attempt_recovery();
            return events.without(EventMask::REJOIN);
        }

        if events.contains(EventMask::RESET_HOLD) {
            self.rejoin_or_leave(hw);
            return events.without(EventMask::RESET_HOLD);
        }

        if events.contains(EventMask::REPORT) {
            info!("Node: report timer fired");
            report::run(&mut self.cache, &self.config, hw);
            return events.without(EventMask::REPORT);
        }

        if !events.is_empty() {
            debug!("Node: passing through unknown events {:?}", events);
        }
        events
    }

    fn handle_message(&mut self, msg: SysMessage, hw: &mut impl NodePorts) {
        match msg {
            SysMessage::KeyChange { shift, keys } => {
                self.keys.handle(shift, keys, &self.config, hw);
            }
            SysMessage::StateChange(status) => {
                hw.set_mode(IndicatorId::Status, IndicatorMode::Blink);
                info!("Node: network state {:?}", status);
                if status == NetworkStatus::Connected {
                    hw.set_mode(IndicatorId::Status, IndicatorMode::Off);
                }
            }
            SysMessage::Incoming(incoming) => Self::process_incoming(incoming),
            SysMessage::DataConfirm { .. } => {}
            SysMessage::Other { event, status } => {
                debug!("Node: unhandled message event=0x{:02X} status=0x{:02X}", event, status);
            }
        }
    }

    /// No application commands are served; the frame is logged and its
    /// attribute-command payload is freed when `msg` goes out of scope.
    fn process_incoming(msg: IncomingMessage) {
        info!(
            "Node: incoming src=0x{:04X} ep=0x{:02X} cluster=0x{:04X} cmd=0x{:02X} payload={}B",
            msg.src_addr,
            msg.endpoint,
            msg.cluster_id,
            msg.command_id,
            msg.attr_cmd.as_ref().map_or(0, |p| p.len()),
        );
    }

    /// Long-press action: leave the network if joined, otherwise steer.
    fn rejoin_or_leave(&mut self, hw: &mut impl NodePorts) {
        hw.set_mode(IndicatorId::Status, IndicatorMode::Flash);
        if hw.is_on_network() {
            info!("Node: reset hold elapsed, leaving network");
            hw.leave_network();
        } else {
            info!("Node: reset hold elapsed, starting network steering");
            hw.start_commissioning(CommissioningRequest::NetworkSteering);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn commissioning(&self) -> &Commissioning {
        &self.commissioning
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub fn measurements(&self) -> &MeasurementCache {
        &self.cache
    }
}

// ── Listeners ─────────────────────────────────────────────────

impl<H: NodePorts> CommissioningListener<H> for Node {
    fn on_commissioning(&mut self, event: CommissioningEvent, hw: &mut H) {
        let transition = self.commissioning.on_status(&event, &self.config, hw);
        if transition != Transition::Ignored {
            debug!("Node: commissioning -> {:?} ({:?})", transition, self.commissioning.link());
        }
    }
}

impl<H: NodePorts> BindListener<H> for Node {
    fn on_bind(&mut self, notification: &BindNotification, hw: &mut H) {
        hw.set_mode(IndicatorId::Status, IndicatorMode::Blink);
        let capacity = hw.bind_capacity();
        info!(
            "Node: bind cluster=0x{:04X} dst=0x{:04X}/{} (bind table {}/{})",
            notification.cluster_id,
            notification.dst_addr,
            notification.dst_endpoint,
            capacity.used_entries,
            capacity.max_entries
        );
    }
}
