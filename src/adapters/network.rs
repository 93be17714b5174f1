//! Scripted network stack.
//!
//! Stands in for the mesh stack on the host.  Every request is answered
//! synchronously by queueing the notification the real stack would
//! deliver later; the host loop drains them with
//! [`SimNetwork::take_notification`] and routes each one to the node.
//!
//! The harness scripts the radio environment through
//! [`set_parent_reachable`](SimNetwork::set_parent_reachable),
//! [`set_permit_join`](SimNetwork::set_permit_join),
//! [`lose_parent`](SimNetwork::lose_parent) and
//! [`remote_bind`](SimNetwork::remote_bind).

use std::collections::VecDeque;

use log::{info, warn};

use crate::app::ports::{BindCapacity, BindNotification, NetworkPort};
use crate::commissioning::{
    CommissioningEvent, CommissioningMode, CommissioningRequest, CommissioningStatus, NetworkStatus,
};

/// Default binding table size.
pub const BIND_TABLE_SIZE: u16 = 4;

/// Something the stack tells the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Routed to the commissioning listener.
    Commissioning(CommissioningEvent),
    /// Posted to the message queue as a state-change message.
    State(NetworkStatus),
    /// Routed to the bind listener.
    Bind(BindNotification),
}

#[derive(Debug)]
pub struct SimNetwork {
    status: NetworkStatus,
    has_credentials: bool,
    parent_reachable: bool,
    permit_join: bool,
    tx_power_dbm: Option<i8>,
    bind: BindCapacity,
    recoveries: u32,
    outbox: VecDeque<Notification>,
}

impl SimNetwork {
    /// A factory-new node: no stored network, parents reachable, no open
    /// network to join.
    pub fn new() -> Self {
        Self {
            status: NetworkStatus::NoNetwork,
            has_credentials: false,
            parent_reachable: true,
            permit_join: false,
            tx_power_dbm: None,
            bind: BindCapacity {
                max_entries: BIND_TABLE_SIZE,
                used_entries: 0,
            },
            recoveries: 0,
            outbox: VecDeque::new(),
        }
    }

    /// A node with credentials stored from an earlier join.
    pub fn commissioned() -> Self {
        Self {
            has_credentials: true,
            ..Self::new()
        }
    }

    // ── Scripting ─────────────────────────────────────────────

    pub fn set_parent_reachable(&mut self, reachable: bool) {
        self.parent_reachable = reachable;
    }

    /// Whether a coordinator in range currently accepts joins.
    pub fn set_permit_join(&mut self, open: bool) {
        self.permit_join = open;
    }

    /// The parent stops answering.  Credentials are kept.
    pub fn lose_parent(&mut self) {
        if self.status != NetworkStatus::Connected {
            return;
        }
        warn!("SimNetwork: parent lost");
        self.parent_reachable = false;
        self.set_status(NetworkStatus::Orphan);
        self.commissioning(CommissioningMode::ParentLost, CommissioningStatus::NoNetwork);
    }

    /// A remote device creates a binding on this node.
    pub fn remote_bind(&mut self, cluster_id: u16, dst_addr: u16, dst_endpoint: u8) -> bool {
        if self.bind.used_entries >= self.bind.max_entries {
            warn!("SimNetwork: bind table full, dropping bind for cluster 0x{:04X}", cluster_id);
            return false;
        }
        self.bind.used_entries += 1;
        self.outbox.push_back(Notification::Bind(BindNotification {
            cluster_id,
            dst_addr,
            dst_endpoint,
        }));
        true
    }

    // ── Host loop ─────────────────────────────────────────────

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.outbox.pop_front()
    }

    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    pub fn tx_power_dbm(&self) -> Option<i8> {
        self.tx_power_dbm
    }

    fn set_status(&mut self, status: NetworkStatus) {
        if self.status != status {
            self.status = status;
            self.outbox.push_back(Notification::State(status));
        }
    }

    fn commissioning(&mut self, mode: CommissioningMode, status: CommissioningStatus) {
        self.outbox
            .push_back(Notification::Commissioning(CommissioningEvent::new(mode, status)));
    }

    fn rejoin_stored(&mut self) {
        if !self.has_credentials {
            self.commissioning(CommissioningMode::Initialization, CommissioningStatus::NoNetwork);
        } else if self.parent_reachable {
            self.set_status(NetworkStatus::Connected);
            self.commissioning(CommissioningMode::Initialization, CommissioningStatus::NetworkRestored);
        } else {
            self.set_status(NetworkStatus::Orphan);
            self.commissioning(CommissioningMode::ParentLost, CommissioningStatus::NoNetwork);
        }
    }

    fn steer(&mut self) {
        if self.permit_join {
            self.has_credentials = true;
            self.parent_reachable = true;
            self.set_status(NetworkStatus::Connected);
            self.commissioning(CommissioningMode::NetworkSteering, CommissioningStatus::Success);
        } else {
            self.commissioning(CommissioningMode::NetworkSteering, CommissioningStatus::NoScanResponse);
        }
    }
}

impl Default for SimNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkPort for SimNetwork {
    fn status(&self) -> NetworkStatus {
        self.status
    }

    fn is_on_network(&self) -> bool {
        self.has_credentials
    }

    fn start_commissioning(&mut self, request: CommissioningRequest) {
        info!("SimNetwork: commissioning {:?}", request);
        match request {
            CommissioningRequest::RejoinExistingOnStartup => self.rejoin_stored(),
            CommissioningRequest::NetworkSteering => self.steer(),
        }
    }

    fn attempt_recovery(&mut self) {
        self.recoveries += 1;
        if self.has_credentials && self.parent_reachable {
            info!("SimNetwork: recovery #{} found a parent", self.recoveries);
            self.set_status(NetworkStatus::Connected);
            self.commissioning(CommissioningMode::ParentLost, CommissioningStatus::NetworkRestored);
        } else {
            info!("SimNetwork: recovery #{} found nothing", self.recoveries);
            self.commissioning(CommissioningMode::ParentLost, CommissioningStatus::NoNetwork);
        }
    }

    fn leave_network(&mut self) {
        info!("SimNetwork: leaving network");
        self.has_credentials = false;
        self.bind.used_entries = 0;
        self.set_status(NetworkStatus::NoNetwork);
    }

    fn set_transmit_power(&mut self, dbm: i8) {
        self.tx_power_dbm = Some(dbm);
    }

    fn bind_capacity(&self) -> BindCapacity {
        self.bind
    }
}
