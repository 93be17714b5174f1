//! Commissioning / rejoin state machine.
//!
//! Reacts to commissioning notifications from the network stack and turns
//! them into indicator feedback, backoff bookkeeping and timer requests.
//!
//! ```text
//!  Initialization ──[NoNetwork]────────▶ blink ×3 (no state change)
//!        │
//!        └──────────[NetworkRestored]──▶ on_connect
//!
//!  NetworkSteering ─[Success]──────────▶ blink ×5, on_connect
//!        └──────────[anything else]────▶ indicator Blink ("searching")
//!
//!  ParentLost ──────[NetworkRestored]──▶ backoff.reset()
//!        └──────────[anything else]────▶ indicator Flash,
//!                                        backoff.on_failure(),
//!                                        arm Rejoin(delay)
//!
//!  on_connect = backoff.reset() + arm Report(first_report_delay)
//! ```
//!
//! The machine is cyclic: a connected node can lose its parent again at
//! any time and re-enter the ParentLost branch.

pub mod backoff;

use log::{debug, info, warn};

use crate::app::ports::{IndicatorId, IndicatorMode, IndicatorPort, TimerPort};
use crate::config::NodeConfig;
use crate::events::TimerEvent;
use backoff::BackoffState;

// ---------------------------------------------------------------------------
// Network-side types
// ---------------------------------------------------------------------------

/// Device state as reported by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkStatus {
    /// Not joined (factory new, or after leaving).
    NoNetwork,
    /// Joined and talking to a parent.
    Connected,
    /// Joined, but the parent stopped answering.
    Orphan,
    /// Parent lost and the stack gave up its own rejoin scan.
    ParentLost,
}

/// Commissioning procedure the stack is asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissioningRequest {
    /// Silent rejoin of the network stored in the stack's NV memory.
    RejoinExistingOnStartup,
    /// Scan for open networks and join one.
    NetworkSteering,
}

/// The commissioning phase a notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissioningMode {
    Initialization,
    NetworkSteering,
    Formation,
    FindingBinding,
    Touchlink,
    ParentLost,
}

/// Outcome codes carried by a commissioning notification.
///
/// Closed set: a code the stack reports that has no name here arrives as
/// [`CommissioningStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissioningStatus {
    Success,
    InProgress,
    NoNetwork,
    NotAaCapable,
    NoScanResponse,
    BindingTableFull,
    NoIdentifyQueryResponse,
    FormationFailure,
    NetworkRestored,
    Failure,
    /// Raw outcome code with no named variant.
    Other(u8),
}

/// One commissioning notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissioningEvent {
    pub mode: CommissioningMode,
    pub status: CommissioningStatus,
    /// Bitmask of commissioning modes the stack still has queued.
    pub remaining_modes: u8,
}

impl CommissioningEvent {
    pub const fn new(mode: CommissioningMode, status: CommissioningStatus) -> Self {
        Self {
            mode,
            status,
            remaining_modes: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Machine-side types
// ---------------------------------------------------------------------------

/// Last known link condition, tracked for logging and queries.
///
/// Bookkeeping only: it never feeds back into how a notification is
/// handled, and updating it is not a transition of the machine.  Retry
/// state lives in the backoff alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No notification seen yet.
    Unknown,
    NoNetwork,
    Searching,
    Connected,
    ParentLost,
}

/// What a notification resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Initialization found no stored network.
    NoNetwork,
    /// Initialization restored the network or steering succeeded.
    Connected,
    /// Steering reported anything other than success.
    Searching,
    /// Parent-loss recovery restored the link.
    ParentRestored,
    /// Any parent-loss outcome other than `NetworkRestored`.  Carries the
    /// delay armed on the rejoin timer.
    ParentStillLost { delay_ms: u32 },
    /// Notification with no handling (other modes / outcomes).
    Ignored,
}

/// Indicator blink used for "no network" and "joined" notifications.
const BLINK_ON_MS: u32 = 250;
const BLINK_OFF_MS: u32 = 250;
const NO_NETWORK_BLINKS: u8 = 3;
const JOINED_BLINKS: u8 = 5;

/// The commissioning state machine.  Owns the rejoin backoff.
#[derive(Debug, Clone)]
pub struct Commissioning {
    backoff: BackoffState,
    link: LinkState,
}

impl Commissioning {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            backoff: BackoffState::from_config(config),
            link: LinkState::Unknown,
        }
    }

    pub fn backoff(&self) -> &BackoffState {
        &self.backoff
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    /// Handle one commissioning notification.
    pub fn on_status(
        &mut self,
        event: &CommissioningEvent,
        config: &NodeConfig,
        hw: &mut (impl TimerPort + IndicatorPort),
    ) -> Transition {
        info!(
            "Commissioning: mode={:?} status={:?} remaining=0x{:02X}",
            event.mode, event.status, event.remaining_modes
        );

        let transition = match event.mode {
            CommissioningMode::Initialization => match event.status {
                CommissioningStatus::NoNetwork => {
                    info!("Commissioning: no network");
                    hw.blink(IndicatorId::Status, NO_NETWORK_BLINKS, BLINK_ON_MS, BLINK_OFF_MS);
                    self.link = LinkState::NoNetwork;
                    Transition::NoNetwork
                }
                CommissioningStatus::NetworkRestored => {
                    self.on_connect(config, hw);
                    Transition::Connected
                }
                _ => Transition::Ignored,
            },

            CommissioningMode::NetworkSteering => match event.status {
                CommissioningStatus::Success => {
                    info!("Commissioning: steering succeeded");
                    hw.blink(IndicatorId::Status, JOINED_BLINKS, BLINK_ON_MS, BLINK_OFF_MS);
                    self.on_connect(config, hw);
                    Transition::Connected
                }
                _ => {
                    hw.set_mode(IndicatorId::Status, IndicatorMode::Blink);
                    self.link = LinkState::Searching;
                    Transition::Searching
                }
            },

            CommissioningMode::ParentLost => match event.status {
                CommissioningStatus::NetworkRestored => {
                    info!("Commissioning: parent restored");
                    self.backoff.reset();
                    self.link = LinkState::Connected;
                    Transition::ParentRestored
                }
                // Any outcome other than NetworkRestored, `Other` included.
                _ => {
                    hw.set_mode(IndicatorId::Status, IndicatorMode::Flash);
                    let delay_ms = self.backoff.on_failure();
                    warn!(
                        "Commissioning: parent lost, rejoin in {} ms ({} tries left)",
                        delay_ms,
                        self.backoff.attempts_remaining()
                    );
                    hw.arm_once(TimerEvent::Rejoin, delay_ms);
                    self.link = LinkState::ParentLost;
                    Transition::ParentStillLost { delay_ms }
                }
            },

            _ => Transition::Ignored,
        };

        if transition == Transition::Ignored {
            debug!("Commissioning: ignored {:?}/{:?}", event.mode, event.status);
        }
        transition
    }

    /// Fresh connection: forget retry history and schedule an early report.
    fn on_connect(&mut self, config: &NodeConfig, hw: &mut impl TimerPort) {
        self.backoff.on_success();
        self.link = LinkState::Connected;
        hw.arm_once(TimerEvent::Report, config.first_report_delay_ms);
        info!(
            "Commissioning: connected, first report in {} ms",
            config.first_report_delay_ms
        );
    }
}
