//! Event flags and asynchronous system messages.
//!
//! The external scheduler hands the dispatcher a bitmask of pending event
//! classes.  One of those classes ([`EventMask::SYS_MSG`]) means "the
//! message queue is non-empty"; the others are timer expiries.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐
//! │ Key ISR     │────▶│              │     ┌──────────────┐
//! │ Network     │────▶│ MessageQueue │────▶│              │
//! │ Protocol RX │────▶│  (FIFO)      │     │  Dispatcher  │
//! └─────────────┘     └──────────────┘     │ (Node)       │
//! ┌─────────────┐                          │              │
//! │ Timers      │──── EventMask bits ─────▶│              │
//! └─────────────┘                          └──────────────┘
//! ```

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use heapless::Deque;

use crate::app::ports::MessageSource;
use crate::commissioning::NetworkStatus;
use crate::error::QueueError;

// ───────────────────────────────────────────────────────────────
// Pending-event mask
// ───────────────────────────────────────────────────────────────

/// Bitset of outstanding event classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(pub u16);

impl EventMask {
    /// No events pending.
    pub const NONE: Self = Self(0);
    /// Periodic report timer fired.
    pub const REPORT: Self = Self(0x0001);
    /// Rejoin-attempt timer fired.
    pub const REJOIN: Self = Self(0x0002);
    /// Reset-hold (long press) timer fired.
    pub const RESET_HOLD: Self = Self(0x0004);
    /// One or more messages are waiting in the queue.
    pub const SYS_MSG: Self = Self(0x8000);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// `self` with every bit of `other` cleared.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for EventMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventMask(0x{:04X})", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Timer events
// ───────────────────────────────────────────────────────────────

/// Timer-driven event classes owned by this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    Report,
    Rejoin,
    ResetHold,
}

impl TimerEvent {
    pub const ALL: [Self; 3] = [Self::Report, Self::Rejoin, Self::ResetHold];

    /// The pending-mask bit raised when this timer expires.
    pub const fn mask(self) -> EventMask {
        match self {
            Self::Report => EventMask::REPORT,
            Self::Rejoin => EventMask::REJOIN,
            Self::ResetHold => EventMask::RESET_HOLD,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Messages
// ───────────────────────────────────────────────────────────────

/// Raw key code as delivered by the key scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyCode(pub u8);

impl KeyCode {
    /// All keys released.
    pub const NONE: Self = Self(0x00);

    pub const fn is_release(self) -> bool {
        self.0 == Self::NONE.0
    }
}

/// An application-level protocol frame addressed to one of our endpoints.
///
/// `attr_cmd` is the parsed attribute-command payload allocated by the
/// stack; it is owned by the message and freed when the message is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub src_addr: u16,
    pub endpoint: u8,
    pub cluster_id: u16,
    pub command_id: u8,
    pub attr_cmd: Option<Box<[u8]>>,
}

/// Asynchronous messages delivered through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysMessage {
    /// Key scanner reported a new key code.
    KeyChange { shift: u8, keys: KeyCode },
    /// The network device state changed.
    StateChange(NetworkStatus),
    /// Protocol frame for one of our endpoints.
    Incoming(IncomingMessage),
    /// Confirmation of a frame we sent.
    DataConfirm { endpoint: u8, trans_id: u8, status: u8 },
    /// Anything else the stack posts to this task.
    Other { event: u8, status: u8 },
}

// ───────────────────────────────────────────────────────────────
// Message queue
// ───────────────────────────────────────────────────────────────

/// Maximum number of queued messages.
pub const MESSAGE_QUEUE_CAP: usize = 16;

/// Fixed-capacity FIFO of [`SysMessage`]s.
pub struct MessageQueue {
    inner: Deque<SysMessage, MESSAGE_QUEUE_CAP>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self { inner: Deque::new() }
    }

    /// Append a message.  The message is dropped when the queue is full.
    pub fn post(&mut self, msg: SysMessage) -> Result<(), QueueError> {
        self.inner.push_back(msg).map_err(|_| QueueError::Full)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// The pending mask the scheduler should raise for this queue.
    pub fn pending(&self) -> EventMask {
        if self.is_empty() {
            EventMask::NONE
        } else {
            EventMask::SYS_MSG
        }
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSource for MessageQueue {
    fn receive(&mut self) -> Option<SysMessage> {
        self.inner.pop_front()
    }
}
