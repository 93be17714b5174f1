//! Software timer service.
//!
//! Implements [`TimerPort`] on a simulated millisecond clock.  The host
//! loop calls [`SoftTimers::advance`] and ORs the returned mask into the
//! pending events it feeds the dispatcher.
//!
//! One slot per [`TimerEvent`]; re-arming replaces the slot.  A repeating
//! timer that expires several times within one `advance` raises its bit
//! once.

use log::debug;

use crate::app::ports::TimerPort;
use crate::events::{EventMask, TimerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    deadline_ms: u64,
    /// `Some` for repeating timers.
    period_ms: Option<u32>,
}

#[derive(Debug, Default)]
pub struct SoftTimers {
    now_ms: u64,
    slots: [Option<Slot>; TimerEvent::ALL.len()],
}

const fn index(event: TimerEvent) -> usize {
    match event {
        TimerEvent::Report => 0,
        TimerEvent::Rejoin => 1,
        TimerEvent::ResetHold => 2,
    }
}

impl SoftTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_armed(&self, event: TimerEvent) -> bool {
        self.slots[index(event)].is_some()
    }

    /// Milliseconds until `event` fires, `None` when unarmed.
    pub fn remaining_ms(&self, event: TimerEvent) -> Option<u64> {
        self.slots[index(event)].map(|s| s.deadline_ms - self.now_ms)
    }

    /// Absolute time of the earliest armed deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|s| s.deadline_ms).min()
    }

    /// Move the clock forward and collect every expired event.
    pub fn advance(&mut self, elapsed_ms: u64) -> EventMask {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let mut fired = EventMask::NONE;

        for event in TimerEvent::ALL {
            let slot = &mut self.slots[index(event)];
            let Some(s) = slot else {
                continue;
            };
            if s.deadline_ms > self.now_ms {
                continue;
            }
            fired |= event.mask();
            let period_ms = s.period_ms;
            match period_ms {
                Some(period) => {
                    let period = u64::from(period.max(1));
                    let missed = (self.now_ms - s.deadline_ms) / period;
                    s.deadline_ms += (missed + 1) * period;
                }
                None => *slot = None,
            }
        }

        if !fired.is_empty() {
            debug!("Timers: t={}ms fired {:?}", self.now_ms, fired);
        }
        fired
    }
}

impl TimerPort for SoftTimers {
    fn arm_once(&mut self, event: TimerEvent, delay_ms: u32) {
        let deadline_ms = self.now_ms + u64::from(delay_ms);
        let slot = &mut self.slots[index(event)];
        let period_ms = slot.and_then(|s| s.period_ms);
        *slot = Some(Slot { deadline_ms, period_ms });
    }

    fn arm_repeating(&mut self, event: TimerEvent, period_ms: u32) {
        self.slots[index(event)] = Some(Slot {
            deadline_ms: self.now_ms + u64::from(period_ms),
            period_ms: Some(period_ms),
        });
    }

    fn cancel(&mut self, event: TimerEvent) {
        self.slots[index(event)] = None;
    }
}
