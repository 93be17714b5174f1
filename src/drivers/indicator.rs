//! Status LED driver.
//!
//! Drives one GPIO through [`OutputPin`] and turns the abstract
//! [`IndicatorMode`]s into blink sequences.  The board advances the
//! sequence by calling [`Indicator::tick`] with the elapsed time.
//!
//! | Mode     | Output                                   |
//! |----------|------------------------------------------|
//! | `Off`    | low                                      |
//! | `On`     | high                                     |
//! | `Toggle` | inverts the steady level                 |
//! | `Blink`  | one 50 ms pulse, then back to steady     |
//! | `Flash`  | 50 pulses, 500 ms on / 500 ms off        |

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::IndicatorMode;

/// Single short pulse.
pub const BLINK_ON_MS: u32 = 50;
pub const BLINK_OFF_MS: u32 = 950;

/// Long attention pattern.
pub const FLASH_COUNT: u8 = 50;
pub const FLASH_ON_MS: u32 = 500;
pub const FLASH_OFF_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sequence {
    remaining: u8,
    on_ms: u32,
    off_ms: u32,
    /// Position inside the current on+off period.
    phase_ms: u32,
}

pub struct Indicator<P: OutputPin> {
    pin: P,
    steady: bool,
    sequence: Option<Sequence>,
    lit: bool,
}

impl<P: OutputPin> Indicator<P> {
    pub fn new(pin: P) -> Self {
        let mut led = Self {
            pin,
            steady: false,
            sequence: None,
            lit: true,
        };
        led.drive(false);
        led
    }

    pub fn set_mode(&mut self, mode: IndicatorMode) {
        match mode {
            IndicatorMode::Off => self.set_steady(false),
            IndicatorMode::On => self.set_steady(true),
            IndicatorMode::Toggle => self.set_steady(!self.steady),
            IndicatorMode::Blink => self.blink(1, BLINK_ON_MS, BLINK_OFF_MS),
            IndicatorMode::Flash => self.blink(FLASH_COUNT, FLASH_ON_MS, FLASH_OFF_MS),
        }
    }

    /// Start `count` pulses.  A zero count or a zero on-time is a no-op.
    pub fn blink(&mut self, count: u8, on_ms: u32, off_ms: u32) {
        if count == 0 || on_ms == 0 {
            return;
        }
        self.sequence = Some(Sequence {
            remaining: count,
            on_ms,
            off_ms,
            phase_ms: 0,
        });
        self.drive(true);
    }

    /// Advance the running sequence by `elapsed_ms`.
    pub fn tick(&mut self, elapsed_ms: u32) {
        let Some(mut seq) = self.sequence else {
            return;
        };
        let mut left = elapsed_ms;
        loop {
            let period = seq.on_ms.saturating_add(seq.off_ms);
            let step = left.min(period - seq.phase_ms);
            seq.phase_ms += step;
            left -= step;
            if seq.phase_ms < period {
                break;
            }
            seq.phase_ms = 0;
            seq.remaining -= 1;
            if seq.remaining == 0 {
                self.sequence = None;
                self.drive(self.steady);
                return;
            }
        }
        self.sequence = Some(seq);
        self.drive(seq.phase_ms < seq.on_ms);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn is_sequencing(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn pulses_remaining(&self) -> u8 {
        self.sequence.map_or(0, |s| s.remaining)
    }

    fn set_steady(&mut self, on: bool) {
        self.steady = on;
        self.sequence = None;
        self.drive(on);
    }

    fn drive(&mut self, on: bool) {
        if self.lit == on {
            return;
        }
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.lit = on,
            Err(_) => warn!("Indicator: pin write failed"),
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}
