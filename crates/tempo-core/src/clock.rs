//! Clock state and the anchor-based elapsed-time formula
//!
//! INVARIANT: the total is always `base + (running ? now - anchor : 0)`.
//! Nothing in TEMPO accumulates time by counting ticks or frames.

use crate::{CommandError, MonoTime};

/// Elapsed total in milliseconds for the given clock parameters.
#[inline]
pub fn elapsed_ms(base_ms: i64, anchor: MonoTime, now: MonoTime, running: bool) -> i64 {
    if running {
        base_ms.saturating_add(now.millis_since(anchor))
    } else {
        base_ms
    }
}

/// Signed whole second of a millisecond total, floored toward negative
/// infinity so that -500ms is second -1.
#[inline]
pub fn whole_second(total_ms: i64) -> i64 {
    total_ms.div_euclid(1000)
}

/// Whole seconds for reporting, clamped at zero.
#[inline]
pub fn clamped_seconds(total_ms: i64) -> u64 {
    u64::try_from(whole_second(total_ms)).unwrap_or(0)
}

/// Convert seconds to milliseconds, refusing values that would overflow
pub fn seconds_to_ms(seconds: i64) -> Result<i64, CommandError> {
    seconds
        .checked_mul(1000)
        .ok_or(CommandError::OutOfRange(seconds))
}

/// Authoritative clock state for one owner (kernel or store)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockState {
    /// Time accumulated while not running
    base_ms: i64,
    /// Reading captured when running last began
    anchor: MonoTime,
    running: bool,
}

impl ClockState {
    /// Create a stopped clock showing `initial_seconds`.
    /// Saturates at the `i64` millisecond range; owners fed from untrusted
    /// input use [`ClockState::try_new`].
    pub fn new(initial_seconds: i64) -> Self {
        ClockState {
            base_ms: initial_seconds.saturating_mul(1000),
            anchor: MonoTime::ZERO,
            running: false,
        }
    }

    /// Create a stopped clock, refusing values whose millisecond total
    /// overflows
    pub fn try_new(initial_seconds: i64) -> Result<Self, CommandError> {
        Ok(ClockState {
            base_ms: seconds_to_ms(initial_seconds)?,
            anchor: MonoTime::ZERO,
            running: false,
        })
    }

    /// Begin running. No-op when already running.
    /// Returns true if the clock transitioned.
    pub fn start(&mut self, now: MonoTime) -> bool {
        if self.running {
            return false;
        }
        self.anchor = now;
        self.running = true;
        true
    }

    /// Stop running, folding the running interval into the base.
    /// No-op when already paused.
    pub fn pause(&mut self, now: MonoTime) -> bool {
        if !self.running {
            return false;
        }
        self.base_ms = self.total_ms(now);
        self.running = false;
        true
    }

    /// Replace the total. Re-anchors when running so the interval before
    /// this call is not added on top of the new value.
    pub fn set_time(&mut self, seconds: i64, now: MonoTime) -> Result<(), CommandError> {
        let base_ms = seconds_to_ms(seconds)?;
        self.base_ms = base_ms;
        if self.running {
            self.anchor = now;
        }
        Ok(())
    }

    /// Shift the total. The anchor is kept: running time keeps counting from
    /// where it started.
    pub fn adjust_time(&mut self, delta_seconds: i64) -> Result<(), CommandError> {
        let delta_ms = seconds_to_ms(delta_seconds)?;
        self.base_ms = self
            .base_ms
            .checked_add(delta_ms)
            .ok_or(CommandError::OutOfRange(delta_seconds))?;
        Ok(())
    }

    /// Current total in milliseconds (may be negative)
    #[inline]
    pub fn total_ms(&self, now: MonoTime) -> i64 {
        elapsed_ms(self.base_ms, self.anchor, now, self.running)
    }

    /// Signed whole second at `now`
    #[inline]
    pub fn signed_second(&self, now: MonoTime) -> i64 {
        whole_second(self.total_ms(now))
    }

    /// Whole seconds at `now`, clamped at zero
    #[inline]
    pub fn clamped_seconds(&self, now: MonoTime) -> u64 {
        clamped_seconds(self.total_ms(now))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn base_ms(&self) -> i64 {
        self.base_ms
    }

    pub fn anchor(&self) -> MonoTime {
        self.anchor
    }
}

impl Default for ClockState {
    fn default() -> Self {
        Self::new(0)
    }
}
