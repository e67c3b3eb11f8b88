//! Monotonic time primitives for TEMPO
//!
//! Every clock owner reads time through a [`MonotonicClock`]. Readings are
//! [`MonoTime`] values: microseconds since the clock's own epoch. They are only
//! comparable with readings from the same clock.

use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Monotonic timestamp, microseconds since a clock epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MonoTime(pub u64);

impl MonoTime {
    pub const ZERO: MonoTime = MonoTime(0);

    #[inline]
    pub fn from_micros(micros: u64) -> Self {
        MonoTime(micros)
    }

    #[inline]
    pub fn from_millis(millis: u64) -> Self {
        MonoTime(millis.saturating_mul(1000))
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        MonoTime(secs.saturating_mul(1_000_000))
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0 / 1000
    }

    /// Whole milliseconds elapsed since `earlier`.
    /// Never negative: a reading older than `earlier` yields zero.
    #[inline]
    pub fn millis_since(self, earlier: MonoTime) -> i64 {
        let micros = self.0.saturating_sub(earlier.0);
        i64::try_from(micros / 1000).unwrap_or(i64::MAX)
    }

    #[inline]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        MonoTime(self.0.saturating_add(micros))
    }
}

impl Add<Duration> for MonoTime {
    type Output = MonoTime;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<MonoTime> for MonoTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: MonoTime) -> Self::Output {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

impl std::fmt::Debug for MonoTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mono({:.3}ms)", self.0 as f64 / 1000.0)
    }
}

/// Source of monotonic timestamps
pub trait MonotonicClock: Send + Sync {
    fn now(&self) -> MonoTime;
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for Arc<C> {
    fn now(&self) -> MonoTime {
        (**self).now()
    }
}

/// Clock backed by `tokio::time::Instant`.
///
/// Follows tokio's paused test clock when one is active, so worker tasks and
/// their tests observe the same timeline.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    epoch: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        TokioClock {
            epoch: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for TokioClock {
    fn now(&self) -> MonoTime {
        let elapsed = tokio::time::Instant::now().saturating_duration_since(self.epoch);
        MonoTime::ZERO + elapsed
    }
}

/// Manually driven clock. Clones share the same reading.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at a given reading
    pub fn starting_at(start: MonoTime) -> Self {
        ManualClock {
            micros: Arc::new(AtomicU64::new(start.as_micros())),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, dt: Duration) {
        let micros = u64::try_from(dt.as_micros()).unwrap_or(u64::MAX);
        let _ = self
            .micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(micros))
            });
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> MonoTime {
        MonoTime(self.micros.load(Ordering::SeqCst))
    }
}
