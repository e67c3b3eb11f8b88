//! Frame scheduler - one pending frame at a time, cancellable

use std::time::Duration;

use tokio::time::Instant;

/// Display frame interval used when none is configured (~60 Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Holds at most one scheduled frame deadline
#[derive(Debug)]
pub struct FrameScheduler {
    interval: Duration,
    next: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        FrameScheduler {
            interval,
            next: None,
        }
    }

    /// Schedule the next frame one interval from now.
    /// Keeps an already pending frame.
    pub fn schedule(&mut self) {
        if self.next.is_none() {
            self.next = Some(Instant::now() + self.interval);
        }
    }

    /// Drop the pending frame, if any
    pub fn cancel(&mut self) {
        self.next = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.next.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the pending frame. Pends forever when nothing is scheduled.
    ///
    /// Cancel safe: dropping the future leaves the frame pending.
    pub async fn fired(&mut self) {
        match self.next {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.next = None;
            }
            None => std::future::pending().await,
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}
