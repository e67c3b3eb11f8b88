//! Reconciliation store
//!
//! Lives on the primary context. Owns a local [`ClockState`], a cached
//! [`Snapshot`] and a listener registry. A [`WakeHandle`] worker prompts it to
//! recompute; observers are only notified when the whole second or the
//! running flag changes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tempo_core::{ClockState, DigitTable, MonotonicClock, TokioClock};
use tempo_kernel::{NotificationReceiver, WakeConfig, WakeHandle};

use crate::Snapshot;

type Listener = Rc<RefCell<dyn FnMut(&Arc<Snapshot>)>>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Registration returned by [`ReconciliationStore::subscribe`]
#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe to remove it"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<ListenerRegistry>>,
}

impl Subscription {
    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        let before = registry.listeners.len();
        registry.listeners.retain(|(id, _)| *id != self.id);
        registry.listeners.len() != before
    }
}

/// Link to the wake worker
struct WakeLink {
    handle: WakeHandle,
    ticks: NotificationReceiver,
}

/// Primary-context clock mirror with change-filtered notifications
pub struct ReconciliationStore {
    time_source: Box<dyn MonotonicClock>,
    clock: ClockState,
    digits: DigitTable,
    snapshot: Arc<Snapshot>,
    listeners: Rc<RefCell<ListenerRegistry>>,
    /// None when the worker could not be spawned or the store was destroyed
    link: Option<WakeLink>,
}

impl ReconciliationStore {
    /// Create a store on the current tokio runtime
    pub fn new(initial_seconds: i64, config: WakeConfig) -> Self {
        Self::with_clock(initial_seconds, config, TokioClock::new())
    }

    /// Create a store reading time from `time_source`.
    ///
    /// If the wake worker cannot be spawned the store stays inert at its
    /// initial time and control calls only affect local state.
    pub fn with_clock(
        initial_seconds: i64,
        config: WakeConfig,
        time_source: impl MonotonicClock + 'static,
    ) -> Self {
        let clock = ClockState::try_new(initial_seconds).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "initial time rejected; starting at zero");
            ClockState::default()
        });
        let digits = DigitTable::new();
        let snapshot = Arc::new(Snapshot::new(
            clock.clamped_seconds(time_source.now()),
            false,
            &digits,
        ));

        let link = match WakeHandle::spawn(config) {
            Ok((handle, ticks)) => Some(WakeLink { handle, ticks }),
            Err(e) => {
                tracing::error!(error = %e, "wake worker unavailable; store stays at initial time");
                None
            }
        };

        ReconciliationStore {
            time_source: Box::new(time_source),
            clock,
            digits,
            snapshot,
            listeners: Rc::new(RefCell::new(ListenerRegistry::default())),
            link,
        }
    }

    /// Current snapshot. Compare with `Arc::ptr_eq` to detect changes.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Register a listener, called with the new snapshot on every change
    pub fn subscribe(&self, listener: impl FnMut(&Arc<Snapshot>) + 'static) -> Subscription {
        let mut registry = self.listeners.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let listener: Listener = Rc::new(RefCell::new(listener));
        registry.listeners.push((id, listener));

        Subscription {
            id,
            registry: Rc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().listeners.len()
    }

    /// Recompute after a wake signal. Returns true if observers were notified.
    pub fn on_wake_signal(&mut self) -> bool {
        self.recompute(false)
    }

    /// Handle every wake signal already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(link) = self.link.as_mut() {
            if link.ticks.try_recv().is_err() {
                break;
            }
            self.on_wake_signal();
            handled += 1;
        }
        handled
    }

    /// Wait for the next wake signal and handle it.
    /// Returns false when no signal can arrive (inert or destroyed store).
    pub async fn next_wake(&mut self) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };
        if link.ticks.recv().await.is_none() {
            return false;
        }
        self.on_wake_signal();
        true
    }

    pub fn start(&mut self) {
        let now = self.time_source.now();
        self.clock.start(now);
        if let Some(link) = self.link.as_ref() {
            link.handle.start();
        }
        self.recompute(true);
    }

    pub fn pause(&mut self) {
        let now = self.time_source.now();
        self.clock.pause(now);
        if let Some(link) = self.link.as_ref() {
            link.handle.stop();
        }
        self.recompute(true);
    }

    pub fn set_time(&mut self, seconds: i64) {
        let now = self.time_source.now();
        if let Err(e) = self.clock.set_time(seconds, now) {
            tracing::warn!(error = %e, "set_time ignored");
            return;
        }
        self.recompute(true);
    }

    /// Shift the total. Negative totals display as zero.
    pub fn adjust_time(&mut self, delta_seconds: i64) {
        if let Err(e) = self.clock.adjust_time(delta_seconds) {
            tracing::warn!(error = %e, "adjust_time ignored");
            return;
        }
        self.recompute(true);
    }

    /// Whether a wake worker is attached
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    /// Tear down the wake worker. Safe to call more than once.
    pub fn destroy(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.handle.terminate();
            link.ticks.close();
            tracing::debug!("store destroyed");
        }
    }

    fn recompute(&mut self, force: bool) -> bool {
        let now = self.time_source.now();
        let total_seconds = self.clock.clamped_seconds(now);
        let running = self.clock.is_running();

        if !force && !self.snapshot.differs(total_seconds, running) {
            return false;
        }

        self.snapshot = Arc::new(Snapshot::new(total_seconds, running, &self.digits));
        self.notify();
        true
    }

    fn notify(&self) {
        // Collect first so listeners may unsubscribe while being called
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();

        for listener in listeners {
            if let Ok(mut listener) = listener.try_borrow_mut() {
                (&mut *listener)(&self.snapshot);
            }
        }
    }
}

impl Drop for ReconciliationStore {
    fn drop(&mut self) {
        self.destroy();
    }
}
