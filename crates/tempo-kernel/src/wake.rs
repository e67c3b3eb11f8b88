//! Wake worker - periodic content-free ticks for the reconciliation store
//!
//! The store keeps its own clock and only needs to be prompted to recompute.
//! This worker emits `Notification::Tick` at a sub-second cadence while
//! started and stays silent while stopped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};

use tempo_core::{TempoError, TempoResult};

use crate::{Notification, NotificationReceiver, NotificationSender, WakeCommand, WakeReceiver, WakeSender};

/// Wake worker configuration
#[derive(Clone, Debug)]
pub struct WakeConfig {
    /// Cadence of wake signals while started
    pub wake_interval: Duration,
}

impl Default for WakeConfig {
    fn default() -> Self {
        WakeConfig {
            wake_interval: Duration::from_millis(100),
        }
    }
}

/// Primary-context handle to a wake worker
#[derive(Debug)]
pub struct WakeHandle {
    commands: Option<WakeSender>,
    task: Option<JoinHandle<()>>,
}

impl WakeHandle {
    /// Spawn on the current tokio runtime. Returns the handle and the
    /// receiving end of the notification channel.
    pub fn spawn(config: WakeConfig) -> TempoResult<(Self, NotificationReceiver)> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TempoError::NoRuntime)?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let task = runtime.spawn(run_wake(command_rx, notify_tx, config.wake_interval));
        tracing::debug!(wake_interval = ?config.wake_interval, "wake worker spawned");

        Ok((
            WakeHandle {
                commands: Some(command_tx),
                task: Some(task),
            },
            notify_rx,
        ))
    }

    fn send(&self, command: WakeCommand) -> bool {
        match self.commands.as_ref() {
            Some(commands) => commands.send(command).is_ok(),
            None => false,
        }
    }

    pub fn start(&self) {
        self.send(WakeCommand::Start);
    }

    pub fn stop(&self) {
        self.send(WakeCommand::Stop);
    }

    pub fn is_terminated(&self) -> bool {
        self.commands.is_none()
    }

    /// Stop the worker and release its channels. Safe to call more than once.
    pub fn terminate(&mut self) {
        self.commands = None;
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("wake worker terminated");
        }
    }
}

impl Drop for WakeHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

async fn run_wake(mut commands: WakeReceiver, notifications: NotificationSender, period: Duration) {
    let mut ticker: Option<Interval> = None;

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(WakeCommand::Start) => {
                    if ticker.is_none() {
                        let first = tokio::time::Instant::now() + period;
                        let mut interval = tokio::time::interval_at(first, period);
                        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                        ticker = Some(interval);
                    }
                }
                Some(WakeCommand::Stop) => ticker = None,
                None => break,
            },

            _ = next_tick(&mut ticker) => {
                if notifications.send(Notification::Tick).is_err() {
                    break; // Receiver dropped
                }
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
