//! Messages crossing between the primary context and a worker
//!
//! Everything is sent by value over unbounded FIFO channels. Nothing is
//! acknowledged and nothing is coalesced.

use tokio::sync::mpsc;

use tempo_core::{ConfigPatch, RenderConfig};

use crate::DisplayBuffer;

/// Command sent from the primary context to the kernel
#[derive(Debug)]
pub enum Command {
    /// Hand over the render target and set the initial time. Must come first.
    Init {
        surface: DisplayBuffer,
        config: RenderConfig,
        initial_seconds: i64,
    },
    Start,
    Pause,
    SetTime {
        seconds: i64,
    },
    AdjustTime {
        delta_seconds: i64,
    },
    Resize {
        width: u32,
        height: u32,
        dpr: f64,
    },
    UpdateConfig {
        patch: ConfigPatch,
    },
}

impl Command {
    /// Tag used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Command::Init { .. } => "INIT",
            Command::Start => "START",
            Command::Pause => "PAUSE",
            Command::SetTime { .. } => "SET_TIME",
            Command::AdjustTime { .. } => "ADJUST_TIME",
            Command::Resize { .. } => "RESIZE",
            Command::UpdateConfig { .. } => "UPDATE_CONFIG",
        }
    }
}

/// Bare start/stop signal for the wake worker.
/// The worker never learns the numeric time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeCommand {
    Start,
    Stop,
}

/// Notification sent from a worker back to the primary context
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Content-free wake signal; the recipient recomputes locally
    Tick,
}

/// Kernel command channel (sender side)
pub type CommandSender = mpsc::UnboundedSender<Command>;

/// Kernel command channel (receiver side)
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

/// Wake command channel (sender side)
pub type WakeSender = mpsc::UnboundedSender<WakeCommand>;

/// Wake command channel (receiver side)
pub type WakeReceiver = mpsc::UnboundedReceiver<WakeCommand>;

/// Notification channel (sender side)
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Notification channel (receiver side)
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;
