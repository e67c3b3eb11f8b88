//! Kernel worker - runs a [`Kernel`] on its own task
//!
//! The primary context keeps only a [`KernelHandle`]: a command sender and
//! the task handle. Clock state never leaves the task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tempo_core::{
    ConfigPatch, MonotonicClock, RenderConfig, TempoError, TempoResult, TokioClock,
};

use crate::{Command, CommandReceiver, CommandSender, DisplayBuffer, FrameScheduler, Kernel};
use crate::frame::DEFAULT_FRAME_INTERVAL;

/// Kernel worker configuration
#[derive(Clone, Debug)]
pub struct KernelConfig {
    /// Display frame cadence of the render loop
    pub frame_interval: Duration,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

impl KernelConfig {
    /// Configuration for throttled hosts (background tabs, battery saver)
    pub fn low_power() -> Self {
        KernelConfig {
            frame_interval: Duration::from_millis(100),
        }
    }
}

/// Primary-context handle to a kernel task
#[derive(Debug)]
pub struct KernelHandle {
    commands: Option<CommandSender>,
    task: Option<JoinHandle<()>>,
}

impl KernelHandle {
    /// Spawn an uninitialized kernel on the current tokio runtime.
    /// Send `Command::Init` (or call [`KernelHandle::init`]) before anything else.
    pub fn spawn(config: KernelConfig) -> TempoResult<Self> {
        Self::spawn_with_clock(config, TokioClock::new())
    }

    /// Spawn with an explicit time source
    pub fn spawn_with_clock<C>(config: KernelConfig, clock: C) -> TempoResult<Self>
    where
        C: MonotonicClock + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TempoError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let task = runtime.spawn(run_kernel(rx, clock, config.frame_interval));
        tracing::info!(frame_interval = ?config.frame_interval, "kernel spawned");

        Ok(KernelHandle {
            commands: Some(tx),
            task: Some(task),
        })
    }

    /// Spawn and initialize in one step
    pub fn launch(
        surface: DisplayBuffer,
        render: RenderConfig,
        initial_seconds: i64,
        config: KernelConfig,
    ) -> TempoResult<Self> {
        let handle = Self::spawn(config)?;
        handle.init(surface, render, initial_seconds);
        Ok(handle)
    }

    /// Transfer the surface to the kernel and set the initial time
    pub fn init(&self, surface: DisplayBuffer, config: RenderConfig, initial_seconds: i64) {
        self.send(Command::Init {
            surface,
            config,
            initial_seconds,
        });
    }

    /// Fire-and-forget send. Returns false once the kernel is gone.
    pub fn send(&self, command: Command) -> bool {
        let Some(commands) = self.commands.as_ref() else {
            tracing::debug!(command = command.label(), "kernel terminated; command dropped");
            return false;
        };
        commands.send(command).is_ok()
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn set_time(&self, seconds: i64) {
        self.send(Command::SetTime { seconds });
    }

    pub fn adjust_time(&self, delta_seconds: i64) {
        self.send(Command::AdjustTime { delta_seconds });
    }

    pub fn resize(&self, width: u32, height: u32, dpr: f64) {
        self.send(Command::Resize { width, height, dpr });
    }

    pub fn update_config(&self, patch: ConfigPatch) {
        self.send(Command::UpdateConfig { patch });
    }

    /// Parse a JSON config patch and forward it. Malformed input is logged
    /// and dropped.
    pub fn update_config_json(&self, json: &str) {
        match ConfigPatch::from_json(json) {
            Ok(patch) => self.update_config(patch),
            Err(e) => tracing::warn!(error = %e, "malformed config update ignored"),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.commands.is_none()
    }

    /// Stop the kernel task, cancelling any scheduled frame and releasing
    /// the surface and channel. Safe to call more than once.
    pub fn terminate(&mut self) {
        let had_channel = self.commands.take().is_some();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if had_channel {
            tracing::info!("kernel terminated");
        }
    }
}

impl Drop for KernelHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Kernel task body: commands first, then frames
async fn run_kernel<C: MonotonicClock>(
    mut commands: CommandReceiver,
    clock: C,
    frame_interval: Duration,
) {
    let mut kernel = Kernel::new();
    let mut frames = FrameScheduler::new(frame_interval);

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else {
                    break; // Handle dropped
                };
                let label = command.label();
                match kernel.handle(command, clock.now()) {
                    Ok(()) => tracing::debug!(command = label, phase = ?kernel.phase(), "command handled"),
                    Err(e) => tracing::warn!(command = label, error = %e, "command rejected"),
                }
            }

            _ = frames.fired() => {
                if kernel.frame(clock.now()) {
                    tracing::trace!(second = ?kernel.last_reported_second(), "frame painted");
                }
            }
        }

        if kernel.is_running() {
            frames.schedule();
        } else {
            frames.cancel();
        }
    }

    frames.cancel();
    tracing::info!(stats = ?kernel.stats(), "kernel stopped");
}
