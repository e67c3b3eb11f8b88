//! Kernel state machine
//!
//! The kernel owns the authoritative clock, the display buffer and the
//! render config. It is driven from outside: `handle` for each command in
//! arrival order, `frame` once per display frame while running.

use tempo_core::{ClockState, CommandError, DigitTable, MonoTime, RenderConfig};

use crate::{Command, DisplayBuffer, Geometry};

/// Lifecycle phase of a kernel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelPhase {
    /// Waiting for INIT
    Uninitialized,
    Stopped,
    Running,
}

/// Counters kept by a kernel over its lifetime
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelStats {
    pub frames: u64,
    pub paints: u64,
    pub commands: u64,
    pub rejected: u64,
}

/// Timer kernel - authoritative clock plus render target
pub struct Kernel {
    /// Two-digit fields, built once
    digits: DigitTable,
    clock: ClockState,
    surface: Option<DisplayBuffer>,
    config: RenderConfig,
    /// Second of the last paint (dirty-check reference)
    last_reported_second: Option<i64>,
    stats: KernelStats,
}

impl Kernel {
    pub fn new() -> Self {
        Kernel {
            digits: DigitTable::new(),
            clock: ClockState::default(),
            surface: None,
            config: RenderConfig::default(),
            last_reported_second: None,
            stats: KernelStats::default(),
        }
    }

    pub fn phase(&self) -> KernelPhase {
        if self.surface.is_none() {
            KernelPhase::Uninitialized
        } else if self.clock.is_running() {
            KernelPhase::Running
        } else {
            KernelPhase::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() == KernelPhase::Running
    }

    /// Apply one command. A rejected command changes nothing.
    pub fn handle(&mut self, command: Command, now: MonoTime) -> Result<(), CommandError> {
        self.stats.commands += 1;
        let result = self.apply(command, now);
        if result.is_err() {
            self.stats.rejected += 1;
        }
        result
    }

    fn apply(&mut self, command: Command, now: MonoTime) -> Result<(), CommandError> {
        match command {
            Command::Init {
                surface,
                config,
                initial_seconds,
            } => {
                if self.surface.is_some() {
                    return Err(CommandError::AlreadyInitialized);
                }
                self.clock = ClockState::try_new(initial_seconds)?;
                self.surface = Some(surface);
                self.config = config;
                self.render(self.clock.signed_second(now));
            }
            _ if self.surface.is_none() => return Err(CommandError::NotInitialized),
            Command::Start => {
                self.clock.start(now);
            }
            Command::Pause => {
                self.clock.pause(now);
            }
            Command::SetTime { seconds } => {
                self.clock.set_time(seconds, now)?;
                self.render(self.clock.signed_second(now));
            }
            Command::AdjustTime { delta_seconds } => {
                self.clock.adjust_time(delta_seconds)?;
                self.render(self.clock.signed_second(now));
            }
            Command::Resize { width, height, dpr } => {
                let geometry = Geometry::new(width, height, dpr)?;
                if let Some(surface) = self.surface.as_mut() {
                    surface.resize(geometry);
                }
                self.render(self.last_known_second(now));
            }
            Command::UpdateConfig { patch } => {
                self.config.apply(patch);
                self.render(self.last_known_second(now));
            }
        }
        Ok(())
    }

    /// One display frame. Paints only when the visible second changed.
    /// Returns true if a paint happened.
    pub fn frame(&mut self, now: MonoTime) -> bool {
        if !self.is_running() {
            return false;
        }
        self.stats.frames += 1;

        let second = self.clock.signed_second(now);
        if self.last_reported_second == Some(second) {
            return false;
        }
        self.render(second);
        true
    }

    fn last_known_second(&self, now: MonoTime) -> i64 {
        self.last_reported_second
            .unwrap_or_else(|| self.clock.signed_second(now))
    }

    /// Compose and paint, bypassing the dirty check
    fn render(&mut self, second: i64) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let face = self.digits.compose(second);
        surface.paint(second, face, &self.config);
        self.last_reported_second = Some(second);
        self.stats.paints += 1;
    }

    pub fn clock(&self) -> &ClockState {
        &self.clock
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&DisplayBuffer> {
        self.surface.as_ref()
    }

    pub fn last_reported_second(&self) -> Option<i64> {
        self.last_reported_second
    }

    pub fn stats(&self) -> &KernelStats {
        &self.stats
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempo_core::ConfigPatch;

    fn at_ms(ms: u64) -> MonoTime {
        MonoTime::from_millis(ms)
    }

    fn init_kernel(initial_seconds: i64) -> Kernel {
        let mut kernel = Kernel::new();
        kernel
            .handle(
                Command::Init {
                    surface: DisplayBuffer::new(64, 32, 1.0).unwrap(),
                    config: RenderConfig::default(),
                    initial_seconds,
                },
                at_ms(0),
            )
            .unwrap();
        kernel
    }

    fn painted(kernel: &Kernel) -> String {
        kernel
            .surface()
            .and_then(|s| s.last_frame())
            .map(|f| f.face.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_init_paints_immediately() {
        let kernel = init_kernel(75);

        assert_eq!(kernel.phase(), KernelPhase::Stopped);
        assert_eq!(painted(&kernel), "00:01:15");
        assert_eq!(kernel.stats().paints, 1);
    }

    #[test]
    fn test_commands_before_init_rejected() {
        let mut kernel = Kernel::new();

        assert_eq!(
            kernel.handle(Command::Start, at_ms(0)),
            Err(CommandError::NotInitialized)
        );
        assert_eq!(kernel.phase(), KernelPhase::Uninitialized);
        assert!(!kernel.frame(at_ms(5000)));
        assert_eq!(kernel.stats().rejected, 1);
    }

    #[test]
    fn test_second_init_rejected() {
        let mut kernel = init_kernel(10);

        let result = kernel.handle(
            Command::Init {
                surface: DisplayBuffer::new(8, 8, 1.0).unwrap(),
                config: RenderConfig::default(),
                initial_seconds: 99,
            },
            at_ms(0),
        );

        assert_eq!(result, Err(CommandError::AlreadyInitialized));
        assert_eq!(kernel.clock().signed_second(at_ms(0)), 10);
    }

    #[test]
    fn test_frame_paints_on_second_boundary() {
        let mut kernel = init_kernel(0);
        kernel.handle(Command::Start, at_ms(0)).unwrap();

        assert!(!kernel.frame(at_ms(16)));
        assert!(!kernel.frame(at_ms(999)));
        assert!(kernel.frame(at_ms(1000)));
        assert_eq!(painted(&kernel), "00:00:01");
        assert!(!kernel.frame(at_ms(1016)));
    }

    #[test]
    fn test_pause_stops_frames() {
        let mut kernel = init_kernel(0);
        kernel.handle(Command::Start, at_ms(0)).unwrap();
        kernel.handle(Command::Pause, at_ms(2500)).unwrap();

        assert!(!kernel.frame(at_ms(9000)));
        assert_eq!(kernel.clock().total_ms(at_ms(9000)), 2500);
    }

    #[test]
    fn test_set_time_reanchors_and_repaints() {
        let mut kernel = init_kernel(0);
        kernel.handle(Command::Start, at_ms(0)).unwrap();
        kernel
            .handle(Command::SetTime { seconds: 3600 }, at_ms(5000))
            .unwrap();
        assert_eq!(painted(&kernel), "01:00:00");

        assert!(kernel.frame(at_ms(6000)));
        assert_eq!(painted(&kernel), "01:00:01");
    }

    #[test]
    fn test_adjust_time_negative_paints_sign() {
        let mut kernel = init_kernel(0);
        kernel.handle(Command::Start, at_ms(0)).unwrap();
        kernel
            .handle(Command::AdjustTime { delta_seconds: -10 }, at_ms(0))
            .unwrap();

        assert_eq!(painted(&kernel), "-00:00:10");
    }

    #[test]
    fn test_resize_repaints_last_second() {
        let mut kernel = init_kernel(42);
        kernel
            .handle(
                Command::Resize {
                    width: 128,
                    height: 64,
                    dpr: 2.0,
                },
                at_ms(0),
            )
            .unwrap();

        let frame = kernel.surface().and_then(|s| s.last_frame()).unwrap();
        assert_eq!(frame.second, 42);
        assert_eq!(frame.geometry.physical_size(), (256, 128));
    }

    #[test]
    fn test_invalid_resize_ignored() {
        let mut kernel = init_kernel(0);
        let paints = kernel.stats().paints;

        let result = kernel.handle(
            Command::Resize {
                width: 0,
                height: 64,
                dpr: 1.0,
            },
            at_ms(0),
        );

        assert!(matches!(result, Err(CommandError::InvalidGeometry { .. })));
        assert_eq!(kernel.stats().paints, paints);
        assert_eq!(kernel.surface().unwrap().geometry().width, 64);
    }

    #[test]
    fn test_oversized_resize_rejected() {
        let mut kernel = init_kernel(0);

        let result = kernel.handle(
            Command::Resize {
                width: 16_384,
                height: 16_384,
                dpr: 1.0,
            },
            at_ms(0),
        );

        assert!(matches!(result, Err(CommandError::InvalidGeometry { .. })));
        assert_eq!(kernel.surface().unwrap().pixels().len(), 64 * 32);
        assert_eq!(kernel.phase(), KernelPhase::Stopped);
    }

    #[test]
    fn test_out_of_range_init_rejected() {
        let mut kernel = Kernel::new();

        let result = kernel.handle(
            Command::Init {
                surface: DisplayBuffer::new(64, 32, 1.0).unwrap(),
                config: RenderConfig::default(),
                initial_seconds: i64::MAX,
            },
            at_ms(0),
        );

        assert_eq!(result, Err(CommandError::OutOfRange(i64::MAX)));
        assert_eq!(kernel.phase(), KernelPhase::Uninitialized);
    }

    #[test]
    fn test_update_config_partial() {
        let mut kernel = init_kernel(2);
        let patch = ConfigPatch::from_json(r#"{"showDot": true}"#).unwrap();

        kernel
            .handle(Command::UpdateConfig { patch }, at_ms(0))
            .unwrap();

        assert!(kernel.config().show_dot);
        assert_eq!(kernel.config().font_family, "monospace");
        assert!(kernel.surface().unwrap().last_frame().unwrap().dot_visible);
    }

    #[test]
    fn test_out_of_range_set_time_ignored() {
        let mut kernel = init_kernel(7);

        let result = kernel.handle(Command::SetTime { seconds: i64::MAX }, at_ms(0));

        assert!(result.is_err());
        assert_eq!(painted(&kernel), "00:00:07");
    }

    proptest! {
        #[test]
        fn prop_at_most_one_paint_per_second(
            mut offsets in proptest::collection::vec(0u64..1000, 1..200),
        ) {
            let mut kernel = init_kernel(0);
            kernel.handle(Command::Start, at_ms(0)).unwrap();
            offsets.sort_unstable();

            // All frames fall inside second 3
            let paints = offsets
                .iter()
                .filter(|&&ms| kernel.frame(at_ms(3000 + ms)))
                .count();
            prop_assert_eq!(paints, 1);
        }
    }
}
