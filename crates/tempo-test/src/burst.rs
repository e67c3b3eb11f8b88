//! Command bursts - rapid-fire control traffic for stress testing
//!
//! A burst is a seeded sequence of control operations. Replaying it on a bare
//! [`ClockState`] gives the result an in-order, non-coalescing receiver must
//! reach.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tempo_core::{ClockState, MonoTime};
use tempo_kernel::Command;

/// Control operation as issued by a caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlOp {
    Start,
    Pause,
    SetTime(i64),
    AdjustTime(i64),
}

impl ControlOp {
    pub fn to_command(self) -> Command {
        match self {
            ControlOp::Start => Command::Start,
            ControlOp::Pause => Command::Pause,
            ControlOp::SetTime(seconds) => Command::SetTime { seconds },
            ControlOp::AdjustTime(delta_seconds) => Command::AdjustTime { delta_seconds },
        }
    }

    /// Apply to a reference clock. Out-of-range values are dropped, as a
    /// kernel would.
    pub fn apply(self, clock: &mut ClockState, now: MonoTime) {
        match self {
            ControlOp::Start => {
                clock.start(now);
            }
            ControlOp::Pause => {
                clock.pause(now);
            }
            ControlOp::SetTime(seconds) => {
                let _ = clock.set_time(seconds, now);
            }
            ControlOp::AdjustTime(delta) => {
                let _ = clock.adjust_time(delta);
            }
        }
    }
}

/// Burst shape
#[derive(Clone, Debug)]
pub struct BurstConfig {
    /// Number of operations
    pub length: usize,
    /// Largest absolute SET_TIME / ADJUST_TIME value
    pub max_seconds: i64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        BurstConfig {
            length: 500,
            max_seconds: 7200,
        }
    }
}

impl BurstConfig {
    /// Long burst, as produced by a stuck-key style generator
    pub fn rapid_fire() -> Self {
        BurstConfig {
            length: 10_000,
            max_seconds: 3600,
        }
    }
}

/// Seeded generator of control bursts
pub struct CommandBurst {
    config: BurstConfig,
    rng: StdRng,
}

impl CommandBurst {
    pub fn with_seed(config: BurstConfig, seed: u64) -> Self {
        CommandBurst {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next operation
    pub fn next_op(&mut self) -> ControlOp {
        let max = self.config.max_seconds.max(1);
        match self.rng.gen_range(0..4) {
            0 => ControlOp::Start,
            1 => ControlOp::Pause,
            2 => ControlOp::SetTime(self.rng.gen_range(0..=max)),
            _ => ControlOp::AdjustTime(self.rng.gen_range(-max..=max)),
        }
    }

    /// A full burst
    pub fn generate(&mut self) -> Vec<ControlOp> {
        (0..self.config.length).map(|_| self.next_op()).collect()
    }
}

/// Reference result of applying `ops` in order at a single instant
pub fn replay(initial_seconds: i64, ops: &[ControlOp], now: MonoTime) -> ClockState {
    let mut clock = ClockState::new(initial_seconds);
    for op in ops {
        op.apply(&mut clock, now);
    }
    clock
}
