//! End-to-end kernel and store scenarios
//!
//! Every scenario runs on tokio's paused clock, so "advance 5s" is exact and
//! instantaneous.

use tempo_core::{MonotonicClock, RenderConfig, TempoResult};
use tempo_kernel::{KernelConfig, KernelHandle};

use crate::{recording_surface, RecordedFrames};

/// A kernel task wired to a frame recorder
pub struct KernelRig {
    pub handle: KernelHandle,
    pub frames: RecordedFrames,
}

impl KernelRig {
    /// Launch on the current runtime with the tokio clock
    pub fn launch(initial_seconds: i64) -> TempoResult<Self> {
        let (surface, frames) = recording_surface(320, 80, 1.0);
        let handle = KernelHandle::launch(
            surface,
            RenderConfig::default(),
            initial_seconds,
            KernelConfig::default(),
        )?;
        Ok(KernelRig { handle, frames })
    }

    /// Launch reading time from `clock`
    pub fn launch_with_clock(
        initial_seconds: i64,
        clock: impl MonotonicClock + 'static,
    ) -> TempoResult<Self> {
        let (surface, frames) = recording_surface(320, 80, 1.0);
        let handle = KernelHandle::spawn_with_clock(KernelConfig::default(), clock)?;
        handle.init(surface, RenderConfig::default(), initial_seconds);
        Ok(KernelRig { handle, frames })
    }

    /// Force a repaint at the kernel's current value and return that face
    pub async fn current_face(&mut self) -> Option<String> {
        self.handle.adjust_time(0);
        crate::settle().await;
        self.frames.drain_faces().pop()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use tempo_core::{DigitTable, ManualClock};
    use tempo_kernel::{Command, WakeConfig};
    use tempo_store::ReconciliationStore;
    use tokio::time::sleep;

    use super::*;
    use crate::{replay, settle, BurstConfig, CommandBurst, ControlOp};

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    // ------------------------------------------------------------------
    // Elapsed time tracks the monotonic clock, not the wake cadence
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kernel_reports_base_plus_elapsed() {
        let mut rig = KernelRig::launch(100).unwrap();
        rig.handle.start();

        sleep(ms(4_500)).await;

        assert_eq!(rig.current_face().await.as_deref(), Some("00:01:44"));
    }

    #[tokio::test(start_paused = true)]
    async fn store_total_independent_of_wake_count() {
        let mut fast = ReconciliationStore::new(
            100,
            WakeConfig {
                wake_interval: ms(10),
            },
        );
        let mut slow = ReconciliationStore::new(
            100,
            WakeConfig {
                wake_interval: ms(500),
            },
        );
        fast.start();
        slow.start();

        sleep(ms(4_500)).await;
        assert!(fast.pump() > slow.pump());

        assert_eq!(fast.snapshot().total_seconds, 104);
        assert_eq!(slow.snapshot().total_seconds, 104);
    }

    // ------------------------------------------------------------------
    // Pause / resume conservation
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kernel_pause_resume_conserves_time() {
        let mut rig = KernelRig::launch(0).unwrap();

        rig.handle.start();
        sleep(ms(5_000)).await;
        rig.handle.pause();
        sleep(ms(10_000)).await;
        rig.handle.start();
        sleep(ms(2_000)).await;

        assert_eq!(rig.current_face().await.as_deref(), Some("00:00:07"));
    }

    #[tokio::test(start_paused = true)]
    async fn store_pause_resume_conserves_time() {
        let mut store = ReconciliationStore::new(0, WakeConfig::default());

        store.start();
        sleep(ms(5_000)).await;
        store.pause();
        sleep(ms(10_000)).await;
        store.start();
        sleep(ms(2_000)).await;
        store.pump();

        assert_eq!(store.snapshot().total_seconds, 7);
    }

    // ------------------------------------------------------------------
    // SET_TIME re-anchors, ADJUST_TIME is additive
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kernel_set_time_while_running_reanchors() {
        let mut rig = KernelRig::launch(0).unwrap();

        rig.handle.start();
        sleep(ms(5_000)).await;
        rig.handle.set_time(3600);
        sleep(ms(1_000)).await;

        assert_eq!(rig.current_face().await.as_deref(), Some("01:00:01"));
    }

    #[tokio::test(start_paused = true)]
    async fn kernel_adjust_time_while_stopped_is_immediate() {
        let mut rig = KernelRig::launch(0).unwrap();
        settle().await;
        rig.frames.drain();

        rig.handle.adjust_time(3600);
        settle().await;

        assert_eq!(rig.frames.drain_faces(), vec!["01:00:00"]);
    }

    // ------------------------------------------------------------------
    // Idempotent START / PAUSE
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kernel_double_start_and_pause_are_noops() {
        let mut rig = KernelRig::launch(0).unwrap();

        rig.handle.start();
        sleep(ms(1_000)).await;
        rig.handle.start();
        sleep(ms(2_000)).await;
        rig.handle.pause();
        sleep(ms(500)).await;
        rig.handle.pause();
        sleep(ms(5_000)).await;

        assert_eq!(rig.current_face().await.as_deref(), Some("00:00:03"));
    }

    #[tokio::test(start_paused = true)]
    async fn store_double_start_and_pause_are_noops() {
        let mut store = ReconciliationStore::new(0, WakeConfig::default());

        store.start();
        sleep(ms(1_000)).await;
        store.start();
        sleep(ms(2_000)).await;
        store.pause();
        sleep(ms(500)).await;
        store.pause();
        sleep(ms(5_000)).await;
        store.pump();

        assert_eq!(store.clock().base_ms(), 3_000);
        assert_eq!(store.snapshot().total_seconds, 3);
        assert!(!store.snapshot().running);
    }

    // ------------------------------------------------------------------
    // Dirty check: one paint / notify per visible second
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kernel_paints_once_per_second_across_many_frames() {
        let mut rig = KernelRig::launch(0).unwrap();
        rig.handle.start();

        sleep(ms(3_010)).await;
        settle().await;

        // ~188 frames ran; only the initial paint and three boundaries painted
        assert_eq!(
            rig.frames.drain_faces(),
            vec!["00:00:00", "00:00:01", "00:00:02", "00:00:03"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn store_notifies_once_per_second_across_many_wakes() {
        let mut store = ReconciliationStore::new(0, WakeConfig { wake_interval: ms(50) });
        let calls = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&calls);
        let _sub = store.subscribe(move |_| seen.set(seen.get() + 1));

        store.start();
        for _ in 0..60 {
            assert!(store.next_wake().await);
        }

        // Forced notify on start plus one per second boundary
        assert_eq!(calls.get(), 4);
        assert_eq!(store.snapshot().display_time, "00:00:03");
    }

    // ------------------------------------------------------------------
    // Negative time: kernel signs, store clamps
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn negative_time_kernel_signs_store_clamps() {
        let mut rig = KernelRig::launch(0).unwrap();
        rig.handle.start();
        rig.handle.adjust_time(-10);
        settle().await;

        assert_eq!(rig.frames.drain_faces().pop().as_deref(), Some("-00:00:10"));

        let mut store = ReconciliationStore::new(0, WakeConfig::default());
        store.start();
        store.adjust_time(-10);

        assert_eq!(store.snapshot().display_time, "00:00:00");
        assert_eq!(store.snapshot().total_seconds, 0);
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn kernel_teardown_stops_frames_and_releases_surface() {
        let mut rig = KernelRig::launch(0).unwrap();
        rig.handle.start();
        sleep(ms(1_500)).await;

        rig.handle.terminate();
        rig.handle.terminate();

        assert!(rig.frames.released_within(ms(10_000)).await);
        rig.handle.start();
    }

    #[tokio::test(start_paused = true)]
    async fn store_teardown_is_idempotent() {
        let mut store = ReconciliationStore::new(0, WakeConfig::default());
        store.start();

        store.destroy();
        store.destroy();

        assert!(!store.next_wake().await);
        store.set_time(10);
        assert_eq!(store.snapshot().total_seconds, 10);
    }

    // ------------------------------------------------------------------
    // Ordering and failure handling
    // ------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn burst_processed_in_order_without_coalescing() {
        let ops = CommandBurst::with_seed(BurstConfig::rapid_fire(), 42).generate();
        let clock = ManualClock::new();
        let mut rig = KernelRig::launch_with_clock(0, clock.clone()).unwrap();

        for op in &ops {
            rig.handle.send(op.to_command());
        }
        rig.handle.adjust_time(0);
        sleep(ms(1)).await;

        let faces = rig.frames.drain_faces();
        let writes = ops
            .iter()
            .filter(|op| matches!(op, ControlOp::SetTime(_) | ControlOp::AdjustTime(_)))
            .count();
        // INIT, every write, and the final forced repaint
        assert_eq!(faces.len(), writes + 2);

        let expected = replay(0, &ops, clock.now());
        let digits = DigitTable::new();
        assert_eq!(
            faces.last().map(String::as_str),
            Some(digits.compose(expected.signed_second(clock.now())).as_str())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn commands_before_init_are_ignored() {
        let (surface, mut frames) = recording_surface(64, 32, 1.0);
        let handle = KernelHandle::spawn(KernelConfig::default()).unwrap();

        handle.start();
        handle.set_time(50);
        handle.init(surface, RenderConfig::default(), 5);
        sleep(ms(3_000)).await;

        // START was dropped, so the kernel is stopped at its initial time
        assert_eq!(frames.drain_faces(), vec!["00:00:05"]);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_commands_do_not_stop_the_kernel() {
        let mut rig = KernelRig::launch(0).unwrap();

        rig.handle.resize(0, 0, f64::NAN);
        rig.handle.set_time(i64::MAX);
        rig.handle.update_config_json(r#"{"textColor": 12}"#);
        rig.handle.send(Command::Resize {
            width: 640,
            height: 160,
            dpr: 2.0,
        });
        settle().await;

        let frames = rig.frames.drain();
        let last = frames.last().unwrap();
        assert_eq!(last.geometry.physical_size(), (1280, 320));
        assert_eq!(rig.current_face().await.as_deref(), Some("00:00:00"));
    }

    #[tokio::test(start_paused = true)]
    async fn config_update_keeps_omitted_fields() {
        let mut rig = KernelRig::launch(0).unwrap();

        rig.handle
            .update_config_json(r##"{"textColor": "#00ff00", "glowEffect": true, "unknown": 1}"##);
        settle().await;

        let last = rig.frames.drain().pop().unwrap();
        assert_eq!(last.text_color, tempo_core::Color::rgb(0, 0xff, 0));
        assert!(last.glow_blur > 0.0);
        assert_eq!(last.font_family, "monospace");
        assert_eq!(last.background_color, tempo_core::Color::BLACK);
    }

    #[test]
    fn store_without_runtime_stays_inert() {
        let mut store = ReconciliationStore::new(45, WakeConfig::default());

        assert!(!store.is_linked());
        store.start();
        store.pause();
        store.destroy();
        assert_eq!(store.snapshot().display_time, "00:00:45");
    }
}
