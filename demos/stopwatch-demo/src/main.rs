//! TEMPO Stopwatch Demo
//!
//! Runs a painting kernel and a reconciliation store side by side, then
//! blocks the primary thread for a while. The kernel keeps painting on its own
//! worker; the store catches up in a single notification once unblocked.
//!
//! Environment:
//! - `TEMPO_INITIAL_SECONDS` (default 0)
//! - `TEMPO_RUN_SECONDS` (default 6)
//! - `TEMPO_STALL_SECONDS` (default 2)
//! - `TEMPO_LOW_POWER` (set to `1` for a 100 ms frame cadence)
//! - `RUST_LOG` (default `info`)

use std::io::{self, Write};
use std::time::Duration;

use tempo_core::{RenderConfig, TempoResult};
use tempo_kernel::{DisplayBuffer, KernelConfig, KernelHandle, PaintedFrame, WakeConfig};
use tempo_store::ReconciliationStore;
use tracing_subscriber::EnvFilter;

fn env_seconds(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, default, "not an integer; using default");
            default
        }),
        Err(_) => default,
    }
}

fn print_frame(frame: &PaintedFrame) {
    let dot = if frame.dot_visible { "●" } else { " " };
    println!("[kernel] {} {}", frame.face, dot);
    io::stdout().flush().ok();
}

#[tokio::main]
async fn main() -> TempoResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let initial_seconds = env_seconds("TEMPO_INITIAL_SECONDS", 0);
    let run_seconds = env_seconds("TEMPO_RUN_SECONDS", 6).max(1) as u64;
    let stall_seconds = env_seconds("TEMPO_STALL_SECONDS", 2).max(0) as u64;
    let kernel_config = if env_seconds("TEMPO_LOW_POWER", 0) != 0 {
        KernelConfig::low_power()
    } else {
        KernelConfig::default()
    };

    println!("╔══════════════════════════════════════════════╗");
    println!("║        TEMPO Demo - Drift-free stopwatch     ║");
    println!("╚══════════════════════════════════════════════╝");

    let surface = DisplayBuffer::new(320, 80, 2.0)?.with_presenter(print_frame);
    let mut kernel = KernelHandle::launch(
        surface,
        RenderConfig::broadcast(),
        initial_seconds,
        kernel_config,
    )?;

    let mut store = ReconciliationStore::new(initial_seconds, WakeConfig::default());
    let _subscription = store.subscribe(|snapshot| {
        let state = if snapshot.running { "running" } else { "paused" };
        println!("[store]  {} ({})", snapshot.display_time, state);
    });

    kernel.start();
    store.start();

    let stall_at = tokio::time::Instant::now() + Duration::from_secs(run_seconds / 2);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(run_seconds);
    let mut stalled = false;

    while tokio::time::Instant::now() < deadline {
        if !stalled && tokio::time::Instant::now() >= stall_at {
            stalled = true;
            tracing::info!(seconds = stall_seconds, "blocking the primary thread");
            std::thread::sleep(Duration::from_secs(stall_seconds));
            let handled = store.pump();
            tracing::info!(wake_signals = handled, "primary thread resumed");
        }

        tokio::select! {
            linked = store.next_wake() => {
                if !linked {
                    tokio::time::sleep_until(deadline).await;
                }
            }
            _ = tokio::time::sleep_until(deadline) => {}
        }
    }

    kernel.pause();
    store.pause();

    // Negative time: the kernel shows the sign, the store clamps at zero
    kernel.set_time(0);
    kernel.adjust_time(-10);
    store.set_time(0);
    store.adjust_time(-10);
    tokio::time::sleep(Duration::from_millis(50)).await;

    kernel.terminate();
    store.destroy();
    Ok(())
}
