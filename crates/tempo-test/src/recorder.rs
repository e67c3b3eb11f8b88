//! Frame recorder - observe what a kernel paints without touching its surface

use std::time::Duration;

use tokio::sync::mpsc;

use tempo_kernel::{DisplayBuffer, PaintedFrame};

/// Receiving end of a recording surface
pub struct RecordedFrames {
    rx: mpsc::UnboundedReceiver<PaintedFrame>,
}

/// Build a surface whose presenter forwards every painted frame over a
/// channel. The channel closes when the kernel drops the surface.
pub fn recording_surface(width: u32, height: u32, dpr: f64) -> (DisplayBuffer, RecordedFrames) {
    let (tx, rx) = mpsc::unbounded_channel();
    let surface = DisplayBuffer::new(width, height, dpr)
        .unwrap_or_else(|e| panic!("recording surface geometry: {e}"))
        .with_presenter(move |frame: &PaintedFrame| {
            let _ = tx.send(frame.clone());
        });
    (surface, RecordedFrames { rx })
}

impl RecordedFrames {
    /// All frames presented so far
    pub fn drain(&mut self) -> Vec<PaintedFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Faces of all frames presented so far
    pub fn drain_faces(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|frame| frame.face.to_string())
            .collect()
    }

    /// Wait until the kernel has released the surface.
    /// Returns false if frames keep arriving or the wait times out.
    pub async fn released_within(&mut self, limit: Duration) -> bool {
        self.drain();
        matches!(tokio::time::timeout(limit, self.rx.recv()).await, Ok(None))
    }
}

/// Give spawned tasks a chance to run at the current instant
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
