//! Display buffer - the kernel's render target
//!
//! The primary context builds a [`DisplayBuffer`] and moves it into the
//! kernel inside `Command::Init`. From then on only the kernel touches it.

use std::fmt;

use tempo_core::{ClockFace, Color, CommandError, RenderConfig};

/// Largest physical dimension accepted for either side
pub const MAX_PHYSICAL_DIMENSION: u32 = 16_384;

/// Largest physical pixel count (4096 x 4096, 64 MiB of RGBA)
pub const MAX_PHYSICAL_PIXELS: u64 = 4096 * 4096;

/// Shadow blur radius (logical px) when glow is enabled
pub const GLOW_BLUR: f64 = 10.0;

/// Status dot edge length (logical px)
pub const DOT_SIZE: f64 = 8.0;

/// Logical size and device pixel ratio of a surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub dpr: f64,
}

impl Geometry {
    /// Validate and build a geometry
    pub fn new(width: u32, height: u32, dpr: f64) -> Result<Self, CommandError> {
        let invalid = CommandError::InvalidGeometry { width, height, dpr };
        if width == 0 || height == 0 || !dpr.is_finite() || dpr <= 0.0 {
            return Err(invalid);
        }

        let geometry = Geometry { width, height, dpr };
        let (pw, ph) = geometry.physical_size();
        if pw == 0 || ph == 0 || pw > MAX_PHYSICAL_DIMENSION || ph > MAX_PHYSICAL_DIMENSION {
            return Err(invalid);
        }
        if u64::from(pw) * u64::from(ph) > MAX_PHYSICAL_PIXELS {
            return Err(invalid);
        }
        Ok(geometry)
    }

    /// Backing pixel dimensions
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| (v as f64 * self.dpr).round().min(u32::MAX as f64) as u32;
        (scale(self.width), scale(self.height))
    }
}

/// What one paint produced
#[derive(Clone, Debug, PartialEq)]
pub struct PaintedFrame {
    /// Signed whole second that was painted
    pub second: i64,
    pub face: ClockFace,
    pub text_color: Color,
    pub background_color: Color,
    pub font_family: String,
    /// Shadow blur in physical px, zero without glow
    pub glow_blur: f64,
    pub dot_visible: bool,
    pub geometry: Geometry,
}

/// Receives finished frames (terminal, recorder, compositor)
pub trait Presenter: Send {
    fn present(&mut self, frame: &PaintedFrame);
}

impl<F> Presenter for F
where
    F: FnMut(&PaintedFrame) + Send,
{
    fn present(&mut self, frame: &PaintedFrame) {
        self(frame)
    }
}

/// RGBA pixel surface owned by the kernel
pub struct DisplayBuffer {
    geometry: Geometry,
    pixels: Vec<u32>,
    last_frame: Option<PaintedFrame>,
    presenter: Option<Box<dyn Presenter>>,
}

impl DisplayBuffer {
    /// Create a surface of the given logical size
    pub fn new(width: u32, height: u32, dpr: f64) -> Result<Self, CommandError> {
        let geometry = Geometry::new(width, height, dpr)?;
        Ok(DisplayBuffer {
            geometry,
            pixels: vec![0; pixel_count(&geometry)],
            last_frame: None,
            presenter: None,
        })
    }

    /// Attach a presenter that is handed every painted frame
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn last_frame(&self) -> Option<&PaintedFrame> {
        self.last_frame.as_ref()
    }

    /// Adopt new geometry, reallocating the backing store
    pub fn resize(&mut self, geometry: Geometry) {
        self.geometry = geometry;
        self.pixels = vec![0; pixel_count(&geometry)];
    }

    /// Paint a face with the given config and present it
    pub fn paint(&mut self, second: i64, face: ClockFace, config: &RenderConfig) {
        self.pixels.fill(config.background_color.to_rgba());

        let dot_visible = config.show_dot && second.rem_euclid(2) == 0;
        if dot_visible {
            self.fill_dot(config.text_color);
        }

        let glow_blur = if config.glow_effect {
            GLOW_BLUR * self.geometry.dpr
        } else {
            0.0
        };

        let frame = PaintedFrame {
            second,
            face,
            text_color: config.text_color,
            background_color: config.background_color,
            font_family: config.font_family.clone(),
            glow_blur,
            dot_visible,
            geometry: self.geometry,
        };

        if let Some(presenter) = self.presenter.as_mut() {
            presenter.present(&frame);
        }
        self.last_frame = Some(frame);
    }

    /// Square status indicator in the top-right corner
    fn fill_dot(&mut self, color: Color) {
        let (pw, ph) = self.geometry.physical_size();
        let size = ((DOT_SIZE * self.geometry.dpr).round() as u32).min(pw).min(ph);
        let x0 = pw - size;
        let rgba = color.to_rgba();

        for y in 0..size {
            let row = (y * pw) as usize;
            let start = row + x0 as usize;
            self.pixels[start..start + size as usize].fill(rgba);
        }
    }
}

impl fmt::Debug for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayBuffer")
            .field("geometry", &self.geometry)
            .field("last_frame", &self.last_frame.as_ref().map(|fr| fr.face))
            .field("presenter", &self.presenter.is_some())
            .finish()
    }
}

fn pixel_count(geometry: &Geometry) -> usize {
    let (pw, ph) = geometry.physical_size();
    pw as usize * ph as usize
}
