//! Headless surface host and demo pattern
//!
//! A real deployment wires the engine to a platform surface; this module
//! provides the in-process equivalents used by the `colorburst` binary and
//! the test suite: an RGBA framebuffer host with injectable failure modes,
//! and a deliberately simple pulsing pattern. The probe handles stay valid
//! after the host/pattern move into the engine, which is what lets tests
//! observe a running engine from the outside.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::pattern::Pattern;
use crate::surface::{Color, PaintSurface, SurfaceError, SurfaceHost};

/// In-memory RGBA surface.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Fill every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl PaintSurface for FrameBuffer {
    fn clear(&mut self, color: Color) {
        self.fill(color);
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Shared observation and fault-injection handles for a [`HeadlessHost`].
#[derive(Clone)]
pub struct HostProbe {
    /// Frames successfully painted and presented.
    pub frames: Arc<AtomicUsize>,
    /// When false, `acquire` reports the surface as unavailable.
    pub available: Arc<AtomicBool>,
    /// When set, the next `release` fails with the benign teardown race.
    pub drop_next_release: Arc<AtomicBool>,
}

impl HostProbe {
    fn new() -> Self {
        Self {
            frames: Arc::new(AtomicUsize::new(0)),
            available: Arc::new(AtomicBool::new(true)),
            drop_next_release: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

/// Surface host backed by an in-memory framebuffer.
pub struct HeadlessHost {
    width: u32,
    height: u32,
    surface: Option<FrameBuffer>,
    probe: HostProbe,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            surface: Some(FrameBuffer::new(width, height)),
            probe: HostProbe::new(),
        }
    }

    /// Clone the probe before moving the host into the engine.
    pub fn probe(&self) -> HostProbe {
        self.probe.clone()
    }
}

impl SurfaceHost for HeadlessHost {
    type Surface = FrameBuffer;

    fn acquire(&mut self) -> Option<FrameBuffer> {
        if !self.probe.available.load(Ordering::SeqCst) {
            return None;
        }
        Some(
            self.surface
                .take()
                .unwrap_or_else(|| FrameBuffer::new(self.width, self.height)),
        )
    }

    fn release(&mut self, surface: FrameBuffer) -> Result<(), SurfaceError> {
        if self.probe.drop_next_release.swap(false, Ordering::SeqCst) {
            // The frame is lost; the buffer is rebuilt on the next acquire.
            return Err(SurfaceError::SurfaceGone);
        }
        self.surface = Some(surface);
        self.probe.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_visible(&self) -> bool {
        true
    }

    fn current_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Shared observation and fault-injection handles for a [`PulsePattern`].
#[derive(Clone)]
pub struct PatternProbe {
    pub advances: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
    /// When set, `advance` fails until cleared.
    pub fail_advance: Arc<AtomicBool>,
}

impl PatternProbe {
    fn new() -> Self {
        Self {
            advances: Arc::new(AtomicUsize::new(0)),
            renders: Arc::new(AtomicUsize::new(0)),
            fail_advance: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn advance_count(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

/// Minimal animated pattern: a full-surface pulse in the configured hue.
///
/// Exists to exercise the engine, not to look good; the production pattern
/// lives behind the same trait.
pub struct PulsePattern {
    width: u32,
    height: u32,
    brightness: u8,
    rising: bool,

    color_range: String,
    decay_step: i32,
    threshold: i32,
    fill_alpha: u8,

    probe: PatternProbe,
}

impl PulsePattern {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            brightness: 0,
            rising: true,
            color_range: "Blue".to_string(),
            decay_step: 8,
            threshold: 0,
            fill_alpha: 64,
            probe: PatternProbe::new(),
        }
    }

    /// Clone the probe before moving the pattern into the engine.
    pub fn probe(&self) -> PatternProbe {
        self.probe.clone()
    }

    fn current_color(&self) -> Color {
        let level = self.brightness.max(self.threshold.clamp(0, 255) as u8);
        match self.color_range.as_str() {
            "Red" => [level, 0, 0, self.fill_alpha],
            "Green" => [0, level, 0, self.fill_alpha],
            "Blue" => [0, 0, level, self.fill_alpha],
            _ => [level, level, level, self.fill_alpha],
        }
    }
}

impl Default for PulsePattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern<FrameBuffer> for PulsePattern {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn advance(&mut self) -> Result<()> {
        if self.probe.fail_advance.load(Ordering::SeqCst) {
            anyhow::bail!("injected advance failure");
        }

        let step = self.decay_step.clamp(1, 255) as u8;
        if self.rising {
            let (next, overflow) = self.brightness.overflowing_add(step);
            self.brightness = if overflow { 255 } else { next };
            if self.brightness == 255 {
                self.rising = false;
            }
        } else {
            self.brightness = self.brightness.saturating_sub(step);
            if self.brightness == 0 {
                self.rising = true;
            }
        }

        self.probe.advances.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn render(&mut self, surface: &mut FrameBuffer) -> Result<()> {
        // A zero-sized grid renders nothing but still counts as a frame.
        if self.width > 0 && self.height > 0 {
            surface.fill(self.current_color());
        }
        self.probe.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_block_size(&mut self, _px: i32) {}

    fn set_color_range(&mut self, range: &str) {
        self.color_range = range.to_string();
    }

    fn set_decay_step(&mut self, step: i32) {
        self.decay_step = step;
    }

    fn set_stroke_width(&mut self, _px: i32) {}

    fn set_threshold(&mut self, threshold: i32) {
        self.threshold = threshold;
    }

    fn set_padding(&mut self, _px: i32) {}

    fn set_shape(&mut self, _shape: &str) {}

    fn set_fill_alpha(&mut self, alpha: u8) {
        self.fill_alpha = alpha;
    }

    fn set_stroke_alpha(&mut self, _alpha: u8) {}
}
