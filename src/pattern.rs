//! The animated pattern interface consumed by the engine
//!
//! The engine never looks inside the pattern: it owns exactly one instance,
//! resizes it when the surface changes, advances it once per clock tick, and
//! hands it the surface during a paint. The color/decay/shape algorithm
//! behind those calls lives entirely on the other side of this trait.

use anyhow::Result;

use crate::surface::PaintSurface;

/// A stateful animated pattern painted onto the wallpaper surface.
///
/// All calls are made from the engine's owning event loop; implementations
/// never need to be thread-safe beyond `Send`.
pub trait Pattern<S: PaintSurface>: Send {
    /// Rebuild the internal grid for a new surface extent. Zero-sized
    /// extents are valid and must leave the pattern in a state where
    /// [`Pattern::advance`] and [`Pattern::render`] degenerate safely.
    fn resize(&mut self, width: u32, height: u32);

    /// Mutate the animated state by one step. Errors are absorbed at the
    /// tick boundary: a failing advance costs one frame, never the clock.
    fn advance(&mut self) -> Result<()>;

    /// Paint the current state onto an already-cleared surface.
    fn render(&mut self, surface: &mut S) -> Result<()>;

    // Configuration setters, pushed by the engine whenever preferences
    // change. Values arrive already sanitized.

    /// Cell size of the animated grid, in pixels.
    fn set_block_size(&mut self, px: i32);

    /// Named hue family to draw from (e.g. "Blue").
    fn set_color_range(&mut self, range: &str);

    /// Per-tick brightness decay step.
    fn set_decay_step(&mut self, step: i32);

    /// Outline width for each cell, in pixels.
    fn set_stroke_width(&mut self, px: i32);

    /// Minimum brightness below which a cell is not drawn.
    fn set_threshold(&mut self, threshold: i32);

    /// Spacing between cells, in pixels.
    fn set_padding(&mut self, px: i32);

    /// Cell shape name (e.g. "hexagon").
    fn set_shape(&mut self, shape: &str);

    /// Fill opacity, 0-255.
    fn set_fill_alpha(&mut self, alpha: u8);

    /// Outline opacity, 0-255.
    fn set_stroke_alpha(&mut self, alpha: u8);
}
