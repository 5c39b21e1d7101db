//! Surface acquisition and the per-frame paint session
//!
//! The drawable surface belongs to the host environment; this module wraps
//! the acquire/paint/release protocol around one frame. The host is free to
//! tear the surface down at any point, including between a paint being
//! scheduled and executed, so every step here tolerates the surface
//! disappearing mid-flight.

use anyhow::Result;
use log::debug;
use thiserror::Error;

/// RGBA color, used when clearing the surface before the pattern renders.
pub type Color = [u8; 4];

/// Background color painted behind the pattern each frame.
pub const BACKGROUND: Color = [0, 0, 0, 255];

/// Failures reported by [`SurfaceHost::release`].
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface was invalidated while we held it. This is an expected
    /// race during teardown: the frame is skipped, nothing is logged as an
    /// error, and the engine carries on.
    #[error("surface invalidated during paint")]
    SurfaceGone,

    /// Any other release failure. Fatal to this frame only.
    #[error("surface release failed: {0}")]
    Release(String),
}

/// A drawable target borrowed for the duration of one paint.
pub trait PaintSurface {
    /// Fill the whole surface with a solid color.
    fn clear(&mut self, color: Color);

    /// Surface dimensions in pixels.
    fn size(&self) -> (u32, u32);
}

/// The host environment that owns the drawable surface.
pub trait SurfaceHost {
    type Surface: PaintSurface;

    /// Borrow the surface for one paint. `None` means the surface is
    /// currently unavailable (typically mid-destruction) and the frame
    /// should be skipped silently.
    fn acquire(&mut self) -> Option<Self::Surface>;

    /// Return the surface and present the painted frame.
    fn release(&mut self, surface: Self::Surface) -> Result<(), SurfaceError>;

    /// Whether the host currently considers the surface visible.
    fn is_visible(&self) -> bool;

    /// Current surface extent in pixels.
    fn current_size(&self) -> (u32, u32);
}

/// Run one paint session against the host surface.
///
/// Acquires the surface, invokes `paint`, and releases the surface even when
/// the paint itself failed. Returns `Ok(true)` when a frame was painted and
/// presented, `Ok(false)` when the surface was unavailable or invalidated
/// concurrently (the frame is skipped silently). Paint errors and
/// non-benign release errors propagate to the caller, which logs them at the
/// frame boundary; neither prevents the next scheduled paint.
pub fn with_surface<H, F>(host: &mut H, paint: F) -> Result<bool>
where
    H: SurfaceHost,
    F: FnOnce(&mut H::Surface) -> Result<()>,
{
    let Some(mut surface) = host.acquire() else {
        // Expected race while the surface is mid-destruction.
        debug!("surface unavailable, skipping frame");
        return Ok(false);
    };

    let painted = paint(&mut surface);

    // Release must be attempted even if the paint errored.
    match host.release(surface) {
        Ok(()) => {}
        Err(SurfaceError::SurfaceGone) => {
            debug!("surface invalidated during paint, frame dropped");
            return Ok(false);
        }
        Err(err) => {
            // Surface the paint failure first if there was one.
            painted?;
            return Err(err.into());
        }
    }

    painted?;
    Ok(true)
}
