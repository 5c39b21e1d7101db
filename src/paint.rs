//! Coalesced paint scheduling
//!
//! Ticks, resizes, and visibility flips all want a repaint, and they arrive
//! in bursts. The scheduler collapses them into a single pending paint: the
//! flag is set by any number of requests and consumed exactly once by the
//! engine's event loop right before it paints. It also owns the idle
//! fallback: after a completed paint while visible, one more repaint is
//! armed a fixed delay out so the last frame stays valid even when the
//! clock is stopped.

use std::time::{Duration, Instant};

/// Idle delay after which the last frame is repainted.
pub const FALLBACK_REPAINT_DELAY: Duration = Duration::from_secs(5);

/// Deduplicated "draw requested" signal plus the idle fallback deadline.
///
/// Lives inside the engine's event loop and is never touched from another
/// thread; callers outside the loop request paints by sending an event.
#[derive(Debug, Default)]
pub struct PaintScheduler {
    pending: bool,
    fallback_at: Option<Instant>,
}

impl PaintScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a repaint. Repeated requests before the pending paint
    /// executes are deduplicated, not queued. Returns `true` when this call
    /// transitioned the scheduler from idle to pending.
    pub fn request_paint(&mut self) -> bool {
        let newly_pending = !self.pending;
        self.pending = true;
        newly_pending
    }

    /// Consume the pending flag. Called by the event loop immediately
    /// before executing a paint; at most one paint runs per request burst.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Drop any pending paint and disarm the fallback. Called on
    /// visibility-false and on destruction; idempotent.
    pub fn cancel_pending(&mut self) {
        self.pending = false;
        self.fallback_at = None;
    }

    /// Arm the idle fallback repaint, replacing any previously armed one.
    /// Called after each completed paint while the engine is visible.
    pub fn arm_fallback(&mut self, now: Instant) {
        self.fallback_at = Some(now + FALLBACK_REPAINT_DELAY);
    }

    /// Time remaining until the armed fallback fires, if any. Zero when the
    /// deadline has already passed.
    pub fn time_until_fallback(&self, now: Instant) -> Option<Duration> {
        self.fallback_at
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consume the fallback deadline if it has passed.
    pub fn take_due_fallback(&mut self, now: Instant) -> bool {
        match self.fallback_at {
            Some(deadline) if now >= deadline => {
                self.fallback_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
