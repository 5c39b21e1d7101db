//! Core wallpaper engine implementation
//!
//! This module contains the lifecycle coordinator: the single owner of the
//! frame clock, the paint scheduler, the pattern generator, and the
//! preference subscription. Everything that mutates shared state — surface
//! paints, configuration reloads, pattern updates — is marshaled onto one
//! event loop, so ticks never race a paint and a preference change is never
//! lost or double-applied mid-tick.
//!
//! Lifecycle: `Created → Active ⇄ Suspended → Destroyed`. Destroyed is
//! terminal; every late event is rejected as a deterministic no-op, because
//! a crashing background wallpaper degrades the whole host environment.

use crate::surface::PaintSurface;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use crate::clock::{FrameClock, DEFAULT_TICK_INTERVAL};
use crate::paint::PaintScheduler;
use crate::pattern::Pattern;
use crate::prefs::{defaults, keys, PrefStore, SubscriptionId};
use crate::surface::{self, SurfaceHost};

/// Animation pacing, re-read from preferences on every change notification.
#[derive(Debug, Clone, Copy)]
pub struct AnimationConfig {
    /// Delay between animation ticks. Always positive.
    pub tick_interval: Duration,
}

/// Lifecycle phase of the engine. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Active,
    Suspended,
    Destroyed,
}

/// Mutable engine state, updated exclusively by lifecycle transitions on
/// the owning event loop.
#[derive(Debug, Clone, Copy)]
pub struct EngineState {
    pub visible: bool,
    pub surface_ready: bool,
    pub width: u32,
    pub height: u32,
}

impl EngineState {
    /// Painting is permitted only when the surface exists and is visible.
    pub fn can_paint(&self) -> bool {
        self.visible && self.surface_ready
    }
}

/// Events marshaled onto the engine's owning event loop.
#[derive(Debug)]
pub enum EngineEvent {
    /// Periodic animation tick from the frame clock.
    Tick,
    /// Explicit repaint request (initial paint, host-driven refresh).
    PaintRequested,
    /// The drawable surface was created or changed extent.
    SurfaceResized { width: u32, height: u32 },
    /// The host toggled wallpaper visibility.
    VisibilityChanged(bool),
    /// The preference store reported a change.
    PrefsChanged,
    /// The drawable surface is gone for good.
    SurfaceDestroyed,
}

/// Cloneable sender half used by the host environment, the clock thread,
/// and the preference listener to marshal events onto the engine loop.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineEvent>,
}

impl EngineHandle {
    /// The surface was created or resized to `width` x `height`.
    pub fn surface_resized(&self, width: u32, height: u32) {
        let _ = self.tx.send(EngineEvent::SurfaceResized { width, height });
    }

    /// The wallpaper became visible or hidden.
    pub fn visibility_changed(&self, visible: bool) {
        let _ = self.tx.send(EngineEvent::VisibilityChanged(visible));
    }

    /// The surface is being torn down; the engine shuts down in response.
    pub fn surface_destroyed(&self) {
        let _ = self.tx.send(EngineEvent::SurfaceDestroyed);
    }

    /// Ask for one repaint at the next scheduling opportunity.
    pub fn request_paint(&self) {
        let _ = self.tx.send(EngineEvent::PaintRequested);
    }
}

/// The wallpaper engine: lifecycle coordinator and owner of all animation
/// state.
pub struct WallpaperEngine<H, P, R>
where
    H: SurfaceHost,
    P: Pattern<H::Surface>,
    R: PrefStore,
{
    host: H,
    pattern: P,
    prefs: Arc<R>,
    subscription: Option<SubscriptionId>,

    config: AnimationConfig,
    state: EngineState,
    phase: Phase,

    clock: FrameClock,
    scheduler: PaintScheduler,

    tx: mpsc::Sender<EngineEvent>,
    rx: mpsc::Receiver<EngineEvent>,
}

impl<H, P, R> WallpaperEngine<H, P, R>
where
    H: SurfaceHost,
    P: Pattern<H::Surface>,
    R: PrefStore,
{
    /// Create the engine: subscribe to preference changes, load the current
    /// configuration into the pattern, and request one initial paint.
    pub fn new(host: H, pattern: P, prefs: Arc<R>) -> Self {
        let (tx, rx) = mpsc::channel();

        // Preference changes are marshaled onto the owning loop like any
        // other lifecycle event; the listener itself never reads values.
        let listener_tx = Mutex::new(tx.clone());
        let subscription = prefs.subscribe(Arc::new(move || {
            let _ = listener_tx.lock().send(EngineEvent::PrefsChanged);
        }));

        let visible = host.is_visible();
        let (width, height) = host.current_size();

        let mut engine = Self {
            host,
            pattern,
            prefs,
            subscription: Some(subscription),
            config: AnimationConfig {
                tick_interval: DEFAULT_TICK_INTERVAL,
            },
            state: EngineState {
                visible,
                surface_ready: false,
                width,
                height,
            },
            phase: Phase::Created,
            clock: FrameClock::new(),
            scheduler: PaintScheduler::new(),
            tx,
            rx,
        };

        info!("🖼️ Wallpaper engine created ({}x{})", width, height);
        engine.apply_preferences();

        // Initial paint, honored as soon as the surface is ready.
        let _ = engine.tx.send(EngineEvent::PaintRequested);

        engine
    }

    /// Sender half for the host environment and auxiliary threads.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn tick_interval(&self) -> Duration {
        self.config.tick_interval
    }

    /// Run the event loop until the surface is destroyed.
    pub fn run(&mut self) -> Result<()> {
        info!("🎬 Wallpaper engine event loop started");

        while self.phase != Phase::Destroyed {
            self.pump();
        }

        info!("🛑 Wallpaper engine event loop finished");
        Ok(())
    }

    /// One iteration of the owning event loop: wait for the next event or
    /// the idle-fallback deadline, drain any burst, then paint at most once.
    fn pump(&mut self) {
        let received = match self.scheduler.time_until_fallback(Instant::now()) {
            Some(wait) => match self.rx.recv_timeout(wait) {
                Ok(event) => Some(event),
                Err(mpsc::RecvTimeoutError::Timeout) => None,
                Err(mpsc::RecvTimeoutError::Disconnected) => Some(EngineEvent::SurfaceDestroyed),
            },
            None => match self.rx.recv() {
                Ok(event) => Some(event),
                Err(_) => Some(EngineEvent::SurfaceDestroyed),
            },
        };

        match received {
            Some(event) => {
                self.handle_event(event);
                // Coalesce bursts: everything already queued is handled
                // before the single pending paint executes.
                while let Ok(event) = self.rx.try_recv() {
                    self.handle_event(event);
                }
            }
            None => {
                if self.scheduler.take_due_fallback(Instant::now()) {
                    debug!("🖼️ Idle fallback repaint");
                    self.scheduler.request_paint();
                }
            }
        }

        self.flush_paint();
    }

    fn handle_event(&mut self, event: EngineEvent) {
        // Destroyed is terminal: late events are rejected deterministically.
        if self.phase == Phase::Destroyed {
            debug!("Ignoring {:?} after destruction", event);
            return;
        }

        match event {
            EngineEvent::Tick => self.on_tick(),
            EngineEvent::PaintRequested => {
                self.scheduler.request_paint();
            }
            EngineEvent::SurfaceResized { width, height } => {
                self.on_surface_resized(width, height);
            }
            EngineEvent::VisibilityChanged(visible) => self.on_visibility_changed(visible),
            EngineEvent::PrefsChanged => self.apply_preferences(),
            EngineEvent::SurfaceDestroyed => self.on_surface_destroyed(),
        }
    }

    /// Execute the pending paint, if any. At most one paint per pump
    /// iteration, and only while the surface is visible and ready.
    fn flush_paint(&mut self) {
        if self.phase == Phase::Destroyed || !self.state.can_paint() {
            return;
        }
        if self.scheduler.take_pending() {
            self.paint_frame();
        }
    }

    fn on_tick(&mut self) {
        // Failure boundary: a failing advance costs one frame, never the
        // clock.
        if let Err(err) = self.pattern.advance() {
            error!("💥 Pattern advance failed: {:#}", err);
        }
        self.scheduler.request_paint();
    }

    fn on_surface_resized(&mut self, width: u32, height: u32) {
        debug!("📐 Surface resized to {}x{}", width, height);

        self.state.width = width;
        self.state.height = height;
        self.state.surface_ready = true;

        self.pattern.resize(width, height);
        if let Err(err) = self.pattern.advance() {
            error!("💥 Pattern advance failed: {:#}", err);
        }

        self.start_clock();
        self.phase = if self.state.visible {
            Phase::Active
        } else {
            Phase::Suspended
        };
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        debug!("👁️ Visibility changed: {}", visible);
        self.state.visible = visible;

        if visible {
            if self.state.surface_ready {
                self.scheduler.request_paint();
                self.start_clock();
                self.phase = Phase::Active;
            }
        } else {
            self.clock.stop();
            self.scheduler.cancel_pending();
            if self.state.surface_ready {
                self.phase = Phase::Suspended;
            }
        }
    }

    /// Re-read every preference with its documented default, push the
    /// values into the pattern, rebuild the grid at the current extent, and
    /// restart the clock. Runs on the owning loop, so a reload never
    /// interleaves with a tick or a paint.
    fn apply_preferences(&mut self) {
        info!("⚙️ Reloading preferences");
        self.clock.stop();

        let rate = self.prefs.get_int(keys::RATE, defaults::RATE_MS);
        self.config.tick_interval = if rate > 0 {
            Duration::from_millis(rate as u64)
        } else {
            warn!(
                "⚙️ Non-positive animation rate {}, falling back to {:?}",
                rate, DEFAULT_TICK_INTERVAL
            );
            DEFAULT_TICK_INTERVAL
        };

        self.pattern
            .set_block_size(self.prefs.get_int(keys::BLOCK_SIZE, defaults::BLOCK_SIZE));
        self.pattern.set_color_range(
            &self
                .prefs
                .get_string(keys::COLOR_RANGE, defaults::COLOR_RANGE),
        );
        self.pattern
            .set_decay_step(self.prefs.get_int(keys::DECAY, defaults::DECAY_STEP));
        self.pattern.set_stroke_width(
            self.prefs
                .get_int(keys::STROKE_WIDTH, defaults::STROKE_WIDTH),
        );
        self.pattern
            .set_threshold(self.prefs.get_int(keys::THRESHOLD, defaults::THRESHOLD));
        self.pattern
            .set_padding(self.prefs.get_int(keys::PADDING, defaults::PADDING));
        self.pattern
            .set_shape(&self.prefs.get_string(keys::SHAPE, defaults::SHAPE));
        self.pattern.set_fill_alpha(
            self.prefs
                .get_int(keys::FILL_ALPHA, defaults::FILL_ALPHA)
                .clamp(0, 255) as u8,
        );
        self.pattern.set_stroke_alpha(
            self.prefs
                .get_int(keys::STROKE_ALPHA, defaults::STROKE_ALPHA)
                .clamp(0, 255) as u8,
        );

        self.pattern.resize(self.state.width, self.state.height);
        self.start_clock();
    }

    fn on_surface_destroyed(&mut self) {
        info!("🧹 Surface destroyed, shutting down engine");

        self.clock.stop();
        self.scheduler.cancel_pending();
        self.state.visible = false;
        self.state.surface_ready = false;
        self.phase = Phase::Destroyed;

        if let Some(id) = self.subscription.take() {
            self.prefs.unsubscribe(id);
        }
    }

    fn start_clock(&mut self) {
        let tx = self.tx.clone();
        self.clock.start(self.config.tick_interval, move || {
            let _ = tx.send(EngineEvent::Tick);
        });
    }

    /// One full acquire-clear-render-release cycle. Failures are absorbed
    /// here: a lost frame, never a stopped engine.
    fn paint_frame(&mut self) {
        let pattern = &mut self.pattern;
        let result = surface::with_surface(&mut self.host, |target| {
            target.clear(surface::BACKGROUND);
            pattern.render(target)
        });

        match result {
            Ok(true) => trace!("🎨 Frame painted"),
            Ok(false) => {} // surface gone mid-paint, expected during teardown
            Err(err) => error!("💥 Paint failed: {:#}", err),
        }

        if self.state.visible {
            self.scheduler.arm_fallback(Instant::now());
        }
    }
}

impl<H, P, R> Drop for WallpaperEngine<H, P, R>
where
    H: SurfaceHost,
    P: Pattern<H::Surface>,
    R: PrefStore,
{
    fn drop(&mut self) {
        // The clock joins its thread on drop; make sure a dropped engine
        // never leaves a ticking timer behind.
        self.clock.stop();
    }
}

#[cfg(test)]
mod tests;
