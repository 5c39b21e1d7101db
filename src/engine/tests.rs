//! Unit tests for the lifecycle coordinator
//!
//! These drive the transition table synchronously (no event loop, no timer
//! thread waits) and assert on the resulting engine state, clock state, and
//! pattern interactions. End-to-end timing behavior is covered by the
//! integration suite in `tests/engine_lifecycle.rs`.

use super::*;
use crate::demo::{FrameBuffer, HeadlessHost, PulsePattern};
use crate::prefs::MemoryPrefs;
use std::sync::atomic::{AtomicBool, Ordering};

/// Pattern that records every call it receives.
struct RecordingPattern {
    log: Arc<Mutex<Vec<String>>>,
    fail_advance: Arc<AtomicBool>,
}

impl RecordingPattern {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>, Arc<AtomicBool>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let fail = Arc::new(AtomicBool::new(false));
        (
            Self {
                log: log.clone(),
                fail_advance: fail.clone(),
            },
            log,
            fail,
        )
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().push(call.into());
    }
}

impl Pattern<FrameBuffer> for RecordingPattern {
    fn resize(&mut self, width: u32, height: u32) {
        self.record(format!("resize({width},{height})"));
    }

    fn advance(&mut self) -> Result<()> {
        if self.fail_advance.load(Ordering::SeqCst) {
            anyhow::bail!("injected advance failure");
        }
        self.record("advance");
        Ok(())
    }

    fn render(&mut self, _surface: &mut FrameBuffer) -> Result<()> {
        self.record("render");
        Ok(())
    }

    fn set_block_size(&mut self, px: i32) {
        self.record(format!("set_block_size({px})"));
    }

    fn set_color_range(&mut self, range: &str) {
        self.record(format!("set_color_range({range})"));
    }

    fn set_decay_step(&mut self, step: i32) {
        self.record(format!("set_decay_step({step})"));
    }

    fn set_stroke_width(&mut self, px: i32) {
        self.record(format!("set_stroke_width({px})"));
    }

    fn set_threshold(&mut self, threshold: i32) {
        self.record(format!("set_threshold({threshold})"));
    }

    fn set_padding(&mut self, px: i32) {
        self.record(format!("set_padding({px})"));
    }

    fn set_shape(&mut self, shape: &str) {
        self.record(format!("set_shape({shape})"));
    }

    fn set_fill_alpha(&mut self, alpha: u8) {
        self.record(format!("set_fill_alpha({alpha})"));
    }

    fn set_stroke_alpha(&mut self, alpha: u8) {
        self.record(format!("set_stroke_alpha({alpha})"));
    }
}

type RecordingEngine = WallpaperEngine<HeadlessHost, RecordingPattern, MemoryPrefs>;

fn recording_engine() -> (RecordingEngine, Arc<Mutex<Vec<String>>>, Arc<AtomicBool>) {
    let (pattern, log, fail) = RecordingPattern::new();
    let engine = WallpaperEngine::new(
        HeadlessHost::new(64, 32),
        pattern,
        Arc::new(MemoryPrefs::new()),
    );
    (engine, log, fail)
}

fn log_len(log: &Arc<Mutex<Vec<String>>>) -> usize {
    log.lock().len()
}

#[test]
fn construction_loads_prefs_and_requests_initial_paint() {
    let (engine, log, _) = recording_engine();

    assert_eq!(engine.phase(), Phase::Created);
    assert_eq!(engine.tick_interval(), Duration::from_millis(100));
    assert!(engine.clock.is_running());

    // All nine settings were pushed, and the grid was rebuilt at the
    // host-reported extent.
    let calls = log.lock().clone();
    assert!(calls.contains(&"set_block_size(50)".to_string()));
    assert!(calls.contains(&"set_color_range(Blue)".to_string()));
    assert!(calls.contains(&"set_shape(hexagon)".to_string()));
    assert!(calls.contains(&"set_fill_alpha(64)".to_string()));
    assert!(calls.contains(&"set_stroke_alpha(128)".to_string()));
    assert!(calls.contains(&"resize(64,32)".to_string()));

    // The initial paint request is queued for the event loop. The running
    // clock may already have slipped a tick in ahead of it.
    let mut saw_paint_request = false;
    while let Ok(event) = engine.rx.try_recv() {
        if matches!(event, EngineEvent::PaintRequested) {
            saw_paint_request = true;
        }
    }
    assert!(saw_paint_request);
}

#[test]
fn resize_rebuilds_grid_forces_advance_and_activates() {
    let (mut engine, log, _) = recording_engine();
    let before = log_len(&log);

    engine.handle_event(EngineEvent::SurfaceResized {
        width: 200,
        height: 100,
    });

    let calls = log.lock()[before..].to_vec();
    assert_eq!(calls, vec!["resize(200,100)", "advance"]);

    let state = engine.state();
    assert!(state.surface_ready);
    assert_eq!((state.width, state.height), (200, 100));
    assert_eq!(engine.phase(), Phase::Active);
    assert!(engine.clock.is_running());
}

#[test]
fn ticks_advance_and_coalesce_into_one_paint() {
    let (mut engine, _, _) = recording_engine();
    let frames = engine.host.probe();

    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });

    engine.handle_event(EngineEvent::Tick);
    engine.handle_event(EngineEvent::Tick);
    engine.handle_event(EngineEvent::Tick);
    assert!(engine.scheduler.is_pending());

    engine.flush_paint();
    assert_eq!(frames.frame_count(), 1);
    assert!(!engine.scheduler.is_pending());

    // No second paint without a new request.
    engine.flush_paint();
    assert_eq!(frames.frame_count(), 1);
}

#[test]
fn failing_advance_never_stops_the_clock_or_the_paint() {
    let (mut engine, log, fail) = recording_engine();
    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });

    fail.store(true, Ordering::SeqCst);
    engine.handle_event(EngineEvent::Tick);

    assert!(engine.clock.is_running());
    assert!(engine.scheduler.is_pending());

    // The next tick advances normally.
    fail.store(false, Ordering::SeqCst);
    let before = log_len(&log);
    engine.handle_event(EngineEvent::Tick);
    assert_eq!(log.lock()[before..].to_vec(), vec!["advance"]);
}

#[test]
fn visibility_false_suspends_and_true_resumes() {
    let (mut engine, _, _) = recording_engine();
    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });
    engine.handle_event(EngineEvent::Tick);

    engine.handle_event(EngineEvent::VisibilityChanged(false));
    assert_eq!(engine.phase(), Phase::Suspended);
    assert!(!engine.clock.is_running());
    assert!(!engine.scheduler.is_pending());

    engine.handle_event(EngineEvent::VisibilityChanged(true));
    assert_eq!(engine.phase(), Phase::Active);
    assert!(engine.clock.is_running());
    assert!(engine.scheduler.is_pending());
}

#[test]
fn visibility_true_before_surface_exists_does_not_tick() {
    let (mut engine, _, _) = recording_engine();

    engine.handle_event(EngineEvent::VisibilityChanged(false));
    assert!(!engine.clock.is_running());

    // The surface has never been created; becoming visible must not start
    // the clock or schedule a paint.
    engine.handle_event(EngineEvent::VisibilityChanged(true));
    assert!(!engine.clock.is_running());
    assert!(!engine.scheduler.is_pending());
}

#[test]
fn pending_paint_is_held_while_hidden() {
    let (mut engine, _, _) = recording_engine();
    let frames = engine.host.probe();

    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });
    engine.handle_event(EngineEvent::VisibilityChanged(false));
    engine.handle_event(EngineEvent::PaintRequested);

    // Hidden: the request stays pending, nothing is painted.
    engine.flush_paint();
    assert_eq!(frames.frame_count(), 0);

    engine.handle_event(EngineEvent::VisibilityChanged(true));
    engine.flush_paint();
    assert_eq!(frames.frame_count(), 1);
}

#[test]
fn preference_change_restarts_clock_with_new_rate() {
    let prefs = Arc::new(MemoryPrefs::new());
    let (pattern, log, _) = RecordingPattern::new();
    let mut engine = WallpaperEngine::new(HeadlessHost::new(64, 32), pattern, prefs.clone());

    prefs.set_int(crate::prefs::keys::RATE, 500);
    prefs.set_int(crate::prefs::keys::BLOCK_SIZE, 20);

    let before = log_len(&log);
    engine.handle_event(EngineEvent::PrefsChanged);

    assert_eq!(engine.tick_interval(), Duration::from_millis(500));
    assert!(engine.clock.is_running());

    let calls = log.lock()[before..].to_vec();
    assert!(calls.contains(&"set_block_size(20)".to_string()));
    assert!(calls.contains(&"set_shape(hexagon)".to_string()));
}

#[test]
fn non_positive_rate_falls_back_to_default() {
    let prefs = Arc::new(MemoryPrefs::new());
    let (pattern, _, _) = RecordingPattern::new();
    let mut engine = WallpaperEngine::new(HeadlessHost::new(64, 32), pattern, prefs.clone());

    prefs.set_int(crate::prefs::keys::RATE, 0);
    engine.handle_event(EngineEvent::PrefsChanged);
    assert_eq!(engine.tick_interval(), DEFAULT_TICK_INTERVAL);

    prefs.set_int(crate::prefs::keys::RATE, -50);
    engine.handle_event(EngineEvent::PrefsChanged);
    assert_eq!(engine.tick_interval(), DEFAULT_TICK_INTERVAL);
}

#[test]
fn out_of_range_alpha_is_clamped() {
    let prefs = Arc::new(MemoryPrefs::new());
    let (pattern, log, _) = RecordingPattern::new();
    let mut engine = WallpaperEngine::new(HeadlessHost::new(64, 32), pattern, prefs.clone());

    prefs.set_int(crate::prefs::keys::FILL_ALPHA, 999);
    prefs.set_int(crate::prefs::keys::STROKE_ALPHA, -1);
    engine.handle_event(EngineEvent::PrefsChanged);

    let calls = log.lock().clone();
    assert!(calls.contains(&"set_fill_alpha(255)".to_string()));
    assert!(calls.contains(&"set_stroke_alpha(0)".to_string()));
}

#[test]
fn destruction_is_terminal_and_rejects_late_events() {
    let (mut engine, log, _) = recording_engine();
    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });

    engine.handle_event(EngineEvent::SurfaceDestroyed);
    assert_eq!(engine.phase(), Phase::Destroyed);
    assert!(!engine.clock.is_running());
    assert!(!engine.scheduler.is_pending());
    assert!(!engine.state().can_paint());

    // Late events are deterministic no-ops.
    let before = log_len(&log);
    engine.handle_event(EngineEvent::Tick);
    engine.handle_event(EngineEvent::SurfaceResized {
        width: 10,
        height: 10,
    });
    engine.handle_event(EngineEvent::PrefsChanged);
    engine.handle_event(EngineEvent::VisibilityChanged(true));
    engine.flush_paint();

    assert_eq!(log_len(&log), before);
    assert_eq!(engine.phase(), Phase::Destroyed);
    assert!(!engine.clock.is_running());
}

#[test]
fn destruction_unsubscribes_from_preferences() {
    let prefs = Arc::new(MemoryPrefs::new());
    let (pattern, log, _) = RecordingPattern::new();
    let mut engine = WallpaperEngine::new(HeadlessHost::new(64, 32), pattern, prefs.clone());

    engine.handle_event(EngineEvent::SurfaceDestroyed);
    let before = log_len(&log);

    // With the listener gone this write reaches nobody, and even a directly
    // injected change event is rejected.
    prefs.set_int(crate::prefs::keys::BLOCK_SIZE, 10);
    engine.handle_event(EngineEvent::PrefsChanged);
    assert_eq!(log_len(&log), before);
}

#[test]
fn destroy_with_unavailable_surface_does_not_crash() {
    let (mut engine, _, _) = recording_engine();
    let probe = engine.host.probe();

    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });
    probe.available.store(false, Ordering::SeqCst);

    engine.handle_event(EngineEvent::Tick);
    engine.flush_paint();
    assert_eq!(probe.frame_count(), 0);

    engine.handle_event(EngineEvent::SurfaceDestroyed);
    assert_eq!(engine.phase(), Phase::Destroyed);
}

#[test]
fn paint_resumes_after_transient_unavailability() {
    let (mut engine, _, _) = recording_engine();
    let probe = engine.host.probe();

    engine.handle_event(EngineEvent::SurfaceResized {
        width: 64,
        height: 32,
    });

    probe.available.store(false, Ordering::SeqCst);
    engine.handle_event(EngineEvent::Tick);
    engine.flush_paint();
    assert_eq!(probe.frame_count(), 0);

    // The skipped frame does not poison the next one.
    probe.available.store(true, Ordering::SeqCst);
    engine.handle_event(EngineEvent::Tick);
    engine.flush_paint();
    assert_eq!(probe.frame_count(), 1);
}

#[test]
fn pulse_pattern_drives_real_paints() {
    let host = HeadlessHost::new(32, 32);
    let frames = host.probe();
    let pattern = PulsePattern::new();
    let advances = pattern.probe();

    let mut engine = WallpaperEngine::new(host, pattern, Arc::new(MemoryPrefs::new()));
    engine.handle_event(EngineEvent::SurfaceResized {
        width: 32,
        height: 32,
    });
    engine.handle_event(EngineEvent::Tick);
    engine.flush_paint();

    // Resize forces one advance, the tick another.
    assert_eq!(advances.advance_count(), 2);
    assert_eq!(advances.render_count(), 1);
    assert_eq!(frames.frame_count(), 1);
}
