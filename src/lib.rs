//! # ColorBurst Wallpaper Engine Library
//!
//! A live wallpaper animation engine: it owns the render loop, the
//! animation clock, and the reactive response to preference changes and
//! surface lifecycle events.
//!
//! ## Architecture
//!
//! ColorBurst is built on a modular architecture:
//! - `engine`: Lifecycle coordinator and owning event loop
//! - `clock`: Cancellable periodic frame clock
//! - `paint`: Coalesced paint scheduling with idle fallback repaint
//! - `surface`: Surface acquisition and per-frame paint sessions
//! - `pattern`: The animated pattern interface consumed by the engine
//! - `prefs`: Preference store interface and in-memory implementation
//! - `config`: TOML configuration parsing and sanitization
//! - `demo`: Headless host and demo pattern for the binary and tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use colorburst::demo::{HeadlessHost, PulsePattern};
//! use colorburst::prefs::MemoryPrefs;
//! use colorburst::WallpaperEngine;
//!
//! fn main() -> colorburst::Result<()> {
//!     let prefs = Arc::new(MemoryPrefs::new());
//!     let mut engine =
//!         WallpaperEngine::new(HeadlessHost::new(1920, 1080), PulsePattern::new(), prefs);
//!
//!     let handle = engine.handle();
//!     handle.surface_resized(1920, 1080);
//!     handle.visibility_changed(true);
//!
//!     engine.run()
//! }
//! ```

pub mod clock;
pub mod config;
pub mod demo;
pub mod engine;
pub mod paint;
pub mod pattern;
pub mod prefs;
pub mod surface;

// Re-export main types for easy access
pub use clock::FrameClock;
pub use config::WallpaperConfig;
pub use engine::{AnimationConfig, EngineHandle, EngineState, Phase, WallpaperEngine};
pub use paint::PaintScheduler;
pub use pattern::Pattern;
pub use prefs::{MemoryPrefs, PrefStore};
pub use surface::{PaintSurface, SurfaceError, SurfaceHost};

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for ColorBurst
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
