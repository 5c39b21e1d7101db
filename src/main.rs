//! # ColorBurst - Live Wallpaper Engine
//!
//! Runs the wallpaper engine against a headless in-memory surface: a demo
//! and soak harness for the scheduling core. A platform shell would replace
//! the headless host with a real drawable surface and feed the same
//! lifecycle events.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use colorburst::config::WallpaperConfig;
use colorburst::demo::{HeadlessHost, PulsePattern};
use colorburst::prefs::MemoryPrefs;
use colorburst::WallpaperEngine;

#[derive(Parser)]
#[command(name = "colorburst")]
#[command(about = "A live wallpaper animation engine with a headless demo host")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/colorburst/colorburst.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Surface width in pixels
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Surface height in pixels
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Run for this many seconds, then shut down (0 = until Ctrl+C)
    #[arg(long, default_value_t = 0)]
    duration: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting ColorBurst wallpaper engine");
    info!(
        "📄 Version: {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_DATE")
    );

    // Load configuration
    let config = match WallpaperConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            info!("📝 Using default configuration");
            WallpaperConfig::default()
        }
    };

    let prefs = Arc::new(MemoryPrefs::from_config(&config));

    let host = HeadlessHost::new(cli.width, cli.height);
    let frames = host.probe();
    let pattern = PulsePattern::new();
    let ticks = pattern.probe();

    let mut engine = WallpaperEngine::new(host, pattern, prefs);
    let handle = engine.handle();

    // Simulate the host surface coming up.
    handle.surface_resized(cli.width, cli.height);
    handle.visibility_changed(true);

    // Graceful shutdown: Ctrl+C tears the surface down like a real host.
    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        info!("📨 Received Ctrl+C, shutting down gracefully");
        ctrlc_handle.surface_destroyed();
    })?;

    if cli.duration > 0 {
        let timed_handle = handle.clone();
        let duration = Duration::from_secs(cli.duration);
        thread::spawn(move || {
            thread::sleep(duration);
            info!("⏲️ Demo duration elapsed, shutting down");
            timed_handle.surface_destroyed();
        });
    }

    engine.run()?;

    info!(
        "✅ Engine finished: {} advances, {} frames painted",
        ticks.advance_count(),
        frames.frame_count()
    );
    Ok(())
}
