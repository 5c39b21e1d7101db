//! Configuration management for ColorBurst
//!
//! This module handles loading, parsing, and sanitizing configuration from
//! TOML files. The loaded configuration seeds the preference store that the
//! engine actually reads from; defaults here match the documented preference
//! defaults exactly.

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::prefs::defaults;

/// Main configuration struct containing all ColorBurst settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct WallpaperConfig {
    /// Animation pacing
    pub animation: AnimationRateConfig,

    /// Animated grid geometry
    pub grid: GridConfig,

    /// Cell styling
    pub style: StyleConfig,
}

/// Animation pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationRateConfig {
    /// Milliseconds between animation ticks
    pub rate_ms: u32,
}

/// Grid geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Cell size (pixels)
    pub block_size: i32,

    /// Spacing between cells (pixels)
    pub padding: i32,

    /// Minimum brightness below which a cell is skipped
    pub threshold: i32,

    /// Per-tick brightness decay step
    pub decay_step: i32,
}

/// Cell styling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    /// Hue family to draw from ("Blue", "Red", ...)
    pub color_range: String,

    /// Cell shape ("hexagon", "square", "circle")
    pub shape: String,

    /// Outline width (pixels)
    pub stroke_width: i32,

    /// Fill opacity (0-255)
    pub fill_alpha: u8,

    /// Outline opacity (0-255)
    pub stroke_alpha: u8,
}

impl Default for AnimationRateConfig {
    fn default() -> Self {
        Self {
            rate_ms: defaults::RATE_MS as u32,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            block_size: defaults::BLOCK_SIZE,
            padding: defaults::PADDING,
            threshold: defaults::THRESHOLD,
            decay_step: defaults::DECAY_STEP,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            color_range: defaults::COLOR_RANGE.to_string(),
            shape: defaults::SHAPE.to_string(),
            stroke_width: defaults::STROKE_WIDTH,
            fill_alpha: defaults::FILL_ALPHA as u8,
            stroke_alpha: defaults::STROKE_ALPHA as u8,
        }
    }
}

impl WallpaperConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let mut config: WallpaperConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.sanitize();

        Ok(config)
    }

    /// Correct invalid values to documented defaults. A broken wallpaper
    /// configuration degrades to the stock look instead of failing.
    pub fn sanitize(&mut self) {
        if self.animation.rate_ms == 0 {
            warn!(
                "⚙️ Invalid rate_ms=0, falling back to {}ms",
                defaults::RATE_MS
            );
            self.animation.rate_ms = defaults::RATE_MS as u32;
        }

        if self.grid.block_size <= 0 {
            warn!(
                "⚙️ Invalid block_size={}, falling back to {}",
                self.grid.block_size,
                defaults::BLOCK_SIZE
            );
            self.grid.block_size = defaults::BLOCK_SIZE;
        }

        if self.grid.padding < 0 {
            warn!("⚙️ Negative padding, falling back to {}", defaults::PADDING);
            self.grid.padding = defaults::PADDING;
        }

        if self.grid.threshold < 0 {
            warn!(
                "⚙️ Negative threshold, falling back to {}",
                defaults::THRESHOLD
            );
            self.grid.threshold = defaults::THRESHOLD;
        }

        if self.grid.decay_step <= 0 {
            warn!(
                "⚙️ Invalid decay_step, falling back to {}",
                defaults::DECAY_STEP
            );
            self.grid.decay_step = defaults::DECAY_STEP;
        }

        if self.style.stroke_width < 0 {
            warn!(
                "⚙️ Negative stroke_width, falling back to {}",
                defaults::STROKE_WIDTH
            );
            self.style.stroke_width = defaults::STROKE_WIDTH;
        }
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}
