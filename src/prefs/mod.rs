//! Preference store interface and in-memory implementation
//!
//! Durable state lives entirely on the other side of [`PrefStore`]: the
//! engine only ever reads typed values with documented defaults and listens
//! for change notifications. The subscription is scoped to the engine's
//! lifetime, taken at construction and released at destruction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::config::WallpaperConfig;

/// Recognized preference keys.
pub mod keys {
    pub const RATE: &str = "pref_rate";
    pub const BLOCK_SIZE: &str = "pref_block_size";
    pub const COLOR_RANGE: &str = "color_preference";
    pub const DECAY: &str = "pref_decay";
    pub const STROKE_WIDTH: &str = "pref_stroke_width";
    pub const THRESHOLD: &str = "pref_threshold";
    pub const PADDING: &str = "pref_padding";
    pub const SHAPE: &str = "pref_shape";
    pub const FILL_ALPHA: &str = "pref_fill_alpha";
    pub const STROKE_ALPHA: &str = "pref_stroke_alpha";
}

/// Documented defaults, used both by the engine's reads and by the TOML
/// configuration layer.
pub mod defaults {
    pub const RATE_MS: i32 = 100;
    pub const BLOCK_SIZE: i32 = 50;
    pub const COLOR_RANGE: &str = "Blue";
    pub const DECAY_STEP: i32 = 8;
    pub const STROKE_WIDTH: i32 = 2;
    pub const THRESHOLD: i32 = 0;
    pub const PADDING: i32 = 4;
    pub const SHAPE: &str = "hexagon";
    pub const FILL_ALPHA: i32 = 64;
    pub const STROKE_ALPHA: i32 = 128;
}

/// Change-notification callback. Invoked after any value changes; listeners
/// are expected to marshal work elsewhere rather than read values inline.
pub type PrefListener = Arc<dyn Fn() + Send + Sync>;

/// Token identifying one subscription, released via [`PrefStore::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Key-value change-notification source with typed reads.
pub trait PrefStore: Send + Sync {
    /// Read an integer preference, falling back to `default` when the key
    /// is missing or holds a non-integer value.
    fn get_int(&self, key: &str, default: i32) -> i32;

    /// Read a string preference with the same fallback rules.
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Register a change listener. The listener fires on every subsequent
    /// value change until unsubscribed.
    fn subscribe(&self, listener: PrefListener) -> SubscriptionId;

    /// Remove a previously registered listener. Unknown ids are a no-op.
    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Debug, Clone, PartialEq)]
enum PrefValue {
    Int(i32),
    Str(String),
}

/// Thread-safe in-memory preference store with change notification.
///
/// Used by the demo binary (seeded from the TOML config) and by the test
/// suite; a production host would put its own store behind [`PrefStore`].
#[derive(Default)]
pub struct MemoryPrefs {
    values: RwLock<HashMap<String, PrefValue>>,
    listeners: Mutex<HashMap<u64, PrefListener>>,
    next_id: AtomicU64,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with every recognized key from a loaded configuration.
    pub fn from_config(config: &WallpaperConfig) -> Self {
        let prefs = Self::new();
        prefs.set_int(keys::RATE, config.animation.rate_ms as i32);
        prefs.set_int(keys::BLOCK_SIZE, config.grid.block_size);
        prefs.set_string(keys::COLOR_RANGE, &config.style.color_range);
        prefs.set_int(keys::DECAY, config.grid.decay_step);
        prefs.set_int(keys::STROKE_WIDTH, config.style.stroke_width);
        prefs.set_int(keys::THRESHOLD, config.grid.threshold);
        prefs.set_int(keys::PADDING, config.grid.padding);
        prefs.set_string(keys::SHAPE, &config.style.shape);
        prefs.set_int(keys::FILL_ALPHA, config.style.fill_alpha as i32);
        prefs.set_int(keys::STROKE_ALPHA, config.style.stroke_alpha as i32);
        prefs
    }

    /// Store an integer value and notify listeners.
    pub fn set_int(&self, key: &str, value: i32) {
        self.values
            .write()
            .insert(key.to_string(), PrefValue::Int(value));
        self.notify();
    }

    /// Store a string value and notify listeners.
    pub fn set_string(&self, key: &str, value: &str) {
        self.values
            .write()
            .insert(key.to_string(), PrefValue::Str(value.to_string()));
        self.notify();
    }

    fn notify(&self) {
        // Snapshot under the lock, invoke outside it: a listener is free to
        // call back into the store.
        let listeners: Vec<PrefListener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl PrefStore for MemoryPrefs {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.read().get(key) {
            Some(PrefValue::Int(value)) => *value,
            _ => default,
        }
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.read().get(key) {
            Some(PrefValue::Str(value)) => value.clone(),
            _ => default.to_string(),
        }
    }

    fn subscribe(&self, listener: PrefListener) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, listener);
        debug!("🔔 Preference listener {} registered", id);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.listeners.lock().remove(&id.0).is_some() {
            debug!("🔔 Preference listener {} removed", id.0);
        }
    }
}
