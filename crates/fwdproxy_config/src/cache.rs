use serde::Deserialize;

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Number of preallocated slots (N).
    pub slots: usize,
    /// Responses of this size or larger are relayed but never stored.
    pub max_object_bytes: usize,
    /// Aggregate budget; only checked by validation.
    pub max_cache_bytes: usize,
    /// Request targets longer than this are never used as keys.
    pub max_key_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slots: 10,
            max_object_bytes: 102_400,
            max_cache_bytes: 1_049_000,
            max_key_bytes: 8192,
        }
    }
}

impl CacheConfig {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn max_object_bytes(&self) -> usize {
        self.max_object_bytes
    }

    pub fn max_cache_bytes(&self) -> usize {
        self.max_cache_bytes
    }

    pub fn max_key_bytes(&self) -> usize {
        self.max_key_bytes
    }

    pub(crate) fn apply_defaults_from(&mut self, defaults: &CacheConfig) {
        if self.slots == 0 {
            self.slots = defaults.slots;
        }
        if self.max_object_bytes == 0 {
            self.max_object_bytes = defaults.max_object_bytes;
        }
        if self.max_cache_bytes == 0 {
            self.max_cache_bytes = defaults.max_cache_bytes;
        }
        if self.max_key_bytes == 0 {
            self.max_key_bytes = defaults.max_key_bytes;
        }
    }
}
