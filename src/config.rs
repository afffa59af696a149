//! Runtime configuration
//!
//! Sizing and growth knobs for the object model. Everything here has a
//! default matching the behaviour compiled code expects; overrides are
//! mainly for tests and embedders with tight memory.

/// Largest array length accepted by default (2^30 - 1)
pub const MAX_ARRAY_LENGTH: u32 = (1 << 30) - 1;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Slots given to a fresh object whose map has no properties yet.
    /// Slot 0 always holds the prototype, so this is at least 1.
    pub min_object_capacity: u32,

    /// Below this slot index an object grows to exactly `index + 1` slots;
    /// at or above it the new capacity is `2 * index`.
    pub linear_growth_limit: u32,

    /// Backing-table capacity for arrays created without an element count
    pub initial_array_capacity: u32,

    /// Heap words after which allocations ask the collector to run
    pub gc_threshold_words: usize,

    /// Largest array length accepted by element and length writes
    pub max_array_length: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            min_object_capacity: 1,
            linear_growth_limit: 32,
            initial_array_capacity: 0,
            gc_threshold_words: 1 << 20,
            max_array_length: MAX_ARRAY_LENGTH,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linear_growth_limit(mut self, limit: u32) -> Self {
        self.linear_growth_limit = limit;
        self
    }

    pub fn with_initial_array_capacity(mut self, cap: u32) -> Self {
        self.initial_array_capacity = cap;
        self
    }

    pub fn with_gc_threshold_words(mut self, words: usize) -> Self {
        self.gc_threshold_words = words;
        self
    }

    pub fn with_max_array_length(mut self, len: u32) -> Self {
        self.max_array_length = len.min(MAX_ARRAY_LENGTH);
        self
    }

    /// Capacity an object must grow to so that `index` becomes addressable
    #[inline]
    pub fn grown_capacity(&self, index: u32) -> u32 {
        if index < self.linear_growth_limit {
            index + 1
        } else {
            index.saturating_mul(2)
        }
    }
}
