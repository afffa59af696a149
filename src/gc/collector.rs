//! Collection requests
//!
//! The object model never frees anything: growth tombstones old instances
//! and table extension abandons old tables. When a collection becomes
//! worthwhile, the runtime hands a [`CollectRequest`] to the [`Collector`]
//! installed in the context. What the collector does with it (tracing,
//! compaction, nothing at all) is its own business; the only contract is
//! that handles held by the runtime stay valid afterwards.

use super::allocator::Heap;

/// Why a collection was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectReason {
    /// The global object grew and left a tombstone behind
    GlobalGrowth,
    /// `shrink_heap` asked for a full collection followed by a resize
    ShrinkHeap,
    /// An allocation crossed the heap threshold
    Threshold,
    /// Embedder asked for it
    Explicit,
}

/// A collection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectRequest {
    pub reason: CollectReason,
    /// Heap size in words to leave behind, if any
    pub target_size: Option<usize>,
}

impl CollectRequest {
    pub fn new(reason: CollectReason) -> Self {
        CollectRequest {
            reason,
            target_size: None,
        }
    }

    pub fn with_target_size(mut self, words: usize) -> Self {
        self.target_size = Some(words);
        self
    }
}

/// Pluggable collector
pub trait Collector {
    fn collect(&mut self, heap: &mut Heap, request: CollectRequest);
}

/// Collector that reclaims nothing.
///
/// Keeps the requests it saw and applies any target size to the heap, so
/// the heap-size controls behave the same as with a real collector.
#[derive(Debug, Default)]
pub struct NullCollector {
    requests: Vec<CollectRequest>,
}

impl NullCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> &[CollectRequest] {
        &self.requests
    }
}

impl Collector for NullCollector {
    fn collect(&mut self, heap: &mut Heap, request: CollectRequest) {
        if let Some(words) = request.target_size {
            heap.set_heap_size(words);
        }
        self.requests.push(request);
    }
}

/// Counters for requests issued through a context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    pub requests: usize,
    pub global_growths: usize,
    pub threshold_crossings: usize,
    pub shrinks: usize,
}

impl GcStats {
    pub(crate) fn record(&mut self, reason: CollectReason) {
        self.requests += 1;
        match reason {
            CollectReason::GlobalGrowth => self.global_growths += 1,
            CollectReason::Threshold => self.threshold_crossings += 1,
            CollectReason::ShrinkHeap => self.shrinks += 1,
            CollectReason::Explicit => {}
        }
    }
}
