//! Heap and collection interface
//!
//! The heap is a set of typed arenas addressed by handles. Collection is
//! delegated to a [`Collector`] supplied by the embedder; the runtime only
//! decides when to ask.

mod allocator;
mod collector;

pub use allocator::{Heap, HeapStats, MemoryTag, OBJECT_HEADER_WORDS};
pub use collector::{CollectReason, CollectRequest, Collector, GcStats, NullCollector};
