//! Arena heap
//!
//! Every GC-managed allocation lives in a typed arena and is addressed by a
//! small handle:
//! ```text
//! objects  [HeapObject]   <- ObjRef   (plain objects, arrays, closures)
//! maps     [PropertyMap]  <- MapRef   (shared shapes)
//! tables   [ArrayTable]   <- TableRef (array backing tables)
//! cells    [RawValue]     <- CellRef  (closure cells)
//! strings  StringTable    <- StrRef   (interned)
//! ```
//!
//! Nothing is freed here. Growth leaves the old instance behind as a
//! forwarding entry; reclaiming it is the collector's job. The heap only
//! accounts words and tells the caller when the collection threshold has
//! been crossed.

use crate::runtime::array::ArrayTable;
use crate::runtime::object::{HeapObject, JsObject};
use crate::runtime::property::PropertyMap;
use crate::runtime::string::StringTable;
use crate::value::{CellRef, MapRef, ObjRef, RawValue, StrRef, TableRef};

/// Allocation kinds, used for accounting
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTag {
    Object = 0,
    Map = 1,
    ArrayTable = 2,
    Cell = 3,
    String = 4,
}

impl MemoryTag {
    pub const COUNT: usize = 5;
}

/// Header words charged for every object instance
pub const OBJECT_HEADER_WORDS: usize = 4;

/// Heap occupancy snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Object instances, forwarding entries included
    pub objects: usize,
    /// Instances that were tombstoned by growth
    pub forwarded: usize,
    pub maps: usize,
    pub tables: usize,
    pub cells: usize,
    pub strings: usize,
    /// Words charged so far
    pub used_words: usize,
    /// Current heap size in words
    pub size_words: usize,
    /// Words charged per [`MemoryTag`]
    pub words_by_tag: [usize; MemoryTag::COUNT],
}

pub struct Heap {
    objects: Vec<HeapObject>,
    maps: Vec<PropertyMap>,
    tables: Vec<ArrayTable>,
    cells: Vec<RawValue>,
    strings: StringTable,

    used_words: usize,
    size_words: usize,
    words_by_tag: [usize; MemoryTag::COUNT],

    /// Set when an allocation crosses `size_words`
    gc_pending: bool,
}

impl Heap {
    /// Create an empty heap that asks for collection after `size_words`
    pub fn new(size_words: usize) -> Self {
        Heap {
            objects: Vec::new(),
            maps: Vec::new(),
            tables: Vec::new(),
            cells: Vec::new(),
            strings: StringTable::new(),
            used_words: 0,
            size_words,
            words_by_tag: [0; MemoryTag::COUNT],
            gc_pending: false,
        }
    }

    fn charge(&mut self, tag: MemoryTag, words: usize) {
        self.used_words += words;
        self.words_by_tag[tag as usize] += words;
        if self.used_words > self.size_words && !self.gc_pending {
            log::debug!(
                "heap threshold crossed: {} of {} words used",
                self.used_words,
                self.size_words
            );
            self.gc_pending = true;
        }
    }

    // Collector controls

    /// Heap size in words
    #[inline]
    pub fn heap_size(&self) -> usize {
        self.size_words
    }

    /// Words left before the collection threshold
    #[inline]
    pub fn heap_free(&self) -> usize {
        self.size_words.saturating_sub(self.used_words)
    }

    #[inline]
    pub fn used_words(&self) -> usize {
        self.used_words
    }

    /// Resize the heap, never below what is in use
    pub fn set_heap_size(&mut self, words: usize) {
        self.size_words = words.max(self.used_words);
    }

    /// Credit words back after a collector reclaimed them
    pub fn release_words(&mut self, words: usize) {
        self.used_words = self.used_words.saturating_sub(words);
    }

    /// Take the pending-collection flag
    #[inline]
    pub fn take_gc_pending(&mut self) -> bool {
        std::mem::take(&mut self.gc_pending)
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            objects: self.objects.len(),
            forwarded: self
                .objects
                .iter()
                .filter(|o| matches!(o, HeapObject::Forwarded(_)))
                .count(),
            maps: self.maps.len(),
            tables: self.tables.len(),
            cells: self.cells.len(),
            strings: self.strings.count(),
            used_words: self.used_words,
            size_words: self.size_words,
            words_by_tag: self.words_by_tag,
        }
    }

    // Objects

    /// Add a new object instance
    pub fn alloc_object(&mut self, obj: JsObject) -> ObjRef {
        self.charge(MemoryTag::Object, OBJECT_HEADER_WORDS + obj.capacity() as usize);
        let r = ObjRef(self.objects.len() as u32);
        self.objects.push(HeapObject::Live(obj));
        r
    }

    /// Follow the forwarding chain to the live instance
    #[inline]
    pub fn resolve(&self, mut r: ObjRef) -> ObjRef {
        loop {
            match &self.objects[r.0 as usize] {
                HeapObject::Live(_) => return r,
                HeapObject::Forwarded(next) => r = *next,
            }
        }
    }

    /// Forwarding reference of an instance, if it was tombstoned
    #[inline]
    pub fn next(&self, r: ObjRef) -> Option<ObjRef> {
        match &self.objects[r.0 as usize] {
            HeapObject::Live(_) => None,
            HeapObject::Forwarded(next) => Some(*next),
        }
    }

    /// Tombstone `old`, redirecting every access to `new`
    pub(crate) fn set_next(&mut self, old: ObjRef, new: ObjRef) {
        self.objects[old.0 as usize] = HeapObject::Forwarded(new);
    }

    /// Live instance behind a handle
    #[inline]
    pub fn object(&self, r: ObjRef) -> &JsObject {
        let mut r = r;
        loop {
            match &self.objects[r.0 as usize] {
                HeapObject::Live(obj) => return obj,
                HeapObject::Forwarded(next) => r = *next,
            }
        }
    }

    /// Mutable live instance behind a handle
    #[inline]
    pub fn object_mut(&mut self, r: ObjRef) -> &mut JsObject {
        let root = self.resolve(r);
        match &mut self.objects[root.0 as usize] {
            HeapObject::Live(obj) => obj,
            HeapObject::Forwarded(_) => unreachable!("resolve stops at a live instance"),
        }
    }

    // Maps

    pub fn alloc_map(&mut self) -> MapRef {
        self.charge(MemoryTag::Map, 2);
        let r = MapRef(self.maps.len() as u32);
        self.maps.push(PropertyMap::new());
        r
    }

    #[inline]
    pub fn map(&self, r: MapRef) -> &PropertyMap {
        &self.maps[r.0 as usize]
    }

    #[inline]
    pub fn map_mut(&mut self, r: MapRef) -> &mut PropertyMap {
        &mut self.maps[r.0 as usize]
    }

    // Array tables

    /// Allocate a backing table with every entry set to undefined
    pub fn alloc_table(&mut self, capacity: u32) -> TableRef {
        self.charge(MemoryTag::ArrayTable, 1 + 2 * capacity as usize);
        let r = TableRef(self.tables.len() as u32);
        self.tables.push(ArrayTable::with_capacity(capacity));
        r
    }

    #[inline]
    pub fn table(&self, r: TableRef) -> &ArrayTable {
        &self.tables[r.0 as usize]
    }

    #[inline]
    pub fn table_mut(&mut self, r: TableRef) -> &mut ArrayTable {
        &mut self.tables[r.0 as usize]
    }

    // Cells

    /// Allocate a cell holding undefined
    pub fn alloc_cell(&mut self) -> CellRef {
        self.charge(MemoryTag::Cell, 2);
        let r = CellRef(self.cells.len() as u32);
        self.cells.push(RawValue::UNDEFINED);
        r
    }

    #[inline]
    pub fn cell(&self, r: CellRef) -> RawValue {
        self.cells[r.0 as usize]
    }

    #[inline]
    pub fn set_cell(&mut self, r: CellRef, raw: RawValue) {
        self.cells[r.0 as usize] = raw;
    }

    // Strings

    /// Find or add a string in the string table
    pub fn intern(&mut self, s: &str) -> StrRef {
        let before = self.strings.count();
        let r = self.strings.intern(s);
        if self.strings.count() != before {
            self.charge(MemoryTag::String, 1 + s.len().div_ceil(8));
        }
        r
    }

    #[inline]
    pub fn str(&self, r: StrRef) -> &str {
        self.strings.get(r)
    }

    #[inline]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }
}
