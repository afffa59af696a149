//! Property maps (shapes)
//!
//! A property map assigns each property name a slot index. Maps are shared
//! by every object allocated from them: when a write in create mode meets an
//! unseen name, the next free index is assigned in the shared map, and every
//! object holding that map observes the new slot.
//!
//! Slot 0 is reserved for the prototype and has no name.

use crate::value::StrRef;
use hashbrown::HashMap;

/// Lookup mode for [`PropertyMap::prop_idx`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Only report existing slots
    Lookup,
    /// Assign the next free slot to unseen names
    Create,
}

#[derive(Debug, Clone)]
pub struct PropertyMap {
    /// Name of each slot, index 0 is the prototype slot
    names: Vec<Option<StrRef>>,
    /// Name to slot index
    index: HashMap<StrRef, u32>,
}

impl PropertyMap {
    /// Index of the prototype slot
    pub const PROTO_SLOT: u32 = 0;

    /// Create a map holding only the prototype slot
    pub fn new() -> Self {
        PropertyMap {
            names: vec![None],
            index: HashMap::new(),
        }
    }

    /// Number of slots defined so far, prototype slot included
    #[inline]
    pub fn num_props(&self) -> u32 {
        self.names.len() as u32
    }

    /// Name stored at a slot index
    #[inline]
    pub fn prop_name(&self, idx: u32) -> Option<StrRef> {
        self.names.get(idx as usize).copied().flatten()
    }

    /// Find the slot index for a name, assigning one in create mode.
    ///
    /// Slot indices are never reused or removed: deleting a property
    /// tombstones its slot in the object but keeps it here.
    pub fn prop_idx(&mut self, name: StrRef, mode: LookupMode) -> Option<u32> {
        if let Some(&idx) = self.index.get(&name) {
            return Some(idx);
        }
        match mode {
            LookupMode::Lookup => None,
            LookupMode::Create => {
                let idx = self.names.len() as u32;
                self.names.push(Some(name));
                self.index.insert(name, idx);
                Some(idx)
            }
        }
    }

    /// Lookup-only variant usable through a shared borrow
    #[inline]
    pub fn find(&self, name: StrRef) -> Option<u32> {
        self.index.get(&name).copied()
    }

    /// Iterate over named slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, StrRef)> + '_ {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.map(|n| (i as u32, n)))
    }
}

impl Default for PropertyMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_map() {
        let map = PropertyMap::new();
        assert_eq!(map.num_props(), 1);
        assert_eq!(map.prop_name(0), None);
        assert_eq!(map.find(StrRef(1)), None);
    }

    #[test]
    fn test_create_assigns_next_slot() {
        let mut map = PropertyMap::new();
        assert_eq!(map.prop_idx(StrRef(10), LookupMode::Create), Some(1));
        assert_eq!(map.prop_idx(StrRef(11), LookupMode::Create), Some(2));
        assert_eq!(map.prop_idx(StrRef(10), LookupMode::Create), Some(1));
        assert_eq!(map.num_props(), 3);
        assert_eq!(map.prop_name(2), Some(StrRef(11)));
    }

    #[test]
    fn test_lookup_never_allocates() {
        let mut map = PropertyMap::new();
        assert_eq!(map.prop_idx(StrRef(5), LookupMode::Lookup), None);
        assert_eq!(map.num_props(), 1);
    }

    #[test]
    fn test_iter_skips_proto_slot() {
        let mut map = PropertyMap::new();
        map.prop_idx(StrRef(7), LookupMode::Create);
        map.prop_idx(StrRef(8), LookupMode::Create);
        let names: Vec<_> = map.iter().collect();
        assert_eq!(names, vec![(1, StrRef(7)), (2, StrRef(8))]);
    }
}
