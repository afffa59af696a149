//! Object representation and own-property operations
//!
//! An object instance is a fixed-size slot vector plus a reference to its
//! property map. Slot 0 holds the prototype. When a write needs a slot
//! beyond the instance's capacity, a larger instance is allocated, the
//! slots are copied over and the old instance becomes a forwarding entry:
//!
//! ```text
//! ObjRef(3) --Forwarded--> ObjRef(8) --Forwarded--> ObjRef(15) (Live)
//! ```
//!
//! Handles captured before growth stay valid; every accessor resolves the
//! chain before touching slots.

use crate::config::RuntimeConfig;
use crate::gc::Heap;
use crate::runtime::array::ArrayData;
use crate::runtime::function::ClosureData;
use crate::runtime::property::{LookupMode, PropertyMap};
use crate::value::{MapRef, ObjRef, RawValue, StrRef, Value};

/// Declared layout of an object instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Plain,
    Closure,
    Array,
}

/// Layout-specific data carried next to the slots
#[derive(Debug, Clone)]
pub enum Layout {
    Plain,
    Closure(ClosureData),
    Array(ArrayData),
}

impl Layout {
    #[inline]
    pub fn kind(&self) -> LayoutKind {
        match self {
            Layout::Plain => LayoutKind::Plain,
            Layout::Closure(_) => LayoutKind::Closure,
            Layout::Array(_) => LayoutKind::Array,
        }
    }
}

/// Arena entry for an object instance
#[derive(Debug)]
pub enum HeapObject {
    Live(JsObject),
    /// Tombstone left behind by growth
    Forwarded(ObjRef),
}

/// A live object instance
#[derive(Debug, Clone)]
pub struct JsObject {
    pub(crate) map: MapRef,
    pub(crate) slots: Vec<RawValue>,
    pub(crate) layout: Layout,
}

impl JsObject {
    /// Create an instance with `capacity` slots and `proto` in slot 0.
    /// Every other slot starts out missing.
    pub fn new(map: MapRef, proto: Value, capacity: u32, layout: Layout) -> Self {
        let mut slots = vec![RawValue::MISSING; capacity.max(1) as usize];
        slots[PropertyMap::PROTO_SLOT as usize] = proto.to_raw();
        JsObject { map, slots, layout }
    }

    #[inline]
    pub fn map(&self) -> MapRef {
        self.map
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn kind(&self) -> LayoutKind {
        self.layout.kind()
    }

    /// Raw slot contents, `None` past capacity
    #[inline]
    pub fn slot(&self, idx: u32) -> Option<RawValue> {
        self.slots.get(idx as usize).copied()
    }

    /// Value of a slot, `None` past capacity or when the slot is missing
    #[inline]
    pub fn slot_value(&self, idx: u32) -> Option<Value> {
        self.slot(idx).and_then(RawValue::to_value)
    }
}

/// Result of a write that had to grow the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    /// Instance that was tombstoned
    pub from: ObjRef,
    /// Replacement instance
    pub to: ObjRef,
    pub capacity: u32,
}

impl Heap {
    /// Allocate an instance sized from the map's current slot count
    pub fn new_object_with_layout(
        &mut self,
        map: MapRef,
        proto: Value,
        layout: Layout,
        cfg: &RuntimeConfig,
    ) -> ObjRef {
        let cap = self.map(map).num_props().max(cfg.min_object_capacity);
        self.alloc_object(JsObject::new(map, proto, cap, layout))
    }

    /// Allocate a plain object
    pub fn new_object(&mut self, map: MapRef, proto: Value, cfg: &RuntimeConfig) -> ObjRef {
        self.new_object_with_layout(map, proto, Layout::Plain, cfg)
    }

    #[inline]
    pub fn layout_kind(&self, obj: ObjRef) -> LayoutKind {
        self.object(obj).kind()
    }

    #[inline]
    pub fn capacity(&self, obj: ObjRef) -> u32 {
        self.object(obj).capacity()
    }

    /// Current property map of the live instance
    #[inline]
    pub fn obj_map(&self, obj: ObjRef) -> MapRef {
        self.object(obj).map
    }

    /// Prototype stored in slot 0
    #[inline]
    pub fn get_proto(&self, obj: ObjRef) -> Value {
        self.object(obj)
            .slot_value(PropertyMap::PROTO_SLOT)
            .unwrap_or(Value::Null)
    }

    #[inline]
    pub fn set_proto(&mut self, obj: ObjRef, proto: Value) {
        self.object_mut(obj).slots[PropertyMap::PROTO_SLOT as usize] = proto.to_raw();
    }

    /// Own property value, `None` when unmapped, out of range or deleted
    pub fn own_prop(&self, obj: ObjRef, name: StrRef) -> Option<Value> {
        let obj = self.object(obj);
        let idx = self.map(obj.map).find(name)?;
        obj.slot_value(idx)
    }

    /// Read a named property, walking the prototype chain.
    ///
    /// Yields undefined once the chain ends at a non-object prototype.
    pub fn obj_get_prop(&self, obj: ObjRef, name: StrRef) -> Value {
        let mut cur = obj;
        loop {
            if let Some(v) = self.own_prop(cur, name) {
                return v;
            }
            match self.get_proto(cur).as_obj() {
                Some(proto) => cur = proto,
                None => return Value::Undefined,
            }
        }
    }

    /// Check for an own, non-deleted property
    #[inline]
    pub fn obj_has_prop(&self, obj: ObjRef, name: StrRef) -> bool {
        self.own_prop(obj, name).is_some()
    }

    /// Write a named property on the live instance, growing it when the
    /// map assigns a slot past its capacity.
    pub fn obj_set_prop(
        &mut self,
        obj: ObjRef,
        name: StrRef,
        val: Value,
        cfg: &RuntimeConfig,
    ) -> Option<Growth> {
        let mut target = self.resolve(obj);
        let map = self.object(target).map;
        let idx = self
            .map_mut(map)
            .prop_idx(name, LookupMode::Create)
            .unwrap_or_else(|| unreachable!("create mode always assigns a slot"));

        let mut growth = None;
        if idx >= self.capacity(target) {
            let grown = self.grow_object(target, cfg.grown_capacity(idx));
            target = grown.to;
            growth = Some(grown);
        }

        self.object_mut(target).slots[idx as usize] = val.to_raw();
        growth
    }

    /// Replace a live instance with a larger copy and tombstone it.
    ///
    /// Closure cells and array length/table travel with the copy; the old
    /// instance is left for the collector.
    fn grow_object(&mut self, old: ObjRef, new_cap: u32) -> Growth {
        let src = self.object(old);
        let mut slots = Vec::with_capacity(new_cap as usize);
        slots.extend_from_slice(&src.slots);
        slots.resize(new_cap as usize, RawValue::MISSING);
        let copy = JsObject {
            map: src.map,
            slots,
            layout: src.layout.clone(),
        };

        let new = self.alloc_object(copy);
        self.set_next(old, new);
        log::trace!(
            "grew object {:?} -> {:?} ({} slots)",
            old,
            new,
            new_cap
        );
        Growth {
            from: old,
            to: new,
            capacity: new_cap,
        }
    }

    /// Tombstone a named property. The map keeps its slot index.
    pub fn obj_del_prop(&mut self, obj: ObjRef, name: StrRef) -> bool {
        let target = self.resolve(obj);
        let map = self.object(target).map;
        let Some(idx) = self.map_mut(map).prop_idx(name, LookupMode::Lookup) else {
            return true;
        };
        if let Some(slot) = self.object_mut(target).slots.get_mut(idx as usize) {
            *slot = RawValue::MISSING;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Heap, RuntimeConfig) {
        (Heap::new(1 << 16), RuntimeConfig::default())
    }

    #[test]
    fn test_new_object_has_proto() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let proto = heap.new_object(map, Value::Null, &cfg);
        let obj = heap.new_object(map, Value::Object(proto), &cfg);
        assert_eq!(heap.get_proto(obj), Value::Object(proto));
        assert_eq!(heap.get_proto(proto), Value::Null);
        assert_eq!(heap.layout_kind(obj), LayoutKind::Plain);
    }

    #[test]
    fn test_set_then_get() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let obj = heap.new_object(map, Value::Null, &cfg);
        let x = heap.intern("x");
        heap.obj_set_prop(obj, x, Value::Int(5), &cfg);
        assert_eq!(heap.obj_get_prop(obj, x), Value::Int(5));
        assert!(heap.obj_has_prop(obj, x));
    }

    #[test]
    fn test_get_walks_prototype() {
        let (mut heap, cfg) = setup();
        let m1 = heap.alloc_map();
        let m2 = heap.alloc_map();
        let base = heap.new_object(m1, Value::Null, &cfg);
        let derived = heap.new_object(m2, Value::Object(base), &cfg);
        let k = heap.intern("k");
        heap.obj_set_prop(base, k, Value::Bool(true), &cfg);
        assert_eq!(heap.obj_get_prop(derived, k), Value::Bool(true));
        assert!(!heap.obj_has_prop(derived, k));
        let other = heap.intern("other");
        assert_eq!(heap.obj_get_prop(derived, other), Value::Undefined);
    }

    #[test]
    fn test_growth_tombstones_old_instance() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let obj = heap.new_object(map, Value::Null, &cfg);
        let a = heap.intern("a");
        let growth = heap.obj_set_prop(obj, a, Value::Int(1), &cfg).unwrap();
        assert_eq!(growth.from, obj);
        assert_eq!(growth.capacity, 2);
        assert_eq!(heap.next(obj), Some(growth.to));
        assert_eq!(heap.resolve(obj), growth.to);
        assert_eq!(heap.obj_get_prop(obj, a), Value::Int(1));
    }

    #[test]
    fn test_growth_doubles_past_linear_limit() {
        let (mut heap, _) = setup();
        let cfg = RuntimeConfig::default().with_linear_growth_limit(2);
        let map = heap.alloc_map();
        let obj = heap.new_object(map, Value::Null, &cfg);
        let names: Vec<_> = (0..4).map(|i| heap.intern(&format!("p{i}"))).collect();
        for (i, &n) in names.iter().enumerate() {
            heap.obj_set_prop(obj, n, Value::Int(i as i32), &cfg);
        }
        // 1 -> 2 linearly, then 2 * 2 for slot 2 and 2 * 4 for slot 4
        assert_eq!(heap.capacity(obj), 8);
        for (i, &n) in names.iter().enumerate() {
            assert_eq!(heap.obj_get_prop(obj, n), Value::Int(i as i32));
        }
    }

    #[test]
    fn test_shared_map_slot_visible_to_smaller_instance() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let a = heap.new_object(map, Value::Null, &cfg);
        let b = heap.new_object(map, Value::Null, &cfg);
        let x = heap.intern("x");
        heap.obj_set_prop(a, x, Value::Int(1), &cfg);
        // b shares the map but has no room for the slot yet
        assert_eq!(heap.map(map).find(x), Some(1));
        assert_eq!(heap.obj_get_prop(b, x), Value::Undefined);
        heap.obj_set_prop(b, x, Value::Int(2), &cfg);
        assert_eq!(heap.obj_get_prop(a, x), Value::Int(1));
        assert_eq!(heap.obj_get_prop(b, x), Value::Int(2));
    }

    #[test]
    fn test_delete_keeps_slot_index() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let obj = heap.new_object(map, Value::Null, &cfg);
        let k = heap.intern("k");
        heap.obj_set_prop(obj, k, Value::Int(1), &cfg);
        let idx = heap.map(map).find(k);
        assert!(heap.obj_del_prop(obj, k));
        assert!(!heap.obj_has_prop(obj, k));
        assert_eq!(heap.map(map).find(k), idx);
        heap.obj_set_prop(obj, k, Value::Int(2), &cfg);
        assert_eq!(heap.map(map).find(k), idx);
        assert_eq!(heap.map(map).num_props(), 2);
    }

    #[test]
    fn test_undefined_value_is_still_present() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let obj = heap.new_object(map, Value::Null, &cfg);
        let k = heap.intern("k");
        heap.obj_set_prop(obj, k, Value::Undefined, &cfg);
        assert!(heap.obj_has_prop(obj, k));
    }

    #[test]
    fn test_delete_unmapped_is_noop() {
        let (mut heap, cfg) = setup();
        let map = heap.alloc_map();
        let obj = heap.new_object(map, Value::Null, &cfg);
        let k = heap.intern("k");
        assert!(heap.obj_del_prop(obj, k));
        assert_eq!(heap.map(map).num_props(), 1);
    }
}
