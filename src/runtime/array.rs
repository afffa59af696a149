//! Array backing tables
//!
//! An array is an object instance whose layout carries a [`TableRef`] and a
//! logical length. Indexed elements live in the table, named properties in
//! the object's slots like any other object. Table capacity may exceed the
//! length; every entry past the length holds undefined.

use crate::config::RuntimeConfig;
use crate::error::{JsError, JsResult};
use crate::gc::Heap;
use crate::runtime::object::{JsObject, Layout};
use crate::value::{MapRef, ObjRef, RawValue, TableRef, Tag, Value};

/// Backing storage: parallel word and tag vectors, one pair per element
#[derive(Debug, Clone)]
pub struct ArrayTable {
    words: Vec<u64>,
    tags: Vec<Tag>,
}

impl ArrayTable {
    /// Table of `capacity` undefined entries
    pub fn with_capacity(capacity: u32) -> Self {
        let undef = RawValue::UNDEFINED;
        ArrayTable {
            words: vec![undef.word; capacity as usize],
            tags: vec![undef.tag; capacity as usize],
        }
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.words.len() as u32
    }

    #[inline]
    pub fn get(&self, idx: u32) -> Option<RawValue> {
        let i = idx as usize;
        Some(RawValue::new(*self.words.get(i)?, *self.tags.get(i)?))
    }

    /// Store an entry. Writes past capacity are ignored.
    #[inline]
    pub fn set(&mut self, idx: u32, raw: RawValue) {
        let i = idx as usize;
        if i < self.words.len() {
            self.words[i] = raw.word;
            self.tags[i] = raw.tag;
        }
    }
}

/// Array-specific part of an object layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayData {
    pub(crate) table: TableRef,
    pub(crate) len: u32,
}

impl ArrayData {
    #[inline]
    pub fn table(&self) -> TableRef {
        self.table
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn invalid_length() -> JsError {
    JsError::range_error("invalid array length")
}

impl Heap {
    /// Allocate an empty array whose table has room for `num_elems` entries
    pub fn new_array(
        &mut self,
        map: MapRef,
        proto: Value,
        num_elems: u32,
        cfg: &RuntimeConfig,
    ) -> ObjRef {
        let table = self.alloc_table(num_elems);
        let cap = self.map(map).num_props().max(cfg.min_object_capacity);
        let layout = Layout::Array(ArrayData { table, len: 0 });
        self.alloc_object(JsObject::new(map, proto, cap, layout))
    }

    /// Array part of a live instance, `None` for non-arrays
    #[inline]
    pub fn array_data(&self, arr: ObjRef) -> Option<ArrayData> {
        match self.object(arr).layout {
            Layout::Array(data) => Some(data),
            _ => None,
        }
    }

    fn array_data_mut(&mut self, arr: ObjRef) -> JsResult<&mut ArrayData> {
        match &mut self.object_mut(arr).layout {
            Layout::Array(data) => Ok(data),
            _ => Err(JsError::Internal("array operation on non-array")),
        }
    }

    /// Logical length, 0 for non-arrays
    #[inline]
    pub fn arr_len(&self, arr: ObjRef) -> u32 {
        self.array_data(arr).map_or(0, |d| d.len)
    }

    /// Capacity of the current backing table
    #[inline]
    pub fn arr_capacity(&self, arr: ObjRef) -> u32 {
        self.array_data(arr)
            .map_or(0, |d| self.table(d.table).capacity())
    }

    /// Element at `idx`, undefined at or past the length
    pub fn get_arr_elem(&self, arr: ObjRef, idx: u32) -> Value {
        let Some(data) = self.array_data(arr) else {
            return Value::Undefined;
        };
        if idx >= data.len {
            return Value::Undefined;
        }
        self.table(data.table)
            .get(idx)
            .and_then(RawValue::to_value)
            .unwrap_or(Value::Undefined)
    }

    /// Write an element, extending table and length as needed
    pub fn set_arr_elem(
        &mut self,
        arr: ObjRef,
        idx: u32,
        val: Value,
        cfg: &RuntimeConfig,
    ) -> JsResult<()> {
        let data = self
            .array_data(arr)
            .ok_or(JsError::Internal("array operation on non-array"))?;

        if idx >= data.len {
            if idx >= cfg.max_array_length {
                return Err(invalid_length());
            }
            let new_len = idx + 1;
            if new_len > self.table(data.table).capacity() {
                self.ext_arr_tbl(arr, data.len, new_len)?;
            }
            self.array_data_mut(arr)?.len = new_len;
        }

        let table = self.array_data_mut(arr)?.table;
        self.table_mut(table).set(idx, val.to_raw());
        Ok(())
    }

    /// Change the length. Shrinking clears dropped entries but keeps the
    /// table capacity; growing pads with undefined.
    pub fn set_arr_len(&mut self, arr: ObjRef, new_len: u32, cfg: &RuntimeConfig) -> JsResult<()> {
        if new_len > cfg.max_array_length {
            return Err(invalid_length());
        }
        let data = self
            .array_data(arr)
            .ok_or(JsError::Internal("array operation on non-array"))?;

        if new_len < data.len {
            let table = self.table_mut(data.table);
            for i in new_len..data.len {
                table.set(i, RawValue::UNDEFINED);
            }
        } else if new_len > self.table(data.table).capacity() {
            self.ext_arr_tbl(arr, data.len, new_len)?;
        }

        self.array_data_mut(arr)?.len = new_len;
        Ok(())
    }

    /// Replace the backing table with one of at least `new_len` entries,
    /// doubling the old capacity when that is larger. Entries `[0, cur_len)`
    /// are copied; the rest read as undefined.
    pub fn ext_arr_tbl(&mut self, arr: ObjRef, cur_len: u32, new_len: u32) -> JsResult<()> {
        let old = self.array_data_mut(arr)?.table;
        let new_cap = self.table(old).capacity().saturating_mul(2).max(new_len);
        let new = self.alloc_table(new_cap);

        let copied = cur_len.min(self.table(old).capacity());
        for i in 0..copied {
            if let Some(raw) = self.table(old).get(i) {
                self.table_mut(new).set(i, raw);
            }
        }

        self.array_data_mut(arr)?.table = new;
        log::trace!(
            "extended array table {:?}: {:?} -> {:?} ({} entries)",
            arr,
            old,
            new,
            new_cap
        );
        Ok(())
    }
}
