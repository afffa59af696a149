//! Generic property access
//!
//! Property reads and writes on arbitrary bases. Objects and closures use
//! their own slots; arrays route integer-shaped keys to the backing table;
//! strings, numbers and booleans read through their well-known prototype.
//!
//! Keys that are not strings are converted with `to_string` before they
//! reach a property map.

use crate::context::Context;
use crate::error::{JsError, JsResult};
use crate::runtime::string::{code_unit_at, str_to_int, utf16_len};
use crate::value::{ObjRef, RawValue, StrRef, Value};

impl Context {
    /// Property-map key for an arbitrary value
    fn prop_key(&mut self, prop: Value) -> JsResult<StrRef> {
        match prop {
            Value::Str(s) => Ok(s),
            _ => self.to_string(prop),
        }
    }

    /// Float key with an exact uint32 value, as an int key
    fn float_index(&mut self, prop: Value) -> JsResult<Option<Value>> {
        let Value::Float(f) = prop else {
            return Ok(None);
        };
        let n = self.to_uint32(prop)?;
        Ok((n as f64 == f).then_some(Value::Int(n)))
    }

    /// Write a named property, handling growth side effects
    pub fn obj_set_prop(&mut self, obj: ObjRef, name: StrRef, val: Value) {
        if let Some(growth) = self.heap.obj_set_prop(obj, name, val, &self.config) {
            self.after_growth(growth);
        }
    }

    #[inline]
    pub fn obj_get_prop(&self, obj: ObjRef, name: StrRef) -> Value {
        self.heap.obj_get_prop(obj, name)
    }

    /// Prototype of an object-like value
    pub fn get_proto(&self, v: Value) -> JsResult<Value> {
        match v.as_obj() {
            Some(o) => Ok(self.heap.get_proto(o)),
            None => Err(JsError::type_error("prototype of non-object")),
        }
    }

    pub fn set_proto(&mut self, v: Value, proto: Value) -> JsResult<()> {
        match v.as_obj() {
            Some(o) => {
                self.heap.set_proto(o, proto);
                Ok(())
            }
            None => Err(JsError::type_error("prototype of non-object")),
        }
    }

    // Reads

    /// Read `base[prop]`
    pub fn get_prop(&mut self, base: Value, prop: Value) -> JsResult<Value> {
        match base {
            Value::Object(obj) | Value::Closure(obj) => {
                let name = self.prop_key(prop)?;
                Ok(self.heap.obj_get_prop(obj, name))
            }
            Value::Array(arr) => self.get_array_prop(arr, prop),
            Value::Str(s) => {
                if let Value::Int(i) = prop {
                    if i >= 0 {
                        if let Some(ch) = code_unit_at(self.str(s), i as usize) {
                            return Ok(self.new_str(&ch));
                        }
                    }
                }
                if prop == Value::Str(self.names.length) {
                    return Ok(Value::Int(utf16_len(self.str(s)) as i32));
                }
                let proto = Value::Object(self.string_prototype());
                self.get_prop(proto, prop)
            }
            Value::Int(_) | Value::Float(_) => {
                let proto = Value::Object(self.number_prototype());
                self.get_prop(proto, prop)
            }
            Value::Bool(_) => {
                let proto = Value::Object(self.boolean_prototype());
                self.get_prop(proto, prop)
            }
            Value::Null | Value::Undefined => {
                let kind = if base.is_null() { "null" } else { "undefined" };
                Err(match prop {
                    Value::Str(name) => JsError::type_error(format!(
                        "{} base in read of property \"{}\"",
                        kind,
                        self.str(name)
                    )),
                    _ => JsError::type_error(format!("{} base in property read", kind)),
                })
            }
            Value::RawPtr(_) => Err(JsError::type_error("invalid base in property read")),
        }
    }

    fn get_array_prop(&mut self, arr: ObjRef, prop: Value) -> JsResult<Value> {
        if let Value::Int(i) = prop {
            if i >= 0 && (i as u32) < self.heap.arr_len(arr) {
                return Ok(self.heap.get_arr_elem(arr, i as u32));
            }
        }
        if let Some(idx) = self.float_index(prop)? {
            return self.get_array_prop(arr, idx);
        }
        if prop == Value::Str(self.names.length) {
            return Ok(Value::Int(self.heap.arr_len(arr) as i32));
        }
        if let Value::Str(s) = prop {
            let n = str_to_int(self.str(s));
            if !n.is_nan() {
                return self.get_array_prop(arr, n);
            }
            return Ok(self.heap.obj_get_prop(arr, s));
        }
        let name = self.prop_key(prop)?;
        Ok(self.heap.obj_get_prop(arr, name))
    }

    /// Read a constant-named field; own slot first
    pub fn get_prop_field(&mut self, base: Value, name: StrRef) -> JsResult<Value> {
        if let Value::Object(obj) = base {
            if let Some(v) = self.heap.own_prop(obj, name) {
                return Ok(v);
            }
        }
        self.get_prop(base, Value::Str(name))
    }

    /// Read a method; own slot, then the prototype's own slot
    pub fn get_prop_method(&mut self, base: Value, name: StrRef) -> JsResult<Value> {
        if let Value::Object(obj) = base {
            if let Some(v) = self.heap.own_prop(obj, name) {
                return Ok(v);
            }
            if let Value::Object(proto) = self.heap.get_proto(obj) {
                if let Some(v) = self.heap.own_prop(proto, name) {
                    return Ok(v);
                }
            }
        }
        self.get_prop(base, Value::Str(name))
    }

    /// Read an element; in-bounds array reads skip key conversion
    pub fn get_prop_elem(&mut self, base: Value, prop: Value) -> JsResult<Value> {
        if let (Value::Array(arr), Value::Int(i)) = (base, prop) {
            if i >= 0 && (i as u32) < self.heap.arr_len(arr) {
                return Ok(self.heap.get_arr_elem(arr, i as u32));
            }
        }
        self.get_prop(base, prop)
    }

    /// Read `base.length`
    pub fn get_prop_length(&mut self, base: Value) -> JsResult<Value> {
        if let Value::Array(arr) = base {
            return Ok(Value::Int(self.heap.arr_len(arr) as i32));
        }
        let name = Value::Str(self.names.length);
        self.get_prop(base, name)
    }

    // Writes

    /// Write `base[prop] = val`
    pub fn set_prop(&mut self, base: Value, prop: Value, val: Value) -> JsResult<()> {
        match base {
            Value::Object(obj) | Value::Closure(obj) => {
                let name = self.prop_key(prop)?;
                self.obj_set_prop(obj, name, val);
                Ok(())
            }
            Value::Array(arr) => self.set_array_prop(arr, prop, val),
            _ => Err(JsError::type_error("invalid base in property write")),
        }
    }

    fn set_array_prop(&mut self, arr: ObjRef, prop: Value, val: Value) -> JsResult<()> {
        match prop {
            Value::Int(i) if i >= 0 => {
                self.heap.set_arr_elem(arr, i as u32, val, &self.config)?;
                self.after_alloc();
                return Ok(());
            }
            Value::Str(s) => {
                if s == self.names.length {
                    return match val {
                        Value::Int(n) if n >= 0 => {
                            self.heap.set_arr_len(arr, n as u32, &self.config)?;
                            self.after_alloc();
                            Ok(())
                        }
                        _ => Err(JsError::range_error("invalid array length")),
                    };
                }
                let n = str_to_int(self.str(s));
                if !n.is_nan() {
                    return self.set_array_prop(arr, n, val);
                }
                self.obj_set_prop(arr, s, val);
                return Ok(());
            }
            _ => {}
        }
        if let Some(idx) = self.float_index(prop)? {
            return self.set_array_prop(arr, idx, val);
        }
        let name = self.prop_key(prop)?;
        self.obj_set_prop(arr, name, val);
        Ok(())
    }

    /// Write an element; in-bounds array writes go straight to the table
    pub fn set_prop_elem(&mut self, base: Value, prop: Value, val: Value) -> JsResult<()> {
        if let (Value::Array(arr), Value::Int(i)) = (base, prop) {
            if let Some(data) = self.heap.array_data(arr) {
                if i >= 0 && (i as u32) < data.len() {
                    self.heap.table_mut(data.table()).set(i as u32, val.to_raw());
                    return Ok(());
                }
            }
        }
        self.set_prop(base, prop, val)
    }

    /// `delete base[prop]`. Non-object bases are a successful no-op.
    pub fn del_prop(&mut self, base: Value, prop: Value) -> JsResult<bool> {
        let Some(obj) = base.as_obj() else {
            return Ok(true);
        };
        let Value::Str(name) = prop else {
            return Err(JsError::type_error("non-string property name"));
        };
        Ok(self.heap.obj_del_prop(obj, name))
    }

    // Queries

    /// Own-property test on any base
    pub fn has_own_prop(&mut self, base: Value, prop: Value) -> JsResult<bool> {
        match base {
            Value::Object(obj) | Value::Closure(obj) => {
                let name = self.prop_key(prop)?;
                Ok(self.heap.obj_has_prop(obj, name))
            }
            Value::Array(arr) => {
                let len = self.heap.arr_len(arr);
                if matches!(prop, Value::Int(i) if i >= 0 && (i as u32) < len) {
                    return Ok(true);
                }
                let name = self.prop_key(prop)?;
                if name == self.names.length {
                    return Ok(true);
                }
                if matches!(str_to_int(self.str(name)), Value::Int(n) if n >= 0 && (n as u32) < len)
                {
                    return Ok(true);
                }
                Ok(self.heap.obj_has_prop(arr, name))
            }
            Value::Str(s) => {
                let len = utf16_len(self.str(s));
                if matches!(prop, Value::Int(i) if i >= 0 && (i as usize) < len) {
                    return Ok(true);
                }
                let name = self.prop_key(prop)?;
                if name == self.names.length {
                    return Ok(true);
                }
                Ok(matches!(
                    str_to_int(self.str(name)),
                    Value::Int(n) if n >= 0 && (n as usize) < len
                ))
            }
            Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::Undefined => Ok(false),
            Value::Null | Value::RawPtr(_) => {
                Err(JsError::Internal("unsupported base in hasOwnProp"))
            }
        }
    }

    /// `obj instanceof ctor`
    pub fn instanceof(&mut self, obj: Value, ctor: Value) -> JsResult<bool> {
        if !ctor.is_closure() {
            return Err(JsError::type_error("constructor must be function"));
        }
        let Some(mut cur) = obj.as_obj() else {
            return Ok(false);
        };
        let name = Value::Str(self.names.prototype);
        let ctor_proto = self.get_prop(ctor, name)?;

        loop {
            let proto = self.heap.get_proto(cur);
            if proto.is_object_like() && self.same_ref(proto, ctor_proto) {
                return Ok(true);
            }
            match proto.as_obj() {
                Some(p) => cur = p,
                None => return Ok(false),
            }
        }
    }

    /// `prop in obj`
    pub fn in_op(&mut self, prop: Value, obj: Value) -> JsResult<bool> {
        if !obj.is_object_like() {
            return Err(JsError::type_error("invalid object passed to \"in\" operator"));
        }
        let mut cur = obj;
        loop {
            if self.has_own_prop(cur, prop)? {
                return Ok(true);
            }
            match cur.as_obj() {
                Some(o) => cur = self.heap.get_proto(o),
                None => return Ok(false),
            }
            if !cur.is_object_like() {
                return Ok(false);
            }
        }
    }

    /// Raw slot contents of the live instance, for inspection
    pub fn raw_slot(&self, obj: ObjRef, idx: u32) -> Option<RawValue> {
        self.heap.object(obj).slot(idx)
    }
}
