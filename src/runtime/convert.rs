//! Type coercions
//!
//! Conversions between the value kinds: to primitive, number, string,
//! boolean and the 32-bit integer forms used by the bitwise operators.
//! Object-like values go through their `toString` capability, found on the
//! prototype chain like any other property.

use crate::context::Context;
use crate::error::{JsError, JsResult};
use crate::runtime::string::str_to_int;
use crate::util::{f64_to_string, i64_to_string_radix};
use crate::value::{StrRef, Value};

impl Context {
    /// Call the `toString` capability of an object-like value
    fn call_to_string(&mut self, v: Value) -> JsResult<Value> {
        let name = Value::Str(self.names.to_string);
        let method = self.get_prop(v, name)?;
        if !method.is_closure() {
            log::warn!("no callable toString on {} during coercion", v);
            return Err(JsError::type_error("object has no toString method"));
        }
        self.call(method, v, &[])
    }

    /// Convert to a primitive value.
    ///
    /// Object-like values are replaced by the result of their `toString`
    /// capability, which must not itself be object-like.
    pub fn to_primitive(&mut self, v: Value) -> JsResult<Value> {
        match v {
            Value::Int(_)
            | Value::Float(_)
            | Value::Bool(_)
            | Value::Undefined
            | Value::Null
            | Value::Str(_) => Ok(v),
            Value::Object(_) | Value::Array(_) | Value::Closure(_) => {
                let prim = self.call_to_string(v)?;
                if prim.is_object_like() || prim.is_raw_ptr() {
                    return Err(JsError::type_error("toString produced non-primitive value"));
                }
                Ok(prim)
            }
            Value::RawPtr(_) => Err(JsError::type_error("unexpected type in toPrimitive")),
        }
    }

    /// Convert to a number. Unparseable strings give NaN, not an error.
    pub fn to_number(&mut self, v: Value) -> JsResult<Value> {
        match v {
            Value::Int(_) | Value::Float(_) => Ok(v),
            Value::Null => Ok(Value::Int(0)),
            Value::Bool(b) => Ok(Value::Int(b as i32)),
            Value::Str(s) => Ok(str_to_int(self.str(s))),
            Value::Object(_) | Value::Array(_) | Value::Closure(_) => {
                let s = self.to_string(v)?;
                Ok(str_to_int(self.str(s)))
            }
            Value::Undefined | Value::RawPtr(_) => Ok(Value::Float(f64::NAN)),
        }
    }

    /// Convert to an interned string
    pub fn to_string(&mut self, v: Value) -> JsResult<StrRef> {
        match v {
            Value::Str(s) => Ok(s),
            Value::Int(_) | Value::Float(_) => self.number_to_string(v, 10),
            Value::Undefined => Ok(self.intern("undefined")),
            Value::Null => Ok(self.intern("null")),
            Value::Bool(true) => Ok(self.intern("true")),
            Value::Bool(false) => Ok(self.intern("false")),
            Value::Object(_) | Value::Array(_) | Value::Closure(_) => {
                let prim = self.to_primitive(v)?;
                self.to_string(prim)
            }
            Value::RawPtr(_) => Err(JsError::Internal("unhandled type in toString")),
        }
    }

    pub fn to_boolean(&self, v: Value) -> bool {
        match v {
            Value::Bool(b) => b,
            Value::Int(n) => n != 0,
            Value::Float(f) => f != 0.0 && !f.is_nan(),
            Value::Undefined | Value::Null => false,
            Value::Str(s) => !self.str(s).is_empty(),
            Value::Object(_) | Value::Array(_) | Value::Closure(_) => true,
            Value::RawPtr(p) => p != 0,
        }
    }

    /// Convert to a signed 32-bit integer; NaN and infinities give 0
    pub fn to_int32(&mut self, v: Value) -> JsResult<i32> {
        Ok(match self.to_number(v)? {
            Value::Int(n) => n,
            Value::Float(f) if f.is_finite() => f as i32,
            _ => 0,
        })
    }

    /// Unsigned 32-bit conversion.
    ///
    /// Integers pass through unchanged. Floats lose their sign before
    /// truncation, so `-5.5` becomes 5.
    pub fn to_uint32(&mut self, v: Value) -> JsResult<i32> {
        Ok(match self.to_number(v)? {
            Value::Int(n) => n,
            Value::Float(f) if f.is_finite() => f.abs() as i32,
            _ => 0,
        })
    }

    /// Result of the `typeof` operator
    pub fn type_of(&mut self, v: Value) -> StrRef {
        let name = match v {
            Value::Int(_) | Value::Float(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Undefined => "undefined",
            Value::Null | Value::Object(_) | Value::Array(_) => "object",
            Value::Closure(_) => "function",
            Value::Str(_) => "string",
            Value::RawPtr(_) => "rawptr",
        };
        self.intern(name)
    }

    /// True for NaN and for anything that converts to NaN
    pub fn is_nan(&mut self, v: Value) -> JsResult<bool> {
        Ok(self.to_number(v)?.is_nan())
    }

    /// Format a number in the given radix (2-36).
    ///
    /// Integers honour the radix; floats are always formatted in decimal.
    pub fn number_to_string(&mut self, v: Value, radix: i32) -> JsResult<StrRef> {
        if !(2..=36).contains(&radix) {
            return Err(JsError::range_error("radix is not between 2 and 36"));
        }
        match v {
            Value::Int(n) => self.int_to_string(n, radix),
            Value::Float(f) => {
                let s = f64_to_string(f);
                Ok(self.intern(&s))
            }
            _ => Err(JsError::type_error("number expected")),
        }
    }

    /// Format an integer in the given radix (2-36)
    pub fn int_to_string(&mut self, n: i32, radix: i32) -> JsResult<StrRef> {
        if !(2..=36).contains(&radix) {
            return Err(JsError::range_error("invalid radix"));
        }
        let s = i64_to_string_radix(n as i64, radix as u32);
        Ok(self.intern(&s))
    }
}
