//! for-in key enumeration
//!
//! A [`PropEnum`] walks the prototype chain lazily. Each call to
//! [`PropEnum::next`] resumes at the saved cursor, so properties added or
//! deleted between steps are observed. The walk stops at the built-in root
//! prototypes.

use crate::context::Context;
use crate::error::JsResult;
use crate::runtime::string::utf16_len;
use crate::value::Value;

/// Position in the chain
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cursor {
    /// Object, array or closure being scanned
    Obj(Value),
    /// String value yielding its indices
    Str(Value),
    Done,
}

/// Restartable key iterator over an object-like or string value
#[derive(Debug, Clone)]
pub struct PropEnum {
    root: Value,
    cur: Cursor,
    idx: u32,
    /// Objects already scanned, most derived first
    visited: Vec<Value>,
}

impl PropEnum {
    fn start(root: Value) -> Cursor {
        if root.is_object_like() {
            Cursor::Obj(root)
        } else if root.is_string() {
            Cursor::Str(root)
        } else {
            Cursor::Done
        }
    }

    /// Value the enumeration started from
    pub fn root(&self) -> Value {
        self.root
    }

    /// Rewind to the first key
    pub fn reset(&mut self) {
        self.cur = Self::start(self.root);
        self.idx = 0;
        self.visited.clear();
    }

    /// Next key, or `None` once the chain is exhausted.
    ///
    /// Named keys are strings. Array and string indices are ints.
    pub fn next(&mut self, ctx: &mut Context) -> JsResult<Option<Value>> {
        loop {
            match self.cur {
                Cursor::Done => return Ok(None),
                Cursor::Str(v) => {
                    let Value::Str(s) = v else {
                        self.cur = Cursor::Done;
                        continue;
                    };
                    if (self.idx as usize) < utf16_len(ctx.str(s)) {
                        self.idx += 1;
                        return Ok(Some(Value::Int(self.idx as i32 - 1)));
                    }
                    self.advance(Value::Object(ctx.string_prototype()));
                }
                Cursor::Obj(v) => {
                    if let Some(key) = self.scan(ctx, v)? {
                        return Ok(Some(key));
                    }
                    self.visited.push(v);
                    let proto = ctx.get_proto(v)?;
                    self.advance(proto);
                }
            }
        }
    }

    fn advance(&mut self, next: Value) {
        self.cur = if next.is_object_like() {
            Cursor::Obj(next)
        } else {
            Cursor::Done
        };
        self.idx = 0;
    }

    /// Resume scanning `v` at the cursor: map slots first, then elements
    fn scan(&mut self, ctx: &mut Context, v: Value) -> JsResult<Option<Value>> {
        let Some(obj) = v.as_obj() else {
            return Ok(None);
        };
        if ctx.is_root_prototype(obj) {
            self.cur = Cursor::Done;
            return Ok(None);
        }

        let map = ctx.heap().obj_map(obj);
        let num_props = ctx.heap().map(map).num_props();
        while self.idx < num_props {
            let i = self.idx;
            self.idx += 1;
            // slot 0 is the prototype and has no name
            let Some(name) = ctx.heap().map(map).prop_name(i) else {
                continue;
            };
            if !self.root.is_object() && (name == ctx.names.length || name == ctx.names.callee) {
                continue;
            }
            if !ctx.heap().obj_has_prop(obj, name) {
                continue;
            }
            if self.is_shadowed(ctx, Value::Str(name))? {
                continue;
            }
            return Ok(Some(Value::Str(name)));
        }

        if let Value::Array(arr) = v {
            let elem = self.idx - num_props;
            if elem < ctx.heap().arr_len(arr) {
                self.idx += 1;
                return Ok(Some(Value::Int(elem as i32)));
            }
        }
        Ok(None)
    }

    fn is_shadowed(&self, ctx: &mut Context, key: Value) -> JsResult<bool> {
        for &lower in &self.visited {
            if ctx.has_own_prop(lower, key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Context {
    /// Begin a for-in walk over `v`. Values other than objects and strings
    /// enumerate nothing.
    pub fn prop_enum(&self, v: Value) -> PropEnum {
        log::trace!("enumerating {}", v);
        PropEnum {
            root: v,
            cur: PropEnum::start(v),
            idx: 0,
            visited: Vec::new(),
        }
    }
}
