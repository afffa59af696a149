//! Operator semantics
//!
//! Every binary operator first tries a fast path on operands that are
//! already numbers and only then coerces. Integer `+`, `-` and `*` are
//! overflow checked: a result that does not fit in an i32 is recomputed in
//! f64 instead of wrapping. Float results are never narrowed back to Int.

use std::cmp::Ordering;

use crate::context::Context;
use crate::error::JsResult;
use crate::runtime::string::strcmp;
use crate::value::{StrRef, Value};

/// Operand pair in a common numeric domain
enum Nums {
    Ints(i32, i32),
    Floats(f64, f64),
}

#[inline]
fn nums(x: Value, y: Value) -> Option<Nums> {
    match (x, y) {
        (Value::Int(a), Value::Int(b)) => Some(Nums::Ints(a, b)),
        (Value::Int(a), Value::Float(b)) => Some(Nums::Floats(a as f64, b)),
        (Value::Float(a), Value::Int(b)) => Some(Nums::Floats(a, b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(Nums::Floats(a, b)),
        _ => None,
    }
}

#[inline]
fn checked_or_float(r: Option<i32>, f: f64) -> Value {
    r.map_or(Value::Float(f), Value::Int)
}

fn add_nums(x: Value, y: Value) -> Option<Value> {
    Some(match nums(x, y)? {
        Nums::Ints(a, b) => checked_or_float(a.checked_add(b), a as f64 + b as f64),
        Nums::Floats(a, b) => Value::Float(a + b),
    })
}

fn sub_nums(x: Value, y: Value) -> Option<Value> {
    Some(match nums(x, y)? {
        Nums::Ints(a, b) => checked_or_float(a.checked_sub(b), a as f64 - b as f64),
        Nums::Floats(a, b) => Value::Float(a - b),
    })
}

fn mul_nums(x: Value, y: Value) -> Option<Value> {
    Some(match nums(x, y)? {
        // a zero times a negative is -0, which only a float can hold
        Nums::Ints(a, b) if (a < 0 && b == 0) || (a == 0 && b < 0) => {
            Value::Float(a as f64 * b as f64)
        }
        Nums::Ints(a, b) => checked_or_float(a.checked_mul(b), a as f64 * b as f64),
        Nums::Floats(a, b) => Value::Float(a * b),
    })
}

fn div_nums(x: Value, y: Value) -> Option<Value> {
    Some(match nums(x, y)? {
        Nums::Ints(a, b) => Value::Float(a as f64 / b as f64),
        Nums::Floats(a, b) => Value::Float(a / b),
    })
}

fn mod_nums(x: Value, y: Value) -> Option<Value> {
    Some(match nums(x, y)? {
        Nums::Ints(a, b) => checked_or_float(a.checked_rem(b), a as f64 % b as f64),
        Nums::Floats(a, b) => Value::Float(a % b),
    })
}

fn cmp_nums(x: Value, y: Value) -> Option<Option<Ordering>> {
    Some(match nums(x, y)? {
        Nums::Ints(a, b) => Some(a.cmp(&b)),
        Nums::Floats(a, b) => a.partial_cmp(&b),
    })
}

/// Relational operator kinds
#[derive(Clone, Copy)]
enum Rel {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Rel {
    /// Whether an ordering satisfies the operator; unordered never does
    fn holds(self, ord: Option<Ordering>) -> bool {
        match (self, ord) {
            (_, None) => false,
            (Rel::Lt, Some(o)) => o == Ordering::Less,
            (Rel::Le, Some(o)) => o != Ordering::Greater,
            (Rel::Gt, Some(o)) => o == Ordering::Greater,
            (Rel::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

impl Context {
    /// Concatenate two strings into an interned result
    pub fn strcat(&mut self, a: StrRef, b: StrRef) -> StrRef {
        let mut out = String::with_capacity(self.str(a).len() + self.str(b).len());
        out.push_str(self.str(a));
        out.push_str(self.str(b));
        self.intern(&out)
    }

    /// Coerce both operands to numbers and apply a numeric kernel
    fn numeric(
        &mut self,
        x: Value,
        y: Value,
        op: fn(Value, Value) -> Option<Value>,
    ) -> JsResult<Value> {
        if let Some(r) = op(x, y) {
            return Ok(r);
        }
        let nx = self.to_number(x)?;
        let ny = self.to_number(y)?;
        Ok(op(nx, ny).unwrap_or(Value::Float(f64::NAN)))
    }

    // Unary

    /// Unary `+`
    pub fn plus(&mut self, x: Value) -> JsResult<Value> {
        self.to_number(x)
    }

    /// Unary `-`. Negating integer zero gives -0.
    pub fn minus(&mut self, x: Value) -> JsResult<Value> {
        Ok(match self.to_number(x)? {
            Value::Int(0) => Value::Float(-0.0),
            Value::Int(n) => checked_or_float(n.checked_neg(), -(n as f64)),
            Value::Float(f) => Value::Float(-f),
            _ => Value::Float(f64::NAN),
        })
    }

    // Arithmetic

    /// `+`: numeric addition, or concatenation once either primitive
    /// operand is a string
    pub fn add(&mut self, x: Value, y: Value) -> JsResult<Value> {
        if let Some(r) = add_nums(x, y) {
            return Ok(r);
        }

        let px = self.to_primitive(x)?;
        let py = self.to_primitive(y)?;

        if let Value::Str(a) = px {
            let b = self.to_string(y)?;
            return Ok(Value::Str(self.strcat(a, b)));
        }
        if let Value::Str(b) = py {
            let a = self.to_string(x)?;
            return Ok(Value::Str(self.strcat(a, b)));
        }

        self.numeric(x, y, add_nums)
    }

    /// Addition specialized for int operands
    pub fn add_int(&mut self, x: Value, y: Value) -> JsResult<Value> {
        if let (Value::Int(a), Value::Int(b)) = (x, y) {
            if let Some(r) = a.checked_add(b) {
                return Ok(Value::Int(r));
            }
        }
        self.add(x, y)
    }

    /// Addition specialized for int/int and float/float operands
    pub fn add_int_float(&mut self, x: Value, y: Value) -> JsResult<Value> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => match a.checked_add(b) {
                Some(r) => Ok(Value::Int(r)),
                None => self.add(x, y),
            },
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            _ => self.add(x, y),
        }
    }

    pub fn sub(&mut self, x: Value, y: Value) -> JsResult<Value> {
        self.numeric(x, y, sub_nums)
    }

    pub fn sub_int_float(&mut self, x: Value, y: Value) -> JsResult<Value> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) => match a.checked_sub(b) {
                Some(r) => Ok(Value::Int(r)),
                None => self.sub(x, y),
            },
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
            _ => self.sub(x, y),
        }
    }

    pub fn mul(&mut self, x: Value, y: Value) -> JsResult<Value> {
        self.numeric(x, y, mul_nums)
    }

    /// Multiplication specialized for non-zero ints and float/float
    pub fn mul_int_float(&mut self, x: Value, y: Value) -> JsResult<Value> {
        match (x, y) {
            (Value::Int(a), Value::Int(b)) if a != 0 && b != 0 => match a.checked_mul(b) {
                Some(r) => Ok(Value::Int(r)),
                None => self.mul(x, y),
            },
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
            _ => self.mul(x, y),
        }
    }

    /// `/`, always in floating point
    pub fn div(&mut self, x: Value, y: Value) -> JsResult<Value> {
        self.numeric(x, y, div_nums)
    }

    /// `%`. Int operands stay int unless the divisor is zero or the
    /// result overflows.
    pub fn modulo(&mut self, x: Value, y: Value) -> JsResult<Value> {
        self.numeric(x, y, mod_nums)
    }

    pub fn mod_int(&mut self, x: Value, y: Value) -> JsResult<Value> {
        if let (Value::Int(a), Value::Int(b)) = (x, y) {
            if let Some(r) = a.checked_rem(b) {
                return Ok(Value::Int(r));
            }
        }
        self.modulo(x, y)
    }

    // Bitwise

    fn int_operands(&mut self, x: Value, y: Value, shift: bool) -> JsResult<(i32, i32)> {
        if let (Value::Int(a), Value::Int(b)) = (x, y) {
            return Ok((a, b));
        }
        let a = self.to_int32(x)?;
        let b = if shift {
            self.to_uint32(y)?
        } else {
            self.to_int32(y)?
        };
        Ok((a, b))
    }

    pub fn bit_and(&mut self, x: Value, y: Value) -> JsResult<Value> {
        let (a, b) = self.int_operands(x, y, false)?;
        Ok(Value::Int(a & b))
    }

    pub fn bit_or(&mut self, x: Value, y: Value) -> JsResult<Value> {
        let (a, b) = self.int_operands(x, y, false)?;
        Ok(Value::Int(a | b))
    }

    pub fn bit_xor(&mut self, x: Value, y: Value) -> JsResult<Value> {
        let (a, b) = self.int_operands(x, y, false)?;
        Ok(Value::Int(a ^ b))
    }

    /// `<<`, shift count taken mod 32
    pub fn shl(&mut self, x: Value, y: Value) -> JsResult<Value> {
        let (a, b) = self.int_operands(x, y, true)?;
        Ok(Value::Int(a.wrapping_shl(b as u32)))
    }

    /// `>>`, sign-propagating
    pub fn shr(&mut self, x: Value, y: Value) -> JsResult<Value> {
        let (a, b) = self.int_operands(x, y, true)?;
        Ok(Value::Int(a.wrapping_shr(b as u32)))
    }

    /// `>>>`, zero-filling. The result stays in the i32 domain.
    pub fn ushr(&mut self, x: Value, y: Value) -> JsResult<Value> {
        let (a, b) = self.int_operands(x, y, true)?;
        Ok(Value::Int((a as u32).wrapping_shr(b as u32) as i32))
    }

    /// `~`
    pub fn bit_not(&mut self, x: Value) -> JsResult<Value> {
        let a = match x {
            Value::Int(a) => a,
            _ => self.to_int32(x)?,
        };
        Ok(Value::Int(!a))
    }

    // Relational

    fn relational(&mut self, x: Value, y: Value, rel: Rel) -> JsResult<bool> {
        if let Some(ord) = cmp_nums(x, y) {
            return Ok(rel.holds(ord));
        }

        let px = self.to_primitive(x)?;
        let py = self.to_primitive(y)?;
        if let (Value::Str(a), Value::Str(b)) = (px, py) {
            return Ok(rel.holds(Some(strcmp(self.str(a), self.str(b)))));
        }

        let nx = self.to_number(x)?;
        let ny = self.to_number(y)?;
        Ok(rel.holds(cmp_nums(nx, ny).flatten()))
    }

    pub fn lt(&mut self, x: Value, y: Value) -> JsResult<bool> {
        self.relational(x, y, Rel::Lt)
    }

    pub fn le(&mut self, x: Value, y: Value) -> JsResult<bool> {
        self.relational(x, y, Rel::Le)
    }

    pub fn gt(&mut self, x: Value, y: Value) -> JsResult<bool> {
        self.relational(x, y, Rel::Gt)
    }

    pub fn ge(&mut self, x: Value, y: Value) -> JsResult<bool> {
        self.relational(x, y, Rel::Ge)
    }

    /// `<` specialized for int/int and float/number operands
    pub fn lt_int_float(&mut self, x: Value, y: Value) -> JsResult<bool> {
        match cmp_nums(x, y) {
            Some(ord) if !matches!((x, y), (Value::Int(_), Value::Float(_))) => {
                Ok(Rel::Lt.holds(ord))
            }
            _ => self.lt(x, y),
        }
    }

    pub fn gt_int_float(&mut self, x: Value, y: Value) -> JsResult<bool> {
        match cmp_nums(x, y) {
            Some(ord) if !matches!((x, y), (Value::Int(_), Value::Float(_))) => {
                Ok(Rel::Gt.holds(ord))
            }
            _ => self.gt(x, y),
        }
    }

    pub fn ge_int_float(&mut self, x: Value, y: Value) -> JsResult<bool> {
        match cmp_nums(x, y) {
            Some(ord) if !matches!((x, y), (Value::Int(_), Value::Float(_))) => {
                Ok(Rel::Ge.holds(ord))
            }
            _ => self.ge(x, y),
        }
    }

    // Equality

    /// Loose equality (`==`)
    pub fn eq(&mut self, x: Value, y: Value) -> JsResult<bool> {
        use Value::*;

        match (x, y) {
            (Int(a), Int(b)) => return Ok(a == b),
            (Int(a), Float(b)) => return Ok(a as f64 == b),
            (Float(a), Int(b)) => return Ok(a == b as f64),
            (Float(a), Float(b)) => return Ok(a == b),

            (Object(_), Object(_)) | (Array(_), Array(_)) | (Closure(_), Closure(_)) => {
                return Ok(self.same_ref(x, y));
            }
            (Object(_) | Array(_) | Closure(_), y) if y.is_null() || y.is_object_like() => {
                return Ok(false);
            }

            (Str(a), Str(b)) => return Ok(a == b),

            (Null, Null) | (Null, Undefined) | (Undefined, Null) => return Ok(true),
            (Null, _) => return Ok(false),
            // int 0 and strings never equal null; other primitives compare
            // as numbers below, so `false == null` holds
            (Int(0), Null) | (Str(_), Null) => return Ok(false),

            (Bool(a), Bool(b)) => return Ok(a == b),
            (Undefined, Undefined) => return Ok(true),
            (Bool(_), Undefined) | (Undefined, Bool(_)) => return Ok(false),

            _ => {}
        }

        let px = self.to_primitive(x)?;
        let py = self.to_primitive(y)?;
        if let (Str(a), Str(b)) = (px, py) {
            return Ok(a == b);
        }

        let nx = self.to_number(x)?;
        let ny = self.to_number(y)?;
        self.eq(nx, ny)
    }

    /// `x == null`, true only for null and undefined
    #[inline]
    pub fn eq_null(&self, x: Value) -> bool {
        matches!(x, Value::Null | Value::Undefined)
    }

    /// Loose inequality (`!=`)
    pub fn ne(&mut self, x: Value, y: Value) -> JsResult<bool> {
        Ok(!self.eq(x, y)?)
    }

    /// Strict equality (`===`). Never coerces; int and float compare by
    /// numeric value, references by identity.
    pub fn se(&self, x: Value, y: Value) -> bool {
        use Value::*;

        match (x, y) {
            (Int(a), Int(b)) => a == b,
            (Int(a), Float(b)) => a as f64 == b,
            (Float(a), Int(b)) => a == b as f64,
            (Float(a), Float(b)) => a == b,
            (Object(_), Object(_)) | (Array(_), Array(_)) | (Closure(_), Closure(_)) => {
                self.same_ref(x, y)
            }
            (Str(a), Str(b)) => a == b,
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Undefined, Undefined) => true,
            (RawPtr(a), RawPtr(b)) => a == b,
            _ => false,
        }
    }

    /// Strict inequality (`!==`)
    #[inline]
    pub fn ns(&self, x: Value, y: Value) -> bool {
        !self.se(x, y)
    }
}
