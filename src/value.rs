//! Tagged value representation
//!
//! Two views of the same data live here:
//! - [`RawValue`] is the storage form: one machine word plus a [`Tag`]. Object
//!   slots, array backing tables and closure cells all hold raw values.
//! - [`Value`] is the closed, high-level enum every operation works on.
//!
//! # Tag encoding
//! - `Int32`: word holds the sign-extended integer
//! - `Float64`: word holds the IEEE-754 bits
//! - `Const`: 0 = false, 1 = true, 2 = undefined, 3 = deleted slot
//! - `RefPtr`: the empty reference (`null`), word is always 0
//! - `String`/`Object`/`Array`/`Closure`: word holds an arena index
//! - `RawPtr`: word holds a non-GC address

use std::fmt;

/// Handle to an interned heap string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrRef(pub(crate) u32);

/// Handle to a heap object (plain object, array header or closure)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub(crate) u32);

/// Handle to a property map (shape)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapRef(pub(crate) u32);

/// Handle to an array backing table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableRef(pub(crate) u32);

/// Handle to a closure cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef(pub(crate) u32);

impl StrRef {
    /// Arena index of this string
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl ObjRef {
    /// Arena index of this object instance
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Type tags stored next to each raw word
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Int32 = 0,
    Float64 = 1,
    Const = 2,
    RefPtr = 3,
    String = 4,
    Object = 5,
    Array = 6,
    Closure = 7,
    RawPtr = 8,
}

/// Constant words used under [`Tag::Const`]
const CONST_FALSE: u64 = 0;
const CONST_TRUE: u64 = 1;
const CONST_UNDEF: u64 = 2;
const CONST_MISSING: u64 = 3;

/// Storage form of a value: a raw word and its type tag
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawValue {
    pub word: u64,
    pub tag: Tag,
}

impl RawValue {
    /// Marker left in a slot whose property was deleted or never written.
    ///
    /// This is not a [`Value`]: it never escapes storage.
    pub const MISSING: RawValue = RawValue {
        word: CONST_MISSING,
        tag: Tag::Const,
    };

    pub const UNDEFINED: RawValue = RawValue {
        word: CONST_UNDEF,
        tag: Tag::Const,
    };

    /// Rebuild a raw value from its parts
    #[inline]
    pub const fn new(word: u64, tag: Tag) -> Self {
        RawValue { word, tag }
    }

    /// Check if this is the deleted-slot marker
    #[inline]
    pub const fn is_missing(self) -> bool {
        matches!(self.tag, Tag::Const) && self.word == CONST_MISSING
    }

    /// Decode into a [`Value`], or `None` for the deleted-slot marker
    #[inline]
    pub fn to_value(self) -> Option<Value> {
        let v = match self.tag {
            Tag::Int32 => Value::Int(self.word as i64 as i32),
            Tag::Float64 => Value::Float(f64::from_bits(self.word)),
            Tag::Const => match self.word {
                CONST_FALSE => Value::Bool(false),
                CONST_TRUE => Value::Bool(true),
                CONST_MISSING => return None,
                _ => Value::Undefined,
            },
            Tag::RefPtr => Value::Null,
            Tag::String => Value::Str(StrRef(self.word as u32)),
            Tag::Object => Value::Object(ObjRef(self.word as u32)),
            Tag::Array => Value::Array(ObjRef(self.word as u32)),
            Tag::Closure => Value::Closure(ObjRef(self.word as u32)),
            Tag::RawPtr => Value::RawPtr(self.word as usize),
        };
        Some(v)
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_value() {
            Some(v) => write!(f, "{:?}", v),
            None => write!(f, "Missing"),
        }
    }
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue::UNDEFINED
    }
}

/// High-level value type
///
/// Exactly one variant is active; numeric and reference variants never
/// overlap. Reference variants compare by arena index, so two handles to
/// the same logical object only compare equal once both are resolved
/// through the forwarding chain (see [`crate::Context::same_ref`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit IEEE double
    Float(f64),
    Bool(bool),
    /// Absent-value marker
    Undefined,
    /// Empty-reference marker
    Null,
    /// Interned heap string
    Str(StrRef),
    Object(ObjRef),
    Array(ObjRef),
    Closure(ObjRef),
    /// Raw, non-GC pointer
    RawPtr(usize),
}

impl Value {
    #[inline]
    pub const fn undefined() -> Self {
        Value::Undefined
    }

    #[inline]
    pub const fn null() -> Self {
        Value::Null
    }

    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    #[inline]
    pub const fn int(n: i32) -> Self {
        Value::Int(n)
    }

    #[inline]
    pub const fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Number value that stays in the integer domain when it can
    ///
    /// Negative zero and non-integral values keep the float form.
    pub fn number(f: f64) -> Self {
        if f.fract() == 0.0
            && f >= i32::MIN as f64
            && f <= i32::MAX as f64
            && !(f == 0.0 && f.is_sign_negative())
        {
            Value::Int(f as i32)
        } else {
            Value::Float(f)
        }
    }

    /// Encode into storage form
    #[inline]
    pub fn to_raw(self) -> RawValue {
        match self {
            Value::Int(n) => RawValue::new(n as i64 as u64, Tag::Int32),
            Value::Float(f) => RawValue::new(f.to_bits(), Tag::Float64),
            Value::Bool(false) => RawValue::new(CONST_FALSE, Tag::Const),
            Value::Bool(true) => RawValue::new(CONST_TRUE, Tag::Const),
            Value::Undefined => RawValue::UNDEFINED,
            Value::Null => RawValue::new(0, Tag::RefPtr),
            Value::Str(s) => RawValue::new(s.0 as u64, Tag::String),
            Value::Object(o) => RawValue::new(o.0 as u64, Tag::Object),
            Value::Array(o) => RawValue::new(o.0 as u64, Tag::Array),
            Value::Closure(o) => RawValue::new(o.0 as u64, Tag::Closure),
            Value::RawPtr(p) => RawValue::new(p as u64, Tag::RawPtr),
        }
    }

    /// Raw word of this value
    #[inline]
    pub fn word(self) -> u64 {
        self.to_raw().word
    }

    /// Type tag of this value
    #[inline]
    pub fn tag(self) -> Tag {
        self.to_raw().tag
    }

    // Kind predicates

    #[inline]
    pub const fn is_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Value::Float(_))
    }

    #[inline]
    pub const fn is_number(self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    #[inline]
    pub const fn is_string(self) -> bool {
        matches!(self, Value::Str(_))
    }

    #[inline]
    pub const fn is_object(self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    pub const fn is_array(self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    pub const fn is_closure(self) -> bool {
        matches!(self, Value::Closure(_))
    }

    /// Check if this is the empty reference
    #[inline]
    pub const fn is_null(self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this is a constant (boolean or undefined)
    #[inline]
    pub const fn is_const(self) -> bool {
        matches!(self, Value::Bool(_) | Value::Undefined)
    }

    #[inline]
    pub const fn is_raw_ptr(self) -> bool {
        matches!(self, Value::RawPtr(_))
    }

    /// Check if this is an object, array or closure
    #[inline]
    pub const fn is_object_like(self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_) | Value::Closure(_))
    }

    // Extraction

    #[inline]
    pub const fn to_i32(self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Numeric value as a double, for either number variant
    #[inline]
    pub fn to_f64(self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(n as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    #[inline]
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_str(self) -> Option<StrRef> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object handle for any object-like value
    #[inline]
    pub const fn as_obj(self) -> Option<ObjRef> {
        match self {
            Value::Object(o) | Value::Array(o) | Value::Closure(o) => Some(o),
            _ => None,
        }
    }

    /// Check if this is a float NaN
    #[inline]
    pub fn is_nan(self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Str(s) => write!(f, "[string #{}]", s.0),
            Value::Object(_) => write!(f, "[object]"),
            Value::Array(_) => write!(f, "[array]"),
            Value::Closure(_) => write!(f, "[closure]"),
            Value::RawPtr(p) => write!(f, "[rawptr 0x{:x}]", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip_preserves_kind() {
        let values = [
            Value::Int(-7),
            Value::Float(-0.0),
            Value::Bool(true),
            Value::Undefined,
            Value::Null,
            Value::Str(StrRef(3)),
            Value::Array(ObjRef(9)),
            Value::RawPtr(0xdead),
        ];
        for v in values {
            let back = v.to_raw().to_value().unwrap();
            assert_eq!(back.tag(), v.tag());
            assert_eq!(back.word(), v.word());
        }
    }

    #[test]
    fn test_missing_is_not_a_value() {
        assert!(RawValue::MISSING.is_missing());
        assert!(RawValue::MISSING.to_value().is_none());
        assert!(!Value::Undefined.to_raw().is_missing());
    }

    #[test]
    fn test_number_normalization() {
        assert_eq!(Value::number(42.0), Value::Int(42));
        assert!(matches!(Value::number(-0.0), Value::Float(f) if f.is_sign_negative()));
        assert_eq!(Value::number(1.5), Value::Float(1.5));
        assert!(Value::number(4294967296.0).is_float());
    }

    #[test]
    fn test_predicates() {
        assert!(Value::Closure(ObjRef(0)).is_object_like());
        assert!(!Value::Str(StrRef(0)).is_object_like());
        assert!(Value::Undefined.is_const());
        assert!(!Value::Null.is_const());
        assert!(Value::Float(f64::NAN).is_nan());
        assert_eq!(Value::Int(3).to_f64(), Some(3.0));
    }
}
