//! Heap strings
//!
//! Every string value is interned: two string values with identical
//! content always carry the same [`StrRef`], so string equality is handle
//! equality. Content is stored as UTF-8; lengths, indexing and ordering are
//! defined over UTF-16 code units.
//!
//! UTF-8 cannot hold a lone surrogate. Indexing into one half of a
//! surrogate pair therefore yields U+FFFD rather than the surrogate itself;
//! lengths and comparisons are unaffected.

use crate::value::{StrRef, Value};
use hashbrown::HashMap;
use std::cmp::Ordering;

/// String interning table
#[derive(Debug, Default)]
pub struct StringTable {
    /// Content by handle
    strings: Vec<Box<str>>,
    /// Content to handle
    index: HashMap<Box<str>, StrRef>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned strings
    #[inline]
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Find or add a string, returning its canonical handle
    pub fn intern(&mut self, s: &str) -> StrRef {
        if let Some(&r) = self.index.get(s) {
            return r;
        }
        let r = StrRef(self.strings.len() as u32);
        self.strings.push(s.into());
        self.index.insert(s.into(), r);
        r
    }

    /// Content of an interned string
    #[inline]
    pub fn get(&self, r: StrRef) -> &str {
        &self.strings[r.0 as usize]
    }

    /// Handle for content that is already interned
    #[inline]
    pub fn lookup(&self, s: &str) -> Option<StrRef> {
        self.index.get(s).copied()
    }
}

/// Length in UTF-16 code units
#[inline]
pub fn utf16_len(s: &str) -> usize {
    if s.is_ascii() {
        s.len()
    } else {
        s.encode_utf16().count()
    }
}

/// Single code unit at `idx` as a one-unit string.
///
/// Half of a surrogate pair comes back as U+FFFD.
pub fn code_unit_at(s: &str, idx: usize) -> Option<String> {
    if s.is_ascii() {
        return s.get(idx..idx + 1).map(str::to_owned);
    }
    let unit = s.encode_utf16().nth(idx)?;
    Some(String::from_utf16_lossy(&[unit]))
}

/// Ordinal comparison over UTF-16 code units; a proper prefix sorts first
pub fn strcmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Scanner states for [`str_to_int`]
#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    PreWs,
    Sign,
    Digits,
    PostWs,
}

/// Integer value of a string, or NaN.
///
/// Accepts optional spaces or tabs, an optional sign, a run of decimal
/// digits and trailing spaces or tabs. No radix prefixes, fractions or
/// exponents. An empty or all-blank string yields 0.
pub fn str_to_int(s: &str) -> Value {
    let bytes = s.as_bytes();
    let mut acc = 0.0f64;
    let mut neg = false;
    let mut state = ScanState::PreWs;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        match state {
            ScanState::PreWs => {
                if ch == b' ' || ch == b'\t' {
                    i += 1;
                } else if ch == b'+' || ch == b'-' {
                    state = ScanState::Sign;
                } else {
                    state = ScanState::Digits;
                }
            }
            ScanState::Sign => {
                if ch == b'-' {
                    neg = true;
                }
                i += 1;
                state = ScanState::Digits;
            }
            ScanState::Digits => {
                if !ch.is_ascii_digit() {
                    state = ScanState::PostWs;
                    continue;
                }
                acc = 10.0 * acc + (ch - b'0') as f64;
                i += 1;
            }
            ScanState::PostWs => {
                if ch != b' ' && ch != b'\t' {
                    return Value::Float(f64::NAN);
                }
                i += 1;
            }
        }
    }

    if neg {
        acc = -acc;
    }
    Value::number(acc)
}
