//! Runtime error types
//!
//! Guest-visible failures (`TypeError`, `RangeError`, thrown values) unwind
//! through `?` one call at a time until the surrounding engine catches them.
//! `Internal` marks a broken runtime invariant rather than a guest error.

use crate::value::Value;

#[derive(Debug, Clone, thiserror::Error)]
pub enum JsError {
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    /// Arbitrary guest value raised by a native function
    #[error("uncaught exception: {0}")]
    Thrown(Value),
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl JsError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        JsError::TypeError(msg.into())
    }

    pub fn range_error(msg: impl Into<String>) -> Self {
        JsError::RangeError(msg.into())
    }

    #[inline]
    pub fn is_type_error(&self) -> bool {
        matches!(self, JsError::TypeError(_))
    }

    #[inline]
    pub fn is_range_error(&self) -> bool {
        matches!(self, JsError::RangeError(_))
    }
}

pub type JsResult<T> = Result<T, JsError>;
