//! jsrt - value and object runtime for a small JavaScript engine
//!
//! The layer beneath a compiled-code executor: dynamically typed values,
//! objects with shared property maps, arrays with growable backing tables,
//! closures with shared cells, the coercion and operator rules, and for-in
//! enumeration. Memory lives in a handle-addressed [`gc::Heap`]; reclaiming
//! it is left to a pluggable [`gc::Collector`].
//!
//! # Features
//! - Int/float numbers with overflow promotion instead of wraparound
//! - Interned strings, so string equality is handle equality
//! - Objects grow in place behind forwarding handles
//! - All engine state passed explicitly through [`Context`]
//!
//! # Example
//! ```
//! use jsrt::{Context, Value};
//!
//! let mut ctx = Context::new();
//! let obj = ctx.new_plain_object();
//! let key = ctx.new_str("answer");
//! ctx.set_prop(obj, key, Value::Int(42)).unwrap();
//! assert_eq!(ctx.get_prop(obj, key).unwrap(), Value::Int(42));
//!
//! let sum = ctx.add(Value::Int(i32::MAX), Value::Int(1)).unwrap();
//! assert_eq!(sum, Value::Float(2147483648.0));
//! ```

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod value;

// Heap and collection
pub mod gc;

// Runtime support
pub mod runtime;

// Utilities
pub mod util;

// Re-export main types
pub use config::RuntimeConfig;
pub use context::Context;
pub use error::{JsError, JsResult};
pub use value::Value;
