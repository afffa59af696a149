//! Runtime support
//!
//! The object model and the operations the execution engine calls on every
//! property access and operator:
//! - Object instances, growth and forwarding
//! - Property maps shared between instances
//! - Array backing tables
//! - Closures, cells and native functions
//! - Coercions, operators, generic property access and for-in enumeration

pub mod access;
pub mod array;
pub mod convert;
pub mod enumerate;
pub mod function;
pub mod object;
pub mod operators;
pub mod property;
pub mod string;

pub use array::{ArrayData, ArrayTable};
pub use enumerate::PropEnum;
pub use function::{CallHook, ClosureData, Function, NativeFn};
pub use object::{Growth, HeapObject, JsObject, Layout, LayoutKind};
pub use property::{LookupMode, PropertyMap};
pub use string::StringTable;
