//! Utility functions

pub mod dtoa;

pub use dtoa::{f64_to_string, i64_to_string_radix};
