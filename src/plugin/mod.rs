//! Plugin composition
//!
//! Plugins register against a hook and run in two phases. See [`Registry`]
//! for the execution order.

pub mod registry;
pub mod traits;

pub use registry::*;
pub use traits::*;
