//! layergen composes code-generation plugins on top of a primary generator.
//!
//! Plugins register under a hook, may augment the design before generation
//! and then rewrite or extend the generated files section by section.
#![deny(unsafe_code)]

pub mod codegen;
pub mod core;
pub mod design;
pub mod output;
pub mod plugin;
pub mod plugins;
pub mod render;
pub mod scaffold;

pub use crate::core::error::{Error, Result};
