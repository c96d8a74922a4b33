//! Design domain module - the evaluated service description plugins read
//! and augment before generation.

pub mod root;
pub mod rules;
pub mod types;

pub use root::*;
pub use types::*;
