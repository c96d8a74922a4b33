//! Crate-wide error type and pipeline configuration

pub mod config;
pub mod error;

pub use config::*;
pub use error::{Error, Result, Stage};
