//! Rendering of file sets into artifacts

pub mod post_processor;
pub mod tera_renderer;

use std::path::PathBuf;

use crate::codegen::{File, FileSet};
use crate::core::error::Result;

pub use post_processor::*;
pub use tera_renderer::*;

/// A rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
    pub permissions: Option<u32>,
}

/// Expands section templates into final text
pub trait TemplateRenderer {
    /// Render one file: each section in order, concatenated
    fn render_file(&self, file: &File) -> Result<Artifact>;

    /// Render every file of the set, in file order
    fn render(&self, files: &FileSet) -> Result<Vec<Artifact>> {
        files.iter().map(|file| self.render_file(file)).collect()
    }
}
