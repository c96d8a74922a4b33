//! Output of rendered artifacts

pub mod filesystem_output;

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::render::Artifact;

pub use filesystem_output::*;

/// Destination for rendered artifacts
#[async_trait]
pub trait OutputService: Send + Sync {
    /// Write every artifact, creating parent directories as needed
    async fn write_artifacts(&self, artifacts: &[Artifact]) -> Result<()>;

    async fn ensure_directory(&self, path: &Path) -> Result<()>;
}
