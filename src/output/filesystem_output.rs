//! Filesystem-based output service

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{Error, Result};
use crate::output::OutputService;
use crate::render::Artifact;

/// Writes artifacts below a root directory
#[derive(Debug, Clone)]
pub struct FileSystemOutput {
    root: PathBuf,
}

impl FileSystemOutput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination of an artifact path; paths may not escape the root
    fn target(&self, path: &Path) -> Result<PathBuf> {
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::config(format!(
                "artifact path {} must be relative and stay inside the output directory",
                path.display()
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl OutputService for FileSystemOutput {
    async fn write_artifacts(&self, artifacts: &[Artifact]) -> Result<()> {
        for artifact in artifacts {
            let target = self.target(&artifact.path)?;

            if let Some(parent) = target.parent() {
                self.ensure_directory(parent).await?;
            }

            let mut file = fs::File::create(&target)
                .await
                .map_err(|e| Error::output(&target, e))?;
            file.write_all(artifact.content.as_bytes())
                .await
                .map_err(|e| Error::output(&target, e))?;
            file.flush().await.map_err(|e| Error::output(&target, e))?;

            #[cfg(unix)]
            if let Some(mode) = artifact.permissions {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, std::fs::Permissions::from_mode(mode))
                    .await
                    .map_err(|e| Error::output(&target, e))?;
            }

            debug!(path = %target.display(), bytes = artifact.content.len(), "Wrote artifact");
        }

        info!(root = %self.root.display(), count = artifacts.len(), "Artifacts written");
        Ok(())
    }

    async fn ensure_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| Error::output(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(path: &str, content: &str, permissions: Option<u32>) -> Artifact {
        Artifact {
            path: PathBuf::from(path),
            content: content.to_string(),
            permissions,
        }
    }

    #[tokio::test]
    async fn test_write_artifacts_creates_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new(temp_dir.path());

        let artifacts = vec![
            artifact("gen/calc/service.go", "package calc\n", None),
            artifact("README.md", "# calc\n", None),
        ];
        output.write_artifacts(&artifacts).await.unwrap();

        let service = std::fs::read_to_string(temp_dir.path().join("gen/calc/service.go")).unwrap();
        assert_eq!(service, "package calc\n");
        assert!(temp_dir.path().join("README.md").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_artifacts_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new(temp_dir.path());
        output
            .write_artifacts(&[artifact("run.sh", "#!/bin/sh\n", Some(0o755))])
            .await
            .unwrap();

        let mode = std::fs::metadata(temp_dir.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn test_paths_cannot_escape_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new(temp_dir.path().join("out"));
        let err = output
            .write_artifacts(&[artifact("../evil.go", "", None)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!temp_dir.path().join("evil.go").exists());
    }

    #[tokio::test]
    async fn test_ensure_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output = FileSystemOutput::new(temp_dir.path());
        let nested = temp_dir.path().join("cmd/calc");
        output.ensure_directory(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(output.root(), temp_dir.path());
    }
}
