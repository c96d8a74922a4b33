//! Artifact post-processing

use tracing::debug;

use crate::render::Artifact;

const EXECUTABLE_MODE: u32 = 0o755;

/// Mark scripts executable: a shebang line or a `.sh` extension
pub fn apply_permissions(artifacts: &mut [Artifact]) {
    for artifact in artifacts {
        let is_script = artifact
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "sh")
            .unwrap_or(false);

        if is_script || artifact.content.starts_with("#!") {
            debug!(path = %artifact.path.display(), "Marking artifact executable");
            artifact.permissions = Some(EXECUTABLE_MODE);
        }
    }
}
