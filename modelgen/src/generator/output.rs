//! Artifact writer
//!
//! Writes emitted artifacts under the output directory. Contents are written as rendered.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::generator::emitter::Artifact;

/// Write every artifact, creating parent directories; returns the written paths
pub fn write_artifacts(directory: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let relative = Path::new(&artifact.name);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(Error::InvariantViolation(format!(
                "artifact '{}' escapes the output directory",
                artifact.name
            )));
        }

        let path = directory.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        file.write_all(artifact.contents.as_bytes())?;

        tracing::info!(path = %path.display(), "Wrote artifact");
        written.push(path);
    }

    Ok(written)
}
