//! Filesystem artifact writer

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::generation::{CompiledArtifact, OutputWriter};

/// Writes artifacts to disk. Parent directories must already exist.
pub struct FileSystemOutput;

impl FileSystemOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputWriter for FileSystemOutput {
    async fn write(&self, artifact: &CompiledArtifact) -> Result<()> {
        debug!(path = %artifact.path.display(), bytes = artifact.content.len(), "Writing artifact");
        fs::write(&artifact.path, artifact.content.as_bytes())
            .await
            .map_err(|source| Error::Write {
                path: artifact.path.clone(),
                source,
            })
    }
}
