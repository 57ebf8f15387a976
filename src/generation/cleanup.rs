//! Removal of previously generated artifacts

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use super::paths::find_generated_files;
use crate::core::error::{Error, Result};

/// Delete every generated file below `root_dir` and return how many were removed
pub async fn clear(root_dir: &Path) -> Result<usize> {
    if !root_dir.is_dir() {
        return Err(Error::config(format!(
            "root_dir {} is not a directory",
            root_dir.display()
        )));
    }

    let files = find_generated_files(root_dir).await?;
    for file in &files {
        debug!(path = %file.display(), "Removing generated file");
        fs::remove_file(file).await?;
    }

    info!(root = %root_dir.display(), count = files.len(), "Removed generated files");
    Ok(files.len())
}
