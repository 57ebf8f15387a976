//! Port interfaces for the generation domain

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::generation::CompiledArtifact;
use crate::infrastructure::openapi::SourceDocument;

/// Loads and dereferences schema documents
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Parse the document at `path`, failing with `Error::SchemaParse`
    async fn load(&self, path: &Path) -> Result<SourceDocument>;
}

/// Persists compiled artifacts
#[async_trait]
pub trait OutputWriter: Send + Sync {
    /// Write one artifact, overwriting any previous version
    async fn write(&self, artifact: &CompiledArtifact) -> Result<()>;
}

/// Polishes one generated file in place
#[async_trait]
pub trait PostProcessor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Process the file at `path`, failing with `Error::PostProcess`
    async fn process(&self, path: &Path) -> Result<()>;
}
