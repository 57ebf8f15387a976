//! Core types for the generation domain

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;

/// A generated file, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub path: PathBuf,
    pub content: String,
}

/// How a generation context maps onto output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStrategy {
    /// One artifact per source document, next to it
    SingleArtifact,
    /// A route and a request handler per operation
    PerOperation,
}

impl OutputStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleArtifact => "single_artifact",
            Self::PerOperation => "per_operation",
        }
    }
}

impl fmt::Display for OutputStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_artifact" => Ok(Self::SingleArtifact),
            "per_operation" => Ok(Self::PerOperation),
            _ => Err(Error::config(format!(
                "Unknown output strategy '{s}', expected single_artifact or per_operation"
            ))),
        }
    }
}

/// Outcome of a successful generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    /// Number of source documents that were loaded
    pub documents: usize,
    /// Documents skipped because they had nothing to generate
    pub skipped: usize,
    /// Every artifact written during the run, sorted
    pub written: Vec<PathBuf>,
    /// Files whose post-processing failed
    pub post_process_failures: Vec<PathBuf>,
}
