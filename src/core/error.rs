//! Error handling for the oapigen code generator.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! # Examples
//!
//! ```
//! use oapigen::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::config("root_dir is required"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::infrastructure::templates::TemplateName;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for generator operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unresolvable schema document
    #[error("Failed to parse schema {}: {message}", .path.display())]
    SchemaParse { path: PathBuf, message: String },

    /// Template name outside the closed set of templates
    #[error(
        "Unknown template '{}', expected one of: {}",
        .0,
        TemplateName::names().join(", ")
    )]
    UnknownTemplate(String),

    /// Writing a generated artifact failed
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Formatting or lint-fixing a generated file failed
    #[error("Failed to post-process {}: {message}", .path.display())]
    PostProcess { path: PathBuf, message: String },

    /// Compiling a template against a context failed
    #[error("Failed to render template '{template}': {message}")]
    Render {
        template: TemplateName,
        message: String,
    },

    /// The source glob could not be compiled
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// One or more documents failed during generation
    #[error("{} document(s) failed to generate:\n{}", .failures.len(), FailureList(.failures))]
    Generation { failures: Vec<GenerationFailure> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Template engine error raised while registering templates
    #[error("Template engine error: {0}")]
    Template(#[from] tera::Error),

    /// TOML configuration parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A single document that failed during the generation phase
#[derive(Debug)]
pub struct GenerationFailure {
    /// Source document the failure belongs to
    pub source_path: PathBuf,
    /// The underlying error
    pub error: Error,
}

struct FailureList<'a>(&'a [GenerationFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}: {}", failure.source_path.display(), failure.error)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new schema parse error for the given document
    pub fn schema_parse<P: Into<PathBuf>, S: Into<String>>(path: P, msg: S) -> Self {
        Self::SchemaParse {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a new post-processing error for the given file
    pub fn post_process<P: Into<PathBuf>, S: Into<String>>(path: P, msg: S) -> Self {
        Self::PostProcess {
            path: path.into(),
            message: msg.into(),
        }
    }
}
