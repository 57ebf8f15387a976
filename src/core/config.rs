//! Generator configuration.
//!
//! A [`GeneratorConfig`] describes one generation run: where to look for
//! schema documents, which template to apply and how the output is
//! post-processed. It can be assembled in code, or loaded from a TOML file
//! through [`ConfigFile`] and completed with command-line overrides.
//!
//! # Example
//!
//! ```toml
//! root_dir = "."
//! source_glob = "./common/api/**/*.schema.yaml"
//! template = "zod_operation_schema"
//! format_command = "npx prettier --write {file}"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::generation::OutputStrategy;
use crate::infrastructure::templates::TemplateName;

/// Configuration for a single generation run
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root of the tree that is scanned, written into and post-processed
    pub root_dir: PathBuf,
    /// Glob of source schema documents, relative to `root_dir`
    pub source_glob: String,
    /// Template applied to every document
    pub template_name: TemplateName,
    /// Explicit output strategy; derived from the template when unset
    pub output_strategy: Option<OutputStrategy>,
    /// Directory whose templates override the embedded ones
    pub template_dir: Option<PathBuf>,
    /// External formatter, `{file}` is replaced with the generated file path
    pub format_command: Option<String>,
    /// External lint fixer, `{file}` is replaced with the generated file path
    pub lint_fix_command: Option<String>,
}

impl GeneratorConfig {
    /// Create a configuration with default post-processing
    pub fn new(
        root_dir: impl Into<PathBuf>,
        source_glob: impl Into<String>,
        template_name: TemplateName,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            source_glob: source_glob.into(),
            template_name,
            output_strategy: None,
            template_dir: None,
            format_command: None,
            lint_fix_command: None,
        }
    }

    /// The strategy used to map contexts to artifacts
    pub fn output_strategy(&self) -> OutputStrategy {
        self.output_strategy
            .unwrap_or_else(|| self.template_name.default_output_strategy())
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.source_glob.trim().is_empty() {
            return Err(Error::config("source_glob must not be empty"));
        }
        if self.template_name.renders_operation()
            && self.output_strategy() == OutputStrategy::SingleArtifact
        {
            return Err(Error::config(format!(
                "template '{}' renders one operation and cannot be used with the {} strategy",
                self.template_name,
                OutputStrategy::SingleArtifact
            )));
        }
        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "root_dir {} is not a directory",
                self.root_dir.display()
            )));
        }
        if let Some(dir) = &self.template_dir {
            if !dir.is_dir() {
                return Err(Error::config(format!(
                    "template_dir {} is not a directory",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// On-disk representation of a [`GeneratorConfig`], every field optional
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub root_dir: Option<PathBuf>,
    pub source_glob: Option<String>,
    pub template: Option<String>,
    pub output_strategy: Option<OutputStrategy>,
    pub template_dir: Option<PathBuf>,
    pub format_command: Option<String>,
    pub lint_fix_command: Option<String>,
}

impl ConfigFile {
    /// Load a TOML config file. Relative paths resolve against the file's directory.
    pub async fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading generator configuration");
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let mut file: ConfigFile = toml::from_str(&content)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        file.root_dir = file.root_dir.map(|p| base.join(p));
        file.template_dir = file.template_dir.map(|p| base.join(p));
        Ok(file)
    }

    /// Apply overrides and build a complete configuration
    pub fn into_config(self, overrides: ConfigFile) -> Result<GeneratorConfig> {
        let root_dir = overrides
            .root_dir
            .or(self.root_dir)
            .ok_or_else(|| Error::config("root_dir is required"))?;
        let source_glob = overrides
            .source_glob
            .or(self.source_glob)
            .ok_or_else(|| Error::config("source_glob is required"))?;
        let template_name: TemplateName = overrides
            .template
            .or(self.template)
            .ok_or_else(|| Error::config("template is required"))?
            .parse()?;

        Ok(GeneratorConfig {
            root_dir,
            source_glob,
            template_name,
            output_strategy: overrides.output_strategy.or(self.output_strategy),
            template_dir: overrides.template_dir.or(self.template_dir),
            format_command: overrides.format_command.or(self.format_command),
            lint_fix_command: overrides.lint_fix_command.or(self.lint_fix_command),
        })
    }
}
