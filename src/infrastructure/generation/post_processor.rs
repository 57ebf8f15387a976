//! Post-processors applied to generated files
//!
//! Every processor rewrites one file in place and is idempotent: running a
//! processor over its own output leaves the file untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::config::GeneratorConfig;
use crate::core::error::{Error, GenerationFailure, Result};
use crate::generation::PostProcessor;
use crate::generation::paths::find_generated_files;
use crate::infrastructure::shell::{CommandExecutor, ShellCommandExecutor};

/// Files processed at the same time
const CONCURRENCY: usize = 8;

static NAMED_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^import (type )?\{([^}]*)\} from '([^']+)';\s*$").expect("valid import regex")
});

async fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| Error::post_process(path, format!("Failed to read file: {e}")))
}

async fn write_if_changed(path: &Path, original: &str, updated: &str) -> Result<()> {
    if original == updated {
        return Ok(());
    }
    fs::write(path, updated)
        .await
        .map_err(|e| Error::post_process(path, format!("Failed to write file: {e}")))
}

/// Normalize whitespace the way a formatter would
///
/// LF line endings, no trailing whitespace, no leading blank lines, at most
/// one consecutive blank line and exactly one trailing newline.
pub fn format_source(source: &str) -> String {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(normalized.len());
    let mut blank_run = 0;

    for line in normalized.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if out.is_empty() {
                continue;
            }
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

/// Merge repeated single-line named imports of the same module
pub fn merge_duplicate_imports(source: &str) -> String {
    let mut merged: HashMap<(bool, String), Vec<String>> = HashMap::new();
    let mut occurrences: HashMap<(bool, String), usize> = HashMap::new();

    for line in source.lines() {
        if let Some(captures) = NAMED_IMPORT.captures(line) {
            let key = (captures.get(1).is_some(), captures[3].to_string());
            let names = merged.entry(key.clone()).or_default();
            for name in captures[2].split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
            *occurrences.entry(key).or_default() += 1;
        }
    }
    if occurrences.values().all(|count| *count < 2) {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len());
    let mut emitted = Vec::new();
    for line in source.split_inclusive('\n') {
        let Some(captures) = NAMED_IMPORT.captures(line.trim_end_matches(['\n', '\r'])) else {
            out.push_str(line);
            continue;
        };
        let key = (captures.get(1).is_some(), captures[3].to_string());
        if occurrences[&key] < 2 {
            out.push_str(line);
            continue;
        }
        if emitted.contains(&key) {
            continue;
        }
        let keyword = if key.0 { "import type" } else { "import" };
        out.push_str(&format!(
            "{keyword} {{ {} }} from '{}';",
            merged[&key].join(", "),
            key.1
        ));
        if line.ends_with('\n') {
            out.push('\n');
        }
        emitted.push(key);
    }
    out
}

/// Built-in whitespace formatter
pub struct CanonicalFormatter;

impl CanonicalFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CanonicalFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostProcessor for CanonicalFormatter {
    fn name(&self) -> &str {
        "canonical_formatter"
    }

    async fn process(&self, path: &Path) -> Result<()> {
        let original = read(path).await?;
        write_if_changed(path, &original, &format_source(&original)).await
    }
}

/// Built-in lint fixer for generated imports
pub struct LintFixer;

impl LintFixer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LintFixer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostProcessor for LintFixer {
    fn name(&self) -> &str {
        "lint_fixer"
    }

    async fn process(&self, path: &Path) -> Result<()> {
        let original = read(path).await?;
        write_if_changed(path, &original, &merge_duplicate_imports(&original)).await
    }
}

/// Runs an external tool over each file
///
/// `{file}` in the command line is replaced with the quoted file path; a
/// command without the placeholder gets the path appended.
pub struct CommandPostProcessor {
    name: String,
    command: String,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandPostProcessor {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            executor,
        }
    }

    fn command_line(&self, path: &Path) -> String {
        let quoted = shell_quote(&path.to_string_lossy());
        if self.command.contains("{file}") {
            self.command.replace("{file}", &quoted)
        } else {
            format!("{} {quoted}", self.command)
        }
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[async_trait]
impl PostProcessor for CommandPostProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, path: &Path) -> Result<()> {
        let command = self.command_line(path);
        let working_dir = path.parent().unwrap_or_else(|| Path::new("."));
        debug!(command = %command, "Running post-processing command");

        let result = self.executor.execute(&command, working_dir).await?;
        if !result.is_success() {
            return Err(Error::post_process(
                path,
                format!(
                    "`{command}` exited with code {}: {}",
                    result.exit_code,
                    result.stderr.trim()
                ),
            ));
        }
        Ok(())
    }
}

/// Outcome of one post-processing pass
#[derive(Debug, Default)]
pub struct PostProcessReport {
    /// Files every processor succeeded on
    pub processed: Vec<PathBuf>,
    pub failures: Vec<GenerationFailure>,
}

impl PostProcessReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered processors applied to every generated file below a root
#[derive(Clone)]
pub struct PostProcessingPipeline {
    processors: Vec<Arc<dyn PostProcessor>>,
}

impl PostProcessingPipeline {
    pub fn new(processors: Vec<Arc<dyn PostProcessor>>) -> Self {
        Self { processors }
    }

    /// Built-in processors followed by the commands named in `config`
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::with_executor(config, Arc::new(ShellCommandExecutor::new()))
    }

    pub fn with_executor(config: &GeneratorConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let mut processors: Vec<Arc<dyn PostProcessor>> =
            vec![Arc::new(LintFixer::new()), Arc::new(CanonicalFormatter::new())];

        if let Some(command) = &config.lint_fix_command {
            processors.push(Arc::new(CommandPostProcessor::new(
                "lint_fix_command",
                command.clone(),
                executor.clone(),
            )));
        }
        if let Some(command) = &config.format_command {
            processors.push(Arc::new(CommandPostProcessor::new(
                "format_command",
                command.clone(),
                executor,
            )));
        }
        Self::new(processors)
    }

    pub fn processor_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Process every generated file below `root_dir`. Per-file failures are
    /// logged and reported, never returned as errors.
    pub async fn run(&self, root_dir: &Path) -> Result<PostProcessReport> {
        let files = find_generated_files(root_dir).await?;
        info!(count = files.len(), "Post-processing generated files");

        let outcomes: Vec<(PathBuf, Result<()>)> = stream::iter(files)
            .map(|path| async move {
                let outcome = self.process_file(&path).await;
                (path, outcome)
            })
            .buffer_unordered(CONCURRENCY)
            .collect()
            .await;

        let mut report = PostProcessReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(()) => report.processed.push(path),
                Err(error) => report.failures.push(GenerationFailure {
                    source_path: path,
                    error,
                }),
            }
        }
        report.processed.sort();
        report
            .failures
            .sort_by(|a, b| a.source_path.cmp(&b.source_path));
        Ok(report)
    }

    async fn process_file(&self, path: &Path) -> Result<()> {
        for processor in &self.processors {
            if let Err(e) = processor.process(path).await {
                warn!(
                    path = %path.display(),
                    processor = processor.name(),
                    error = %e,
                    "Post-processing failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }
}
