//! oapigen CLI entrypoint
//! Parses command-line arguments and dispatches to the generator.
#![deny(unsafe_code)]

use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use oapigen::core::ConfigFile;
use oapigen::generation::{self, OutputStrategy};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oapigen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate artifacts for every schema document matching a glob
    Generate {
        /// TOML configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// Root of the source tree
        #[arg(long)]
        root_dir: Option<PathBuf>,
        /// Glob of schema documents, relative to the root directory
        #[arg(long)]
        source_glob: Option<String>,
        /// Template to apply: zod_operation_schema, route or route_handler_function
        #[arg(long)]
        template: Option<String>,
        /// Output strategy: single_artifact or per_operation
        #[arg(long)]
        output_strategy: Option<OutputStrategy>,
        /// Directory with templates overriding the embedded ones
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// Formatter command run on each generated file, `{file}` is the file path
        #[arg(long)]
        format_command: Option<String>,
        /// Lint fix command run on each generated file, `{file}` is the file path
        #[arg(long)]
        lint_fix_command: Option<String>,
    },
    /// Delete every generated file below a root directory
    Clear {
        /// Root of the source tree
        #[arg(long)]
        root_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with default level INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            config,
            root_dir,
            source_glob,
            template,
            output_strategy,
            template_dir,
            format_command,
            lint_fix_command,
        } => {
            let file = match &config {
                Some(path) => ConfigFile::load(path)
                    .await
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => ConfigFile::default(),
            };
            let overrides = ConfigFile {
                root_dir,
                source_glob,
                template,
                output_strategy,
                template_dir,
                format_command,
                lint_fix_command,
            };
            let config = file
                .into_config(overrides)
                .context("Invalid generator configuration")?;

            info!(
                root_dir = %config.root_dir.display(),
                source_glob = %config.source_glob,
                template = %config.template_name,
                "Starting generation"
            );
            let summary = generation::generate(&config)
                .await
                .context("Generation failed")?;

            for path in &summary.post_process_failures {
                warn!(path = %path.display(), "Generated file was left unformatted");
            }
            info!(
                documents = summary.documents,
                written = summary.written.len(),
                skipped = summary.skipped,
                "Done"
            );
        }
        Commands::Clear { root_dir } => {
            let removed = generation::clear(&root_dir)
                .await
                .context("Failed to clear generated files")?;
            info!(count = removed, "Cleared generated files");
        }
    }
    Ok(())
}
