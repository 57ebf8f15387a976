//! Generation orchestration - coordinates the generation workflow

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::context::GenerationContext;
use super::traits::{DocumentLoader, OutputWriter};
use super::types::{GenerationSummary, OutputStrategy};
use crate::core::config::GeneratorConfig;
use crate::core::error::{Error, GenerationFailure, Result};
use crate::infrastructure::generation::PostProcessingPipeline;
use crate::infrastructure::openapi::{FileDocumentLoader, discover_sources};
use crate::infrastructure::output::FileSystemOutput;
use crate::infrastructure::templates::{TemplateName, TemplateService};

/// Orchestrates one generation run
pub struct Generator {
    loader: Arc<dyn DocumentLoader>,
    writer: Arc<dyn OutputWriter>,
    post_processing: PostProcessingPipeline,
}

impl Generator {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        writer: Arc<dyn OutputWriter>,
        post_processing: PostProcessingPipeline,
    ) -> Self {
        Self {
            loader,
            writer,
            post_processing,
        }
    }

    /// Filesystem loader and writer, post-processing taken from `config`
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            Arc::new(FileDocumentLoader::new()),
            Arc::new(FileSystemOutput::new()),
            PostProcessingPipeline::from_config(config),
        )
    }

    /// Execute the generation workflow
    ///
    /// Every document is parsed and extracted before anything is written, so
    /// a single broken document aborts the run with no output at all. Render
    /// and write failures are collected per document and reported together
    /// once post-processing has run.
    pub async fn run(&self, config: &GeneratorConfig) -> Result<GenerationSummary> {
        config.validate()?;
        let root_dir = tokio::fs::canonicalize(&config.root_dir).await?;
        let strategy = config.output_strategy();
        let template = config.template_name;

        let service = Arc::new(TemplateService::new(config.template_dir.as_deref()).await?);

        let paths = discover_sources(&root_dir, &config.source_glob).await?;
        info!(count = paths.len(), "Found schemas, parsing");
        let documents = try_join_all(paths.iter().map(|path| self.loader.load(path))).await?;

        let contexts = documents
            .iter()
            .map(|document| {
                GenerationContext::extract(document).map(|context| (document.path.clone(), context))
            })
            .collect::<Result<Vec<_>>>()?;
        drop(documents);

        info!(
            count = contexts.len(),
            template = %template,
            strategy = %strategy,
            "Generating artifacts"
        );

        let mut summary = GenerationSummary {
            documents: contexts.len(),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        for (source, context) in contexts {
            let service = service.clone();
            let writer = self.writer.clone();
            let root_dir = root_dir.clone();
            tasks.spawn(async move {
                let outcome = generate_document(
                    &service,
                    writer.as_ref(),
                    strategy,
                    template,
                    &context,
                    &source,
                    &root_dir,
                )
                .await;
                (source, outcome)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (source, outcome) = joined.map_err(|e| Error::Io(std::io::Error::other(e)))?;
            match outcome {
                Ok(written) if written.is_empty() => summary.skipped += 1,
                Ok(written) => summary.written.extend(written),
                Err(error) => {
                    error!(path = %source.display(), error = %error, "Generation failed");
                    failures.push(GenerationFailure {
                        source_path: source,
                        error,
                    });
                }
            }
        }
        summary.written.sort();

        debug!(
            processors = ?self.post_processing.processor_names(),
            "Post-processing generated files"
        );
        let report = self.post_processing.run(&root_dir).await?;
        if !report.is_clean() {
            warn!(
                failed = report.failures.len(),
                processed = report.processed.len(),
                "Post-processing left files untouched"
            );
        }
        summary.post_process_failures = report
            .failures
            .into_iter()
            .map(|failure| failure.source_path)
            .collect();

        if !failures.is_empty() {
            failures.sort_by(|a, b| a.source_path.cmp(&b.source_path));
            return Err(Error::Generation { failures });
        }

        info!(
            written = summary.written.len(),
            skipped = summary.skipped,
            "Generation complete"
        );
        Ok(summary)
    }
}

/// Run a configuration with the filesystem loader and writer
pub async fn generate(config: &GeneratorConfig) -> Result<GenerationSummary> {
    Generator::from_config(config).run(config).await
}

async fn generate_document(
    service: &TemplateService,
    writer: &dyn OutputWriter,
    strategy: OutputStrategy,
    template: TemplateName,
    context: &GenerationContext,
    source: &Path,
    root_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let artifacts = strategy.compile(service, template, context, source, root_dir)?;
    if artifacts.is_empty() {
        info!(path = %source.display(), "Nothing to generate, skipping");
        return Ok(Vec::new());
    }

    info!(path = %source.display(), artifacts = artifacts.len(), "Generating");
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        writer.write(artifact).await?;
        written.push(artifact.path.clone());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::CompiledArtifact;
    use crate::generation::traits::PostProcessor;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    const RULES: &str = r#"openapi: 3.0.0
info:
  title: Rules API
  version: '2023-10-31'
paths:
  /api/rule:
    get:
      operationId: ReadRule
      parameters:
        - name: id
          in: query
          required: true
          schema:
            type: string
      responses:
        200:
          description: OK
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Rule'
components:
  schemas:
    Rule:
      type: object
      properties:
        name:
          type: string
"#;

    /// Records artifacts instead of writing them; fails for paths containing `fail`
    #[derive(Default)]
    struct RecordingWriter {
        written: Mutex<Vec<CompiledArtifact>>,
    }

    #[async_trait]
    impl OutputWriter for RecordingWriter {
        async fn write(&self, artifact: &CompiledArtifact) -> Result<()> {
            if artifact.path.to_string_lossy().contains("fail") {
                return Err(Error::Write {
                    path: artifact.path.clone(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.written.lock().unwrap().push(artifact.clone());
            Ok(())
        }
    }

    struct RejectingProcessor;

    #[async_trait]
    impl PostProcessor for RejectingProcessor {
        fn name(&self) -> &str {
            "reject"
        }

        async fn process(&self, path: &Path) -> Result<()> {
            Err(Error::post_process(path, "rejected"))
        }
    }

    fn generator(writer: Arc<RecordingWriter>) -> Generator {
        Generator::new(
            Arc::new(FileDocumentLoader::new()),
            writer,
            PostProcessingPipeline::new(Vec::new()),
        )
    }

    #[tokio::test]
    async fn test_run_compiles_bundle_per_document() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("rules.schema.yaml"), RULES).unwrap();
        let writer = Arc::new(RecordingWriter::default());

        let config = GeneratorConfig::new(
            dir.path(),
            "*.schema.yaml",
            TemplateName::ZodOperationSchema,
        );
        let summary = generator(writer.clone()).run(&config).await.unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.written, vec![root.join("rules.gen.ts")]);

        let written = writer.written.lock().unwrap();
        assert!(written[0].content.contains("export const ReadRuleResponse = Rule;"));
    }

    #[tokio::test]
    async fn test_write_failures_are_aggregated() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("fail.schema.yaml"), RULES).unwrap();
        std::fs::write(dir.path().join("ok.schema.yaml"), RULES).unwrap();
        let writer = Arc::new(RecordingWriter::default());

        let config = GeneratorConfig::new(
            dir.path(),
            "*.schema.yaml",
            TemplateName::ZodOperationSchema,
        );
        let err = generator(writer.clone()).run(&config).await.unwrap_err();

        match err {
            Error::Generation { failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].source_path.ends_with("fail.schema.yaml"));
                assert!(matches!(failures[0].error, Error::Write { .. }));
            }
            other => panic!("expected aggregated failure, got {other:?}"),
        }
        // The healthy document was still generated
        assert_eq!(writer.written.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_operation_id_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.schema.yaml"), RULES).unwrap();
        std::fs::write(
            dir.path().join("b.schema.yaml"),
            RULES.replace(
                "paths:\n",
                concat!(
                    "paths:\n  /api/other:\n    get:\n      operationId: ReadRule\n",
                    "      responses:\n        200:\n          description: OK\n",
                ),
            ),
        )
        .unwrap();
        let writer = Arc::new(RecordingWriter::default());

        let config = GeneratorConfig::new(
            dir.path(),
            "*.schema.yaml",
            TemplateName::ZodOperationSchema,
        );
        let err = generator(writer.clone()).run(&config).await.unwrap_err();

        assert!(matches!(err, Error::SchemaParse { .. }));
        assert!(writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_process_failures_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("rules.schema.yaml"), RULES).unwrap();
        let generator = Generator::new(
            Arc::new(FileDocumentLoader::new()),
            Arc::new(FileSystemOutput::new()),
            PostProcessingPipeline::new(vec![Arc::new(RejectingProcessor)]),
        );

        let config = GeneratorConfig::new(
            dir.path(),
            "*.schema.yaml",
            TemplateName::ZodOperationSchema,
        );
        let summary = generator.run(&config).await.unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(summary.post_process_failures, vec![root.join("rules.gen.ts")]);
        assert!(logs_contain("Post-processing left files untouched"));
    }

    #[tokio::test]
    async fn test_invalid_root_is_a_config_error() {
        let config = GeneratorConfig::new("/definitely/not/here", "*.yaml", TemplateName::Route);
        let err = generate(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
