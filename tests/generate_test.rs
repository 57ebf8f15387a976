//! Integration tests for the generate and clear workflows

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use oapigen::core::{Error, GeneratorConfig};
use oapigen::generation::{OutputStrategy, clear, generate};
use oapigen::infrastructure::generation::post_processor::format_source;
use oapigen::infrastructure::templates::TemplateName;
use tempfile::TempDir;
use walkdir::WalkDir;

const SOURCE_GLOB: &str = "./api/**/*.schema.yaml";

/// Copy the fixture tree into a fresh temp dir and return it with its canonical path
fn fixture_tree() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    for entry in WalkDir::new(&fixtures) {
        let entry = entry.unwrap();
        let target = dir.path().join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).unwrap();
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn generated_files(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".gen.ts"))
        .map(|entry| {
            let content = std::fs::read_to_string(entry.path()).unwrap();
            (entry.path().strip_prefix(root).unwrap().to_path_buf(), content)
        })
        .collect()
}

fn relative(paths: &[PathBuf], root: &Path) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

#[tokio::test]
async fn test_bundle_per_document_and_empty_documents_skipped() {
    let (_dir, root) = fixture_tree();
    let config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::ZodOperationSchema);

    let summary = generate(&config).await.unwrap();

    assert_eq!(summary.documents, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        relative(&summary.written, &root),
        vec![
            PathBuf::from("api/model/common.gen.ts"),
            PathBuf::from("api/rules/read_rule.gen.ts"),
        ]
    );
    assert!(!root.join("api/rules/empty.gen.ts").exists());

    let bundle = std::fs::read_to_string(root.join("api/rules/read_rule.gen.ts")).unwrap();
    assert!(bundle.contains("import { RuleResponse, RuleTagArray } from '../model/common.gen';"));
    assert!(bundle.contains("export const ReadRuleRequestQuery = z.object({"));
    assert!(
        bundle.contains("  /**\n   * The rule's `id` value.\n   */\n  id: z.string().optional(),")
    );
    assert!(
        bundle.contains("export const EnableRuleRequestParams = z.object({\n  id: z.string(),\n});")
    );
    assert!(bundle.contains("export const EnableRuleResponse = RuleResponse;"));

    let common = std::fs::read_to_string(root.join("api/model/common.gen.ts")).unwrap();
    assert!(common.contains("export const RuleName = z.string().min(1);"));
    assert!(common.contains("  enabled: z.boolean().optional().default(true),"));
}

#[tokio::test]
async fn test_route_template_emits_two_files_per_operation() {
    let (_dir, root) = fixture_tree();
    let config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::Route);
    assert_eq!(config.output_strategy(), OutputStrategy::PerOperation);

    let summary = generate(&config).await.unwrap();

    assert_eq!(
        relative(&summary.written, &root),
        vec![
            PathBuf::from("api/rules/handle_read_rule_request.gen.ts"),
            PathBuf::from("api/rules/read_rule_route.gen.ts"),
            PathBuf::from("server/routes/enable_rule/enable_rule_route.gen.ts"),
            PathBuf::from("server/routes/enable_rule/handle_enable_rule_request.gen.ts"),
        ]
    );
}

#[tokio::test]
async fn test_implementation_path_changes_only_the_output_directory() {
    let (_dir, root) = fixture_tree();
    let config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::Route);
    generate(&config).await.unwrap();

    let default_route =
        std::fs::read_to_string(root.join("api/rules/read_rule_route.gen.ts")).unwrap();
    assert!(default_route.contains("from './read_rule.gen';"));
    assert!(default_route.contains("access: 'public',"));

    let overridden = std::fs::read_to_string(
        root.join("server/routes/enable_rule/enable_rule_route.gen.ts"),
    )
    .unwrap();
    assert!(overridden.contains(
        "import { EnableRuleRequestParams, EnableRuleRequestBody } \
         from './../../../api/rules/read_rule.gen';"
    ));
    assert!(overridden.contains("access: 'internal',"));
    assert!(overridden.contains("tags: ['access:securitySolution'],"));
    assert!(overridden.contains("path: '/api/detection_engine/rules/{id}/_enable',"));
}

#[tokio::test]
async fn test_generate_is_idempotent_and_canonical() {
    let (_dir, root) = fixture_tree();
    let config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::ZodOperationSchema);

    generate(&config).await.unwrap();
    let first = generated_files(&root);
    generate(&config).await.unwrap();
    let second = generated_files(&root);

    assert_eq!(first, second);
    for content in first.values() {
        assert_eq!(&format_source(content), content);
    }
}

#[tokio::test]
async fn test_clear_generate_clear_leaves_nothing() {
    let (_dir, root) = fixture_tree();

    clear(&root).await.unwrap();
    let mut config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::Route);
    generate(&config).await.unwrap();
    config.template_name = TemplateName::ZodOperationSchema;
    generate(&config).await.unwrap();
    assert_eq!(generated_files(&root).len(), 6);

    assert_eq!(clear(&root).await.unwrap(), 6);
    assert!(generated_files(&root).is_empty());
    assert!(root.join("server/routes/enable_rule/index.ts").exists());
}

#[tokio::test]
async fn test_broken_document_aborts_with_no_output() {
    let (_dir, root) = fixture_tree();
    std::fs::write(
        root.join("api/rules/broken.schema.yaml"),
        "openapi: 3.0.0\ninfo:\n  title: Broken\n  version: '1'\npaths: {}\ncomponents:\n  schemas:\n    Broken:\n      $ref: '#/components/schemas/DoesNotExist'\n",
    )
    .unwrap();

    let config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::ZodOperationSchema);
    let err = generate(&config).await.unwrap_err();

    match err {
        Error::SchemaParse { path, .. } => assert!(path.ends_with("broken.schema.yaml")),
        other => panic!("expected a schema parse error, got {other:?}"),
    }
    assert!(generated_files(&root).is_empty());
}

#[tokio::test]
async fn test_template_dir_override_is_used() {
    let (_dir, root) = fixture_tree();
    let templates = TempDir::new().unwrap();
    std::fs::write(
        templates.path().join("zod_operation_schema.ts.tera"),
        "// {{ info.title }}: {{ operations | length }} operation(s)\n",
    )
    .unwrap();

    let mut config = GeneratorConfig::new(
        &root,
        "./api/rules/*.schema.yaml",
        TemplateName::ZodOperationSchema,
    );
    config.template_dir = Some(templates.path().to_path_buf());
    generate(&config).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(root.join("api/rules/read_rule.gen.ts")).unwrap(),
        "// Read Rule API endpoint: 2 operation(s)\n"
    );
}

#[tokio::test]
async fn test_explicit_strategy_overrides_template_default() {
    let (_dir, root) = fixture_tree();
    let mut config = GeneratorConfig::new(
        &root,
        "./api/rules/*.schema.yaml",
        TemplateName::ZodOperationSchema,
    );
    config.output_strategy = Some(OutputStrategy::PerOperation);

    let summary = generate(&config).await.unwrap();
    assert_eq!(summary.written.len(), 4);
    assert!(!root.join("api/rules/read_rule.gen.ts").exists());
}

#[tokio::test]
async fn test_handler_template_defaults_to_per_operation() {
    let (_dir, root) = fixture_tree();
    let config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::RouteHandlerFunction);

    let summary = generate(&config).await.unwrap();

    assert_eq!(summary.written.len(), 4);
    let handler =
        std::fs::read_to_string(root.join("api/rules/handle_read_rule_request.gen.ts")).unwrap();
    assert!(handler.contains("export const handleReadRuleRequest = async ("));
}

#[tokio::test]
async fn test_route_template_as_single_artifact_is_rejected_before_reading() {
    let (_dir, root) = fixture_tree();
    let mut config = GeneratorConfig::new(&root, SOURCE_GLOB, TemplateName::Route);
    config.output_strategy = Some(OutputStrategy::SingleArtifact);

    let err = generate(&config).await.unwrap_err();

    assert!(matches!(err, Error::Config(_)), "unexpected error: {err}");
    assert!(generated_files(&root).is_empty());
}
