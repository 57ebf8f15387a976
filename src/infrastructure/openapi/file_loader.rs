//! File-based schema document loader
//!
//! Resolves the source glob under the root directory; each match is then
//! read, validated and dereferenced on its own.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::GlobBuilder;
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use super::resolver::{RefResolver, normalize};
use super::types::SourceDocument;
use crate::core::error::{Error, Result};
use crate::generation::DocumentLoader;

/// Find every file under `root_dir` matching `source_glob`, sorted by path
pub async fn discover_sources(root_dir: &Path, source_glob: &str) -> Result<Vec<PathBuf>> {
    let absolute = Path::new(source_glob).is_absolute();
    let pattern = source_glob.strip_prefix("./").unwrap_or(source_glob);
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| Error::InvalidGlob {
            pattern: source_glob.to_string(),
            source,
        })?
        .compile_matcher();

    let root = root_dir.to_path_buf();
    let mut paths = tokio::task::spawn_blocking(move || {
        WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let candidate = if absolute {
                    entry.path()
                } else {
                    entry.path().strip_prefix(&root).unwrap_or(entry.path())
                };
                matcher.is_match(candidate)
            })
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    paths.sort();
    Ok(paths)
}

/// Loads OpenAPI documents from local files
pub struct FileDocumentLoader;

impl FileDocumentLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileDocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for FileDocumentLoader {
    async fn load(&self, path: &Path) -> Result<SourceDocument> {
        debug!(path = %path.display(), "Parsing schema document");
        let path = normalize(path);
        let document = read_document(&path)
            .await
            .map_err(|message| Error::schema_parse(&path, message))?;
        validate(&path, &document)?;

        let mut resolver = RefResolver::new();
        resolver.collect(&path, &document).await?;
        let dereferenced = resolver.dereference(&path)?;

        Ok(SourceDocument {
            path,
            document,
            dereferenced,
        })
    }
}

/// Read and parse a JSON or YAML file into a JSON value
pub async fn read_document(path: &Path) -> std::result::Result<JsonValue, String> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read file: {e}"))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse JSON: {e}"))
    } else {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| format!("Failed to parse YAML: {e}"))?;
        yaml_to_json(yaml)
    }
}

/// Convert YAML into JSON, stringifying non-string mapping keys such as `200:`
fn yaml_to_json(value: serde_yaml::Value) -> std::result::Result<JsonValue, String> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => JsonValue::Null,
        Yaml::Bool(b) => JsonValue::Bool(b),
        Yaml::Number(n) => {
            if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .ok_or_else(|| format!("Unsupported number {n}"))?
            }
        }
        Yaml::String(s) => JsonValue::String(s),
        Yaml::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => return Err(format!("Unsupported mapping key {other:?}")),
                };
                map.insert(key, yaml_to_json(value)?);
            }
            JsonValue::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

/// Structural validation of the raw document
fn validate(path: &Path, document: &JsonValue) -> Result<()> {
    let version = document
        .get("openapi")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::schema_parse(path, "Missing 'openapi' version field"))?;

    // openapiv3 models the 3.0 line only
    if version.starts_with("3.0") {
        serde_json::from_value::<openapiv3::OpenAPI>(document.clone()).map_err(|e| {
            Error::schema_parse(path, format!("Not a valid OpenAPI {version} document: {e}"))
        })?;
    } else if document.get("info").and_then(JsonValue::as_object).is_none() {
        return Err(Error::schema_parse(path, "Missing 'info' object"));
    }
    Ok(())
}
