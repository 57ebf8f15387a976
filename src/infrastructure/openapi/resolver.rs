//! `$ref` dereferencing across one document and the files it references
//!
//! Resolution happens in two passes. [`RefResolver::collect`] loads every
//! external file reachable from the root document; [`RefResolver::dereference`]
//! then inlines references synchronously from that cache.

use std::collections::{HashMap, VecDeque};
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::file_loader::read_document;
use crate::core::error::{Error, Result};

/// Resolves the `$ref`s of one root document
#[derive(Debug, Default)]
pub struct RefResolver {
    documents: HashMap<PathBuf, JsonValue>,
}

impl RefResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the root document's transitive external references into the cache
    pub async fn collect(&mut self, root_path: &Path, root: &JsonValue) -> Result<()> {
        let root_path = normalize(root_path);
        self.documents.insert(root_path.clone(), root.clone());

        let mut queue = VecDeque::from([root_path.clone()]);
        while let Some(current) = queue.pop_front() {
            let mut references = Vec::new();
            if let Some(document) = self.documents.get(&current) {
                collect_refs(document, &mut references);
            }

            for reference in references {
                let Some(target) = external_target(&current, &reference) else {
                    continue;
                };
                if self.documents.contains_key(&target) {
                    continue;
                }
                debug!(
                    reference = %reference,
                    target = %target.display(),
                    "Loading external reference"
                );
                let document = read_document(&target).await.map_err(|e| {
                    Error::schema_parse(
                        &root_path,
                        format!("Unable to resolve reference '{reference}': {e}"),
                    )
                })?;
                self.documents.insert(target.clone(), document);
                queue.push_back(target);
            }
        }
        Ok(())
    }

    /// Inline every reference reachable from `root_path`.
    ///
    /// Circular references are left in place as `$ref` objects.
    pub fn dereference(&self, root_path: &Path) -> Result<JsonValue> {
        let root_path = normalize(root_path);
        let root = self.documents.get(&root_path).ok_or_else(|| {
            Error::schema_parse(&root_path, "Document was not collected before dereferencing")
        })?;
        let mut stack = Vec::new();
        self.inline(root, &root_path, &mut stack)
            .map_err(|message| Error::schema_parse(&root_path, message))
    }

    fn inline(
        &self,
        value: &JsonValue,
        base: &Path,
        stack: &mut Vec<(PathBuf, String)>,
    ) -> std::result::Result<JsonValue, String> {
        match value {
            JsonValue::Object(obj) => {
                if let Some(reference) = obj.get("$ref").and_then(JsonValue::as_str) {
                    return self.inline_ref(obj, reference, base, stack);
                }
                let mut resolved = Map::with_capacity(obj.len());
                for (key, val) in obj {
                    resolved.insert(key.clone(), self.inline(val, base, stack)?);
                }
                Ok(JsonValue::Object(resolved))
            }
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.inline(item, base, stack))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            other => Ok(other.clone()),
        }
    }

    fn inline_ref(
        &self,
        obj: &Map<String, JsonValue>,
        reference: &str,
        base: &Path,
        stack: &mut Vec<(PathBuf, String)>,
    ) -> std::result::Result<JsonValue, String> {
        let (file, pointer) = split_reference(reference);
        let target_path = if file.is_empty() {
            base.to_path_buf()
        } else {
            resolve_relative(base, file)
        };

        let key = (target_path.clone(), pointer.to_string());
        if stack.contains(&key) {
            return Ok(JsonValue::Object(obj.clone()));
        }

        let document = self
            .documents
            .get(&target_path)
            .ok_or_else(|| format!("Unable to resolve reference '{reference}'"))?;
        let target = if pointer.is_empty() || pointer == "/" {
            document
        } else {
            document
                .pointer(pointer)
                .ok_or_else(|| format!("Unable to resolve reference '{reference}'"))?
        };

        stack.push(key);
        let resolved = self.inline(target, &target_path, stack);
        stack.pop();
        let mut resolved = resolved?;

        // Keep sibling keys such as `description` or `default`
        if let JsonValue::Object(resolved_obj) = &mut resolved {
            for (k, v) in obj.iter().filter(|(k, _)| k.as_str() != "$ref") {
                resolved_obj.insert(k.clone(), self.inline(v, base, stack)?);
            }
        }
        Ok(resolved)
    }
}

/// Split `file.yaml#/pointer` into its file and pointer parts
pub fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((file, pointer)) => (file, pointer),
        None => (reference, ""),
    }
}

fn external_target(base: &Path, reference: &str) -> Option<PathBuf> {
    let (file, _) = split_reference(reference);
    (!file.is_empty()).then(|| resolve_relative(base, file))
}

fn resolve_relative(base: &Path, file: &str) -> PathBuf {
    let dir = base.parent().unwrap_or_else(|| Path::new(""));
    normalize(&dir.join(file))
}

fn collect_refs(value: &JsonValue, out: &mut Vec<String>) {
    match value {
        JsonValue::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(JsonValue::as_str) {
                out.push(reference.to_string());
            }
            obj.values().for_each(|v| collect_refs(v, out));
        }
        JsonValue::Array(items) => items.iter().for_each(|v| collect_refs(v, out)),
        _ => {}
    }
}

/// Lexically normalize a path, folding `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
