//! Parsed schema documents

use std::path::PathBuf;

use serde_json::Value as JsonValue;

/// A parsed OpenAPI document, owned for the duration of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Path the document was loaded from
    pub path: PathBuf,
    /// The document as written, `$ref`s untouched
    pub document: JsonValue,
    /// The same document with every resolvable `$ref` inlined
    pub dereferenced: JsonValue,
}

impl SourceDocument {
    /// Look up a value by JSON pointer, following local `$ref`s at the
    /// target. External references are answered from the dereferenced copy.
    pub fn follow(&self, pointer: &str) -> Option<&JsonValue> {
        let mut current = self.document.pointer(pointer)?;
        // A chain longer than this is a cycle
        for _ in 0..32 {
            match current.get("$ref").and_then(JsonValue::as_str) {
                Some(reference) if reference.starts_with('#') => {
                    current = self.document.pointer(&reference[1..])?;
                }
                Some(_) => return self.dereferenced.pointer(pointer),
                None => return Some(current),
            }
        }
        None
    }
}

/// Escape a key for use as a JSON pointer segment
pub fn pointer_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
