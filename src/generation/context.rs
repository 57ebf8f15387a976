//! Generation context - the intermediate representation handed to templates
//!
//! Extraction is a pure function of a [`SourceDocument`]: the same document
//! always yields the same context, in document order.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use super::paths::{GENERATED_SUFFIX, HANDLER_PREFIX};
use crate::core::error::{Error, Result};
use crate::core::utils::{to_pascal_case, to_snake_case};
use crate::infrastructure::openapi::resolver::split_reference;
use crate::infrastructure::openapi::{SourceDocument, pointer_segment};
use crate::infrastructure::templates::helpers::ref_name;

/// Verbs in the order they are extracted from a path item
const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Overrides the directory route artifacts are written to
pub const IMPLEMENTATION_PATH_EXTENSION: &str = "x-codegen-implementation-path";
/// `false` excludes an operation from generation
pub const CODEGEN_ENABLED_EXTENSION: &str = "x-codegen-enabled";
/// Extra tags attached to a generated route
pub const ROUTE_TAGS_EXTENSION: &str = "x-codegen-route-tags";
/// `true` marks a route as internal
pub const INTERNAL_EXTENSION: &str = "x-internal";

/// Everything a template needs to know about one source document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationContext {
    pub info: ApiInfo,
    pub operations: Vec<Operation>,
    pub components: Option<Vec<Component>>,
    pub imports: Vec<Import>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
}

/// Route visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteAccess {
    Public,
    Internal,
}

/// One API operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub operation_id: String,
    /// PascalCase prefix of every generated type
    pub type_name: String,
    /// snake_case form used for file names
    pub snake_name: String,
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub access: RouteAccess,
    pub route_tags: Vec<String>,
    pub implementation_path: Option<String>,
    pub request_query: Option<JsonValue>,
    pub request_params: Option<JsonValue>,
    pub request_body: Option<JsonValue>,
    pub response: Option<JsonValue>,
}

impl Operation {
    /// `<snake_id>_route.gen.ts`
    pub fn route_file_name(&self) -> String {
        format!("{}_route{GENERATED_SUFFIX}", self.snake_name)
    }

    /// `handle_<snake_id>_request.gen.ts`
    pub fn handler_file_name(&self) -> String {
        format!("{HANDLER_PREFIX}{}_request{GENERATED_SUFFIX}", self.snake_name)
    }

    /// Names of the types this operation contributes to its bundle
    pub fn type_names(&self) -> Vec<String> {
        [
            (self.request_query.is_some(), "RequestQuery"),
            (self.request_params.is_some(), "RequestParams"),
            (self.request_body.is_some(), "RequestBody"),
            (self.response.is_some(), "Response"),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, suffix)| format!("{}{suffix}", self.type_name))
        .collect()
    }
}

/// A named reusable schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub schema: JsonValue,
}

/// Names imported from the generated counterpart of another document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub module: String,
    pub names: Vec<String>,
}

impl GenerationContext {
    /// Extract the context of a parsed document
    pub fn extract(source: &SourceDocument) -> Result<Self> {
        let document = &source.document;
        let info = ApiInfo {
            title: string_at(document, "/info/title").unwrap_or_default(),
            version: string_at(document, "/info/version").unwrap_or_default(),
        };

        let operations = extract_operations(source)?;
        let components = document
            .pointer("/components/schemas")
            .and_then(JsonValue::as_object)
            .filter(|schemas| !schemas.is_empty())
            .map(|schemas| {
                schemas
                    .iter()
                    .map(|(name, schema)| Component {
                        name: name.clone(),
                        schema: schema.clone(),
                    })
                    .collect::<Vec<_>>()
            });

        let mut imports = ImportCollector::default();
        for component in components.iter().flatten() {
            imports.visit(&component.schema);
        }
        for operation in &operations {
            for schema in [
                &operation.request_query,
                &operation.request_params,
                &operation.request_body,
                &operation.response,
            ]
            .into_iter()
            .flatten()
            {
                imports.visit(schema);
            }
        }

        Ok(Self {
            info,
            operations,
            components,
            imports: imports.finish(),
        })
    }

    /// A document with neither operations nor components produces no output
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.components.is_none()
    }
}

fn string_at(value: &JsonValue, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(JsonValue::as_str)
        .map(String::from)
}

fn string_list(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn extract_operations(source: &SourceDocument) -> Result<Vec<Operation>> {
    let Some(paths) = source.document.get("paths").and_then(JsonValue::as_object) else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut operations = Vec::new();
    for path in paths.keys() {
        let path_pointer = format!("/paths/{}", pointer_segment(path));
        let Some(path_item) = source.follow(&path_pointer) else {
            continue;
        };

        for method in HTTP_METHODS {
            let Some(item) = path_item.get(*method).and_then(JsonValue::as_object) else {
                continue;
            };
            if item.get(CODEGEN_ENABLED_EXTENSION) == Some(&JsonValue::Bool(false)) {
                continue;
            }

            let operation_id = item
                .get("operationId")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| {
                    Error::schema_parse(
                        &source.path,
                        format!("Operation {} {path} has no operationId", method.to_uppercase()),
                    )
                })?;
            if !seen.insert(operation_id.to_string()) {
                return Err(Error::schema_parse(
                    &source.path,
                    format!("Duplicate operationId '{operation_id}'"),
                ));
            }

            let operation_pointer = format!("{path_pointer}/{method}");
            operations.push(build_operation(
                source,
                path,
                method,
                operation_id,
                item,
                &path_pointer,
                &operation_pointer,
            ));
        }
    }
    Ok(operations)
}

fn build_operation(
    source: &SourceDocument,
    path: &str,
    method: &str,
    operation_id: &str,
    item: &Map<String, JsonValue>,
    path_pointer: &str,
    operation_pointer: &str,
) -> Operation {
    let parameters = merge_parameters(source, path_pointer, operation_pointer);

    let request_body = source
        .follow(&format!("{operation_pointer}/requestBody"))
        .and_then(json_schema)
        .cloned();

    let response = source
        .follow(&format!("{operation_pointer}/responses"))
        .and_then(JsonValue::as_object)
        .and_then(|responses| {
            responses
                .keys()
                .find(|code| code.as_str() == "200")
                .or_else(|| responses.keys().find(|code| code.starts_with('2')))
                .cloned()
        })
        .and_then(|code| {
            source.follow(&format!(
                "{operation_pointer}/responses/{}",
                pointer_segment(&code)
            ))
        })
        .and_then(json_schema)
        .cloned();

    let internal = item.get(INTERNAL_EXTENSION) == Some(&JsonValue::Bool(true));

    Operation {
        operation_id: operation_id.to_string(),
        type_name: type_name(operation_id),
        snake_name: to_snake_case(operation_id),
        method: method.to_string(),
        path: path.to_string(),
        summary: item.get("summary").and_then(JsonValue::as_str).map(String::from),
        description: item
            .get("description")
            .and_then(JsonValue::as_str)
            .map(String::from),
        tags: string_list(item.get("tags")),
        access: if internal {
            RouteAccess::Internal
        } else {
            RouteAccess::Public
        },
        route_tags: string_list(item.get(ROUTE_TAGS_EXTENSION)),
        implementation_path: item
            .get(IMPLEMENTATION_PATH_EXTENSION)
            .and_then(JsonValue::as_str)
            .map(String::from),
        request_query: parameters_schema(&parameters, "query"),
        request_params: parameters_schema(&parameters, "path"),
        request_body,
        response,
    }
}

/// Exported type prefix; an id that already is a TypeScript identifier is kept as written
fn type_name(operation_id: &str) -> String {
    let mut chars = operation_id.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        operation_id.to_string()
    } else {
        to_pascal_case(operation_id)
    }
}

fn json_schema(holder: &JsonValue) -> Option<&JsonValue> {
    holder.pointer("/content/application~1json/schema")
}

/// Path-level parameters followed by operation parameters; the operation
/// wins when both declare the same `name` and `in`.
fn merge_parameters<'a>(
    source: &'a SourceDocument,
    path_pointer: &str,
    operation_pointer: &str,
) -> Vec<&'a JsonValue> {
    let mut merged: Vec<&JsonValue> = Vec::new();
    for owner in [path_pointer, operation_pointer] {
        let count = source
            .follow(&format!("{owner}/parameters"))
            .and_then(JsonValue::as_array)
            .map_or(0, Vec::len);

        for index in 0..count {
            let Some(parameter) = source.follow(&format!("{owner}/parameters/{index}")) else {
                continue;
            };
            let key = (parameter.get("name"), parameter.get("in"));
            merged.retain(|existing| (existing.get("name"), existing.get("in")) != key);
            merged.push(parameter);
        }
    }
    merged
}

/// Fold the parameters found in `location` into one object schema
fn parameters_schema(parameters: &[&JsonValue], location: &str) -> Option<JsonValue> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for parameter in parameters
        .iter()
        .filter(|p| p.get("in").and_then(JsonValue::as_str) == Some(location))
    {
        let Some(name) = parameter.get("name").and_then(JsonValue::as_str) else {
            continue;
        };
        let mut schema = parameter.get("schema").cloned().unwrap_or_else(|| json!({}));
        if let (Some(description), JsonValue::Object(obj)) =
            (parameter.get("description"), &mut schema)
        {
            obj.entry("description").or_insert_with(|| description.clone());
        }
        if parameter.get("required") == Some(&JsonValue::Bool(true)) {
            required.push(JsonValue::String(name.to_string()));
        }
        properties.insert(name.to_string(), schema);
    }

    if properties.is_empty() {
        return None;
    }
    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = JsonValue::Array(required);
    }
    Some(schema)
}

/// Collects external references in first-appearance order
#[derive(Default)]
struct ImportCollector {
    imports: Vec<Import>,
}

impl ImportCollector {
    fn visit(&mut self, value: &JsonValue) {
        match value {
            JsonValue::Object(obj) => {
                if let Some(reference) = obj.get("$ref").and_then(JsonValue::as_str) {
                    self.add(reference);
                }
                obj.values().for_each(|v| self.visit(v));
            }
            JsonValue::Array(items) => items.iter().for_each(|v| self.visit(v)),
            _ => {}
        }
    }

    fn add(&mut self, reference: &str) {
        let (file, _) = split_reference(reference);
        if file.is_empty() {
            return;
        }
        let module = generated_module(file);
        let name = ref_name(reference);

        match self.imports.iter_mut().find(|import| import.module == module) {
            Some(import) => {
                if !import.names.contains(&name) {
                    import.names.push(name);
                }
            }
            None => self.imports.push(Import {
                module,
                names: vec![name],
            }),
        }
    }

    fn finish(self) -> Vec<Import> {
        self.imports
    }
}

/// `../model/common.schema.yaml` → `../model/common.gen`
fn generated_module(file: &str) -> String {
    let (dir, base) = match file.rsplit_once('/') {
        Some((dir, base)) => (Some(dir), base),
        None => (None, file),
    };
    let stem = base.split('.').next().unwrap_or(base);
    let module = match dir {
        Some(dir) => format!("{dir}/{stem}.gen"),
        None => format!("{stem}.gen"),
    };
    if module.starts_with("./") || module.starts_with("../") || module.starts_with('/') {
        module
    } else {
        format!("./{module}")
    }
}
