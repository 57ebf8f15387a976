//! Helper filters registered on every template registry.
//!
//! | filter        | input            | output                              |
//! |---------------|------------------|-------------------------------------|
//! | `snake_case`  | string           | `get_rule_v_2`                      |
//! | `camel_case`  | string           | `getRuleV2`                         |
//! | `pascal_case` | string           | `GetRuleV2`                         |
//! | `ref_name`    | `$ref` string    | `Rule` for `#/components/schemas/Rule` |
//! | `js_literal`  | any JSON value   | TypeScript literal                  |
//! | `zod_schema`  | schema object    | zod expression                      |

use std::collections::HashMap;

use serde_json::{Map, Value};
use tera::Tera;

use crate::core::utils::{to_camel_case, to_pascal_case, to_snake_case};

type FilterArgs = HashMap<String, Value>;

/// Register every helper filter on a tera instance
pub fn register_helpers(tera: &mut Tera) {
    tera.register_filter("snake_case", snake_case_filter);
    tera.register_filter("camel_case", camel_case_filter);
    tera.register_filter("pascal_case", pascal_case_filter);
    tera.register_filter("ref_name", ref_name_filter);
    tera.register_filter("js_literal", js_literal_filter);
    tera.register_filter("zod_schema", zod_schema_filter);
}

fn string_arg<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("Filter `{filter}` expects a string, got {value}")))
}

fn snake_case_filter(value: &Value, _: &FilterArgs) -> tera::Result<Value> {
    Ok(Value::String(to_snake_case(string_arg(value, "snake_case")?)))
}

fn camel_case_filter(value: &Value, _: &FilterArgs) -> tera::Result<Value> {
    Ok(Value::String(to_camel_case(string_arg(value, "camel_case")?)))
}

fn pascal_case_filter(value: &Value, _: &FilterArgs) -> tera::Result<Value> {
    Ok(Value::String(to_pascal_case(string_arg(value, "pascal_case")?)))
}

fn ref_name_filter(value: &Value, _: &FilterArgs) -> tera::Result<Value> {
    Ok(Value::String(ref_name(string_arg(value, "ref_name")?)))
}

fn js_literal_filter(value: &Value, _: &FilterArgs) -> tera::Result<Value> {
    Ok(Value::String(js_literal(value)))
}

/// `zod_schema(depth=0)`; `depth` sets the indentation of nested objects.
fn zod_schema_filter(value: &Value, args: &FilterArgs) -> tera::Result<Value> {
    let depth = args.get("depth").and_then(Value::as_u64).unwrap_or(0) as usize;
    let mut expr = zod_schema(value, depth);
    if let Some(default) = value.get("default") {
        expr.push_str(&format!(".default({})", js_literal(default)));
    }
    Ok(Value::String(expr))
}

/// Type name a `$ref` points at
///
/// # Examples
/// ```
/// use oapigen::infrastructure::templates::helpers::ref_name;
///
/// assert_eq!(ref_name("#/components/schemas/RuleId"), "RuleId");
/// assert_eq!(ref_name("../model/common.schema.yaml#/components/schemas/Tags"), "Tags");
/// ```
pub fn ref_name(reference: &str) -> String {
    match reference.split_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment
            .rsplit('/')
            .next()
            .unwrap_or(fragment)
            .replace("~1", "/")
            .replace("~0", "~"),
        _ => {
            let file = reference.trim_end_matches('#');
            let stem = file
                .rsplit('/')
                .next()
                .and_then(|name| name.split('.').next())
                .unwrap_or(file);
            to_pascal_case(stem)
        }
    }
}

/// Render a JSON value as a TypeScript literal with single-quoted strings
///
/// # Examples
/// ```
/// use oapigen::infrastructure::templates::helpers::js_literal;
/// use serde_json::json;
///
/// assert_eq!(js_literal(&json!("single")), "'single'");
/// assert_eq!(js_literal(&json!(["a", 1])), "['a', 1]");
/// ```
pub fn js_literal(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(js_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", property_key(k), js_literal(v)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
        other => other.to_string(),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn property_key(key: &str) -> String {
    let mut chars = key.chars();
    let valid_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid_identifier {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Render a (possibly `$ref`-bearing) schema as a zod expression
///
/// # Examples
/// ```
/// use oapigen::infrastructure::templates::helpers::zod_schema;
/// use serde_json::json;
///
/// assert_eq!(zod_schema(&json!({"type": "integer", "minimum": 0}), 0), "z.number().int().min(0)");
/// assert_eq!(zod_schema(&json!({"$ref": "#/components/schemas/RuleId"}), 0), "RuleId");
/// assert_eq!(zod_schema(&json!({"type": "string", "enum": ["a", "b"]}), 0), "z.enum(['a', 'b'])");
/// ```
pub fn zod_schema(schema: &Value, depth: usize) -> String {
    let Some(obj) = schema.as_object() else {
        return "z.unknown()".to_string();
    };

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        return ref_name(reference);
    }

    let mut expr = if let Some(all_of) = obj.get("allOf").and_then(Value::as_array) {
        let parts: Vec<String> = all_of.iter().map(|s| zod_schema(s, depth)).collect();
        match parts.split_first() {
            Some((first, rest)) => rest
                .iter()
                .fold(first.clone(), |acc, part| format!("{acc}.and({part})")),
            None => "z.unknown()".to_string(),
        }
    } else if let Some(variants) = obj
        .get("anyOf")
        .or_else(|| obj.get("oneOf"))
        .and_then(Value::as_array)
    {
        let parts: Vec<String> = variants.iter().map(|s| zod_schema(s, depth)).collect();
        match parts.as_slice() {
            [] => "z.unknown()".to_string(),
            [single] => single.clone(),
            _ => format!("z.union([{}])", parts.join(", ")),
        }
    } else if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        enum_expr(values)
    } else {
        typed_expr(obj, depth)
    };

    if is_nullable(obj) {
        expr.push_str(".nullable()");
    }
    expr
}

fn schema_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // OpenAPI 3.1 style `type: [string, 'null']`
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ if obj.contains_key("properties") || obj.contains_key("additionalProperties") => {
            Some("object")
        }
        _ => None,
    }
}

fn is_nullable(obj: &Map<String, Value>) -> bool {
    obj.get("nullable").and_then(Value::as_bool).unwrap_or(false)
        || obj
            .get("type")
            .and_then(Value::as_array)
            .is_some_and(|types| types.iter().any(|t| t == "null"))
}

fn enum_expr(values: &[Value]) -> String {
    if !values.is_empty() && values.iter().all(Value::is_string) {
        let members: Vec<String> = values.iter().map(js_literal).collect();
        return format!("z.enum([{}])", members.join(", "));
    }
    let literals: Vec<String> = values
        .iter()
        .map(|v| format!("z.literal({})", js_literal(v)))
        .collect();
    match literals.as_slice() {
        [] => "z.never()".to_string(),
        [single] => single.clone(),
        _ => format!("z.union([{}])", literals.join(", ")),
    }
}

fn typed_expr(obj: &Map<String, Value>, depth: usize) -> String {
    let number = |key: &str| obj.get(key).filter(|v| v.is_number()).map(Value::to_string);

    match schema_type(obj) {
        Some("string") => {
            let mut expr = "z.string()".to_string();
            match obj.get("format").and_then(Value::as_str) {
                Some("date-time") => expr.push_str(".datetime()"),
                Some("email") => expr.push_str(".email()"),
                Some("uuid") => expr.push_str(".uuid()"),
                Some("uri") => expr.push_str(".url()"),
                _ => {}
            }
            if let Some(min) = number("minLength") {
                expr.push_str(&format!(".min({min})"));
            }
            if let Some(max) = number("maxLength") {
                expr.push_str(&format!(".max({max})"));
            }
            if let Some(pattern) = obj.get("pattern").and_then(Value::as_str) {
                expr.push_str(&format!(".regex(/{}/)", pattern.replace('/', "\\/")));
            }
            expr
        }
        Some(kind @ ("integer" | "number")) => {
            let mut expr = "z.number()".to_string();
            if kind == "integer" {
                expr.push_str(".int()");
            }
            if let Some(min) = number("minimum") {
                expr.push_str(&format!(".min({min})"));
            }
            if let Some(max) = number("maximum") {
                expr.push_str(&format!(".max({max})"));
            }
            expr
        }
        Some("boolean") => "z.boolean()".to_string(),
        Some("null") => "z.null()".to_string(),
        Some("array") => {
            let items = obj
                .get("items")
                .map(|items| zod_schema(items, depth))
                .unwrap_or_else(|| "z.unknown()".to_string());
            let mut expr = format!("z.array({items})");
            if let Some(min) = number("minItems") {
                expr.push_str(&format!(".min({min})"));
            }
            if let Some(max) = number("maxItems") {
                expr.push_str(&format!(".max({max})"));
            }
            expr
        }
        Some("object") => object_expr(obj, depth),
        _ => "z.unknown()".to_string(),
    }
}

fn object_expr(obj: &Map<String, Value>, depth: usize) -> String {
    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut expr = match obj.get("properties").and_then(Value::as_object) {
        Some(properties) if !properties.is_empty() => {
            let indent = "  ".repeat(depth + 1);
            let mut body = String::new();
            for (name, property) in properties {
                if let Some(description) = property.get("description").and_then(Value::as_str) {
                    body.push_str(&format!("{indent}/**\n"));
                    for line in description.trim().lines() {
                        let line = format!("{indent} * {}\n", line.trim_end());
                        body.push_str(&line.replace(" * \n", " *\n"));
                    }
                    body.push_str(&format!("{indent} */\n"));
                }
                let mut value = zod_schema(property, depth + 1);
                if !required.contains(&name.as_str()) {
                    value.push_str(".optional()");
                }
                if let Some(default) = property.get("default") {
                    value.push_str(&format!(".default({})", js_literal(default)));
                }
                body.push_str(&format!("{indent}{}: {value},\n", property_key(name)));
            }
            format!("z.object({{\n{body}{}}})", "  ".repeat(depth))
        }
        _ => "z.object({})".to_string(),
    };

    match obj.get("additionalProperties") {
        Some(Value::Bool(false)) => expr.push_str(".strict()"),
        Some(extra @ Value::Object(_)) => {
            expr.push_str(&format!(".catchall({})", zod_schema(extra, depth)));
        }
        _ => {}
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_with_optional_and_default() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "$ref": "#/components/schemas/ExceptionListId" },
                "namespace_type": {
                    "$ref": "#/components/schemas/ExceptionNamespaceType",
                    "default": "single"
                },
                "filter": { "type": "string", "description": "Search filter clause" }
            },
            "required": ["id"]
        });

        assert_eq!(
            zod_schema(&schema, 0),
            "z.object({\n  id: ExceptionListId,\n  namespace_type: ExceptionNamespaceType.optional().default('single'),\n  /**\n   * Search filter clause\n   */\n  filter: z.string().optional(),\n})"
        );
    }

    #[test]
    fn test_nested_objects_indent() {
        let schema = json!({
            "type": "object",
            "properties": {
                "meta": {
                    "type": "object",
                    "properties": { "total": { "type": "integer" } },
                    "required": ["total"]
                }
            }
        });

        assert_eq!(
            zod_schema(&schema, 0),
            "z.object({\n  meta: z.object({\n    total: z.number().int(),\n  }).optional(),\n})"
        );
    }

    #[test]
    fn test_composition() {
        let all_of = json!({ "allOf": [{ "$ref": "#/a/A" }, { "$ref": "#/a/B" }] });
        assert_eq!(zod_schema(&all_of, 0), "A.and(B)");

        let one_of = json!({ "oneOf": [{ "type": "string" }, { "type": "boolean" }] });
        assert_eq!(zod_schema(&one_of, 0), "z.union([z.string(), z.boolean()])");
    }

    #[test]
    fn test_string_constraints_and_nullable() {
        let schema = json!({
            "type": "string",
            "format": "date-time",
            "minLength": 1,
            "nullable": true
        });
        assert_eq!(zod_schema(&schema, 0), "z.string().datetime().min(1).nullable()");

        let pattern = json!({ "type": "string", "pattern": "^a/b$" });
        assert_eq!(zod_schema(&pattern, 0), "z.string().regex(/^a\\/b$/)");
    }

    #[test]
    fn test_type_array_with_null() {
        let schema = json!({ "type": ["integer", "null"] });
        assert_eq!(zod_schema(&schema, 0), "z.number().int().nullable()");
    }

    #[test]
    fn test_additional_properties() {
        let record = json!({ "type": "object", "additionalProperties": { "type": "string" } });
        assert_eq!(zod_schema(&record, 0), "z.object({}).catchall(z.string())");

        let strict = json!({ "type": "object", "additionalProperties": false });
        assert_eq!(zod_schema(&strict, 0), "z.object({}).strict()");
    }

    #[test]
    fn test_arrays_and_numeric_enums() {
        let schema = json!({ "type": "array", "items": { "type": "number" }, "minItems": 1 });
        assert_eq!(zod_schema(&schema, 0), "z.array(z.number()).min(1)");

        let numbers = json!({ "enum": [1, 2] });
        assert_eq!(zod_schema(&numbers, 0), "z.union([z.literal(1), z.literal(2)])");
    }

    #[test]
    fn test_unknown_schema() {
        assert_eq!(zod_schema(&json!({}), 0), "z.unknown()");
        assert_eq!(zod_schema(&json!(true), 0), "z.unknown()");
    }

    #[test]
    fn test_js_literal_escaping() {
        assert_eq!(js_literal(&json!("it's")), "'it\\'s'");
        assert_eq!(js_literal(&json!({ "a-b": 1, "c": null })), "{ 'a-b': 1, c: null }");
        assert_eq!(js_literal(&json!({})), "{}");
    }

    #[test]
    fn test_ref_name_without_fragment() {
        assert_eq!(ref_name("./rule_schema.schema.yaml"), "RuleSchema");
    }

    #[test]
    fn test_filters_render_through_tera() {
        let mut tera = Tera::default();
        register_helpers(&mut tera);
        tera.add_raw_template(
            "t",
            "{{ id | snake_case }} {{ id | camel_case }} {{ schema | zod_schema }}",
        )
        .unwrap();

        let mut context = tera::Context::new();
        context.insert("id", "GetRuleV2");
        context.insert("schema", &json!({ "type": "boolean", "default": false }));

        assert_eq!(
            tera.render("t", &context).unwrap(),
            "get_rule_v_2 getRuleV2 z.boolean().default(false)"
        );
    }

    #[test]
    fn test_casing_filter_rejects_non_strings() {
        let result = snake_case_filter(&json!(42), &HashMap::new());
        assert!(result.is_err());
    }
}
