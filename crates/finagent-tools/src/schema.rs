//! JSON Schema builders and argument validation
//!
//! The builders produce the small JSON Schema subset the tools publish to
//! the reasoning step. [`validate`] checks tool arguments against the same
//! subset: `type`, `properties`, `required`, `additionalProperties: false`,
//! `minimum`/`maximum`, `minLength`/`maxLength`, `pattern`, `enum`, `items`,
//! `minItems`/`maxItems`.

use cached::{Cached, SizedCache};
use finagent_core::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::{LazyLock, Mutex};

/// Compiled `pattern` keywords, shared by every validation
static PATTERNS: LazyLock<Mutex<SizedCache<String, Regex>>> =
    LazyLock::new(|| Mutex::new(SizedCache::with_size(256)));

fn compiled_pattern(pattern: &str) -> Result<Regex> {
    let mut patterns = PATTERNS
        .lock()
        .map_err(|_| Error::Internal("schema pattern cache poisoned".to_string()))?;
    if let Some(re) = patterns.cache_get(pattern) {
        return Ok(re.clone());
    }

    let re = Regex::new(pattern)
        .map_err(|e| Error::Internal(format!("invalid schema pattern '{pattern}': {e}")))?;
    let _ = patterns.cache_set(pattern.to_string(), re.clone());
    Ok(re)
}

/// Create a JSON Schema object type that rejects unknown properties
///
/// # Example
///
/// ```
/// use finagent_tools::schema::{object, string, integer};
/// use serde_json::json;
///
/// let schema = object(
///     json!({
///         "identifier": string(Some("Artifact identifier")),
///         "limit": integer(Some("Row limit")),
///     }),
///     &["identifier"],
/// );
/// assert_eq!(schema["additionalProperties"], false);
/// ```
pub fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn typed(kind: &str, description: Option<&str>) -> Value {
    let mut schema = json!({ "type": kind });
    if let Some(d) = description {
        schema["description"] = json!(d);
    }
    schema
}

/// Create a JSON Schema string type
pub fn string(description: Option<&str>) -> Value {
    typed("string", description)
}

/// Create a string type constrained by a regular expression
pub fn pattern_string(pattern: &str, description: Option<&str>) -> Value {
    let mut schema = typed("string", description);
    schema["pattern"] = json!(pattern);
    schema
}

/// Create a JSON Schema number type
pub fn number(description: Option<&str>) -> Value {
    typed("number", description)
}

/// Create a JSON Schema integer type
pub fn integer(description: Option<&str>) -> Value {
    typed("integer", description)
}

/// Create an integer type with inclusive bounds
pub fn bounded_integer(minimum: i64, maximum: i64, description: Option<&str>) -> Value {
    let mut schema = typed("integer", description);
    schema["minimum"] = json!(minimum);
    schema["maximum"] = json!(maximum);
    schema
}

/// Create a JSON Schema boolean type
pub fn boolean(description: Option<&str>) -> Value {
    typed("boolean", description)
}

/// Create a JSON Schema array type
pub fn array(items: Value, description: Option<&str>) -> Value {
    let mut schema = typed("array", description);
    schema["items"] = items;
    schema
}

/// Create an enum schema (string with allowed values)
pub fn enum_string(values: &[&str], description: Option<&str>) -> Value {
    let mut schema = typed("string", description);
    schema["enum"] = json!(values);
    schema
}

/// Validate `value` against `schema`
///
/// Returns the first violation as [`Error::Validation`], naming the offending
/// path (`$` is the root, `$.days` a property).
pub fn validate(value: &Value, schema: &Value) -> Result<()> {
    validate_at("$", value, schema)
}

fn validate_at(path: &str, value: &Value, schema: &Value) -> Result<()> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(Value::String(expected)) = schema.get("type") {
        if !type_matches(expected, value) {
            return Err(Error::Validation(format!(
                "{path}: expected {expected}, got {}",
                describe(value)
            )));
        }
    }

    if let Some(Value::Array(allowed)) = schema.get("enum") {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(Error::Validation(format!(
                "{path}: {value} is not one of [{}]",
                options.join(", ")
            )));
        }
    }

    match value {
        Value::Number(n) => check_bounds(path, n.as_f64().unwrap_or(f64::NAN), schema)?,
        Value::String(s) => check_string(path, s, schema)?,
        Value::Array(items) => check_array(path, items, schema)?,
        Value::Object(fields) => check_object(path, fields, schema)?,
        _ => {}
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_bounds(path: &str, n: f64, schema: &Map<String, Value>) -> Result<()> {
    if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
        if n < min {
            return Err(Error::Validation(format!("{path}: {n} is below the minimum {min}")));
        }
    }
    if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
        if n > max {
            return Err(Error::Validation(format!("{path}: {n} is above the maximum {max}")));
        }
    }
    Ok(())
}

fn check_string(path: &str, s: &str, schema: &Map<String, Value>) -> Result<()> {
    let len = s.chars().count() as u64;
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if len < min {
            return Err(Error::Validation(format!("{path}: shorter than {min} characters")));
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if len > max {
            return Err(Error::Validation(format!("{path}: longer than {max} characters")));
        }
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        let re = compiled_pattern(pattern)?;
        if !re.is_match(s) {
            return Err(Error::Validation(format!(
                "{path}: '{s}' does not match pattern {pattern}"
            )));
        }
    }
    Ok(())
}

fn check_array(path: &str, items: &[Value], schema: &Map<String, Value>) -> Result<()> {
    let len = items.len() as u64;
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
        if len < min {
            return Err(Error::Validation(format!("{path}: fewer than {min} items")));
        }
    }
    if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
        if len > max {
            return Err(Error::Validation(format!("{path}: more than {max} items")));
        }
    }
    if let Some(item_schema) = schema.get("items") {
        for (i, item) in items.iter().enumerate() {
            validate_at(&format!("{path}[{i}]"), item, item_schema)?;
        }
    }
    Ok(())
}

fn check_object(path: &str, fields: &Map<String, Value>, schema: &Map<String, Value>) -> Result<()> {
    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !fields.contains_key(name) {
                return Err(Error::Validation(format!(
                    "{path}: missing required property '{name}'"
                )));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    let closed = matches!(schema.get("additionalProperties"), Some(Value::Bool(false)));

    for (name, field) in fields {
        match properties.and_then(|p| p.get(name)) {
            Some(field_schema) => validate_at(&format!("{path}.{name}"), field, field_schema)?,
            None if closed => {
                return Err(Error::Validation(format!(
                    "{path}: unexpected property '{name}'"
                )));
            }
            None => {}
        }
    }

    Ok(())
}
