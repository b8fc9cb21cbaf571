//! Closed table from field type tokens to concrete value types.
//!
//! The set is fixed: every variant must be expressible in the service's
//! strict structured-output schema dialect.

use serde_json::{json, Value};

use super::types::FieldValue;
use super::ExtractionError;

/// Canonical type tokens, in the order offered to the requirements parser.
pub const TYPE_TOKENS: &[&str] = &["string", "integer", "float", "boolean", "list_of_string"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
    TextList,
}

impl ValueType {
    /// Resolve a type token. Accepts the canonical tokens plus the short
    /// spellings `str`, `int`, `bool` and `list[str]`.
    pub fn from_token(field: &str, token: &str) -> Result<Self, ExtractionError> {
        match token.trim() {
            "string" | "str" => Ok(ValueType::Text),
            "integer" | "int" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "list_of_string" | "list[str]" => Ok(ValueType::TextList),
            _ => Err(ExtractionError::UnknownTypeToken {
                field: field.to_string(),
                token: token.to_string(),
            }),
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            ValueType::Text => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::TextList => "list_of_string",
        }
    }

    /// JSON Schema fragment for this type. Optional fields widen the
    /// `type` keyword to include `"null"`.
    pub fn json_schema(&self, nullable: bool) -> Value {
        let base = match self {
            ValueType::Text => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "number",
            ValueType::Boolean => "boolean",
            ValueType::TextList => "array",
        };
        let ty = if nullable { json!([base, "null"]) } else { json!(base) };
        match self {
            ValueType::TextList => json!({ "type": ty, "items": { "type": "string" } }),
            _ => json!({ "type": ty }),
        }
    }

    /// Check a JSON value against this type and convert it.
    /// `null` is not handled here; callers decide based on the required flag.
    pub fn coerce(&self, field: &str, value: &Value) -> Result<FieldValue, ExtractionError> {
        let mismatch = || {
            ExtractionError::SchemaViolation(format!(
                "field '{field}' expected {}, got {}",
                self.as_token(),
                json_kind(value)
            ))
        };
        match self {
            ValueType::Text => value
                .as_str()
                .map(|s| FieldValue::Text(s.to_string()))
                .ok_or_else(mismatch),
            ValueType::Integer => {
                if let Some(i) = value.as_i64() {
                    return Ok(FieldValue::Integer(i));
                }
                match value.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Ok(FieldValue::Integer(f as i64))
                    }
                    _ => Err(mismatch()),
                }
            }
            ValueType::Float => value.as_f64().map(FieldValue::Float).ok_or_else(mismatch),
            ValueType::Boolean => value.as_bool().map(FieldValue::Boolean).ok_or_else(mismatch),
            ValueType::TextList => {
                let items = value.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).ok_or_else(mismatch))
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::TextList)
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
