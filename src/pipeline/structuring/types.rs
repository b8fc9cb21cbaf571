use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::ExtractionError;

/// Specification for a single field to extract, as parsed from the
/// user's description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field_name: String,
    /// Raw type token; resolved against the closed type table at synthesis.
    pub field_type: String,
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    pub fn new(field_name: &str, field_type: &str, description: &str, required: bool) -> Self {
        Self {
            field_name: field_name.to_string(),
            field_type: field_type.to_string(),
            description: description.to_string(),
            required,
        }
    }
}

/// Parsed extraction requirements: a use-case name plus ordered field specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequirements {
    pub use_case_name: String,
    pub fields: Vec<FieldSpec>,
}

impl ExtractionRequirements {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field_name.as_str()).collect()
    }
}

/// A validated value inside an extracted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    TextList(Vec<String>),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// One document's extraction result. Keys follow descriptor order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedRecord {
    entries: Vec<(String, FieldValue)>,
}

impl ExtractedRecord {
    pub(crate) fn from_entries(entries: Vec<(String, FieldValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        // FieldValue serialization cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A single structured-output request to the generative service.
#[derive(Debug, Clone, Copy)]
pub struct StructuredRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    /// Wire name of the target schema; must match `[A-Za-z0-9_-]+`.
    pub schema_name: &'a str,
    pub schema: &'a serde_json::Value,
}

/// Generative service client abstraction (allows mocking).
///
/// Implementations must return a JSON value that the service guaranteed
/// to conform to `request.schema`, or fail.
pub trait LlmClient {
    fn generate_structured(
        &self,
        request: &StructuredRequest<'_>,
    ) -> Result<serde_json::Value, ExtractionError>;
}
