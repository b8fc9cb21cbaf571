//! Runtime schema synthesis.
//!
//! A `SchemaDescriptor` is plain data: an ordered list of typed fields
//! built from parsed requirements. The same descriptor renders the strict
//! JSON Schema sent with each extraction request and validates each reply.

use serde_json::{json, Map, Value};

use super::sanitize::{sanitize_schema_name, MAX_SCHEMA_NAME_LEN};
use super::type_map::ValueType;
use super::types::{ExtractedRecord, ExtractionRequirements, FieldValue};
use super::ExtractionError;

/// Suffix marking a synthesized schema name as an extraction schema.
pub const EXTRACTION_SCHEMA_SUFFIX: &str = "_Extraction";

/// One typed field of a synthesized schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    pub description: String,
}

impl FieldDescriptor {
    /// Required fields have no default; optional fields default to null.
    pub fn default_value(&self) -> Option<FieldValue> {
        if self.required {
            None
        } else {
            Some(FieldValue::Null)
        }
    }

    fn json_schema(&self) -> Value {
        let mut schema = self.value_type.json_schema(!self.required);
        if let Value::Object(obj) = &mut schema {
            obj.insert("description".into(), Value::String(self.description.clone()));
        }
        schema
    }
}

/// Named, ordered, immutable set of typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    schema_name: String,
    use_case_name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn use_case_name(&self) -> &str {
        &self.use_case_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Strict JSON Schema for this descriptor. Every property is listed
    /// under `required`; optional fields are expressed as nullable types.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.json_schema());
        }
        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        json!({
            "type": "object",
            "title": self.schema_name,
            "description": format!("Extraction model for {}", self.use_case_name),
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Validate a service reply against the descriptor and convert it into
    /// a record keyed exactly by the descriptor's field names.
    pub fn validate(&self, value: &Value) -> Result<ExtractedRecord, ExtractionError> {
        let obj = value.as_object().ok_or_else(|| {
            ExtractionError::SchemaViolation("expected a JSON object".into())
        })?;

        if let Some(unknown) = obj.keys().find(|k| self.field(k).is_none()) {
            return Err(ExtractionError::SchemaViolation(format!(
                "unexpected field '{unknown}'"
            )));
        }

        let mut entries = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let entry = match obj.get(&field.name) {
                None | Some(Value::Null) => match field.default_value() {
                    Some(default) => default,
                    None => {
                        return Err(ExtractionError::SchemaViolation(format!(
                            "required field '{}' is missing",
                            field.name
                        )))
                    }
                },
                Some(raw) => field.value_type.coerce(&field.name, raw)?,
            };
            entries.push((field.name.clone(), entry));
        }

        Ok(ExtractedRecord::from_entries(entries))
    }
}

/// Build a schema descriptor from parsed requirements.
///
/// All type tokens are resolved before anything is assembled, so an
/// unknown token yields no descriptor at all. A repeated field name
/// replaces the earlier definition in place.
pub fn synthesize_schema(
    requirements: &ExtractionRequirements,
) -> Result<SchemaDescriptor, ExtractionError> {
    let resolved = requirements
        .fields
        .iter()
        .map(|spec| {
            ValueType::from_token(&spec.field_name, &spec.field_type).map(|ty| (spec, ty))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(resolved.len());
    for (spec, value_type) in resolved {
        let descriptor = FieldDescriptor {
            name: spec.field_name.clone(),
            value_type,
            required: spec.required,
            description: spec.description.clone(),
        };
        match fields.iter_mut().find(|f| f.name == descriptor.name) {
            Some(existing) => {
                tracing::warn!(
                    field = %descriptor.name,
                    "Duplicate field name in requirements, later definition wins"
                );
                *existing = descriptor;
            }
            None => fields.push(descriptor),
        }
    }

    let schema_name = extraction_schema_name(&requirements.use_case_name);
    tracing::debug!(schema = %schema_name, fields = fields.len(), "Synthesized extraction schema");

    Ok(SchemaDescriptor {
        schema_name,
        use_case_name: requirements.use_case_name.clone(),
        fields,
    })
}

/// `sanitize(use_case_name) + "_Extraction"`, or `Extraction` when the
/// sanitized stem is empty. Long stems are cut so the whole name fits
/// `MAX_SCHEMA_NAME_LEN`.
pub fn extraction_schema_name(use_case_name: &str) -> String {
    let sanitized = sanitize_schema_name(use_case_name);
    // Sanitized names are ASCII, so byte truncation is char-safe.
    let max_stem = MAX_SCHEMA_NAME_LEN - EXTRACTION_SCHEMA_SUFFIX.len();
    let stem = sanitized[..sanitized.len().min(max_stem)].trim_end_matches('_');
    if stem.is_empty() {
        EXTRACTION_SCHEMA_SUFFIX.trim_start_matches('_').to_string()
    } else {
        format!("{stem}{EXTRACTION_SCHEMA_SUFFIX}")
    }
}
