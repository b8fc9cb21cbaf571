use serde_json::{json, Value};

use super::type_map::TYPE_TOKENS;

/// Wire name of the fixed requirements schema.
pub const REQUIREMENTS_SCHEMA_NAME: &str = "ExtractionRequirements";

pub const REQUIREMENTS_SYSTEM_PROMPT: &str = r#"You are an expert at analyzing extraction requirements.
Parse the user's description and identify all fields they want to extract.
Convert field names to snake_case and choose appropriate types."#;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "Extract the requested information from the document.";

/// Build the user message for the requirements-parse request.
pub fn build_requirements_prompt(user_description: &str) -> String {
    format!(
        "Parse this extraction requirement:\n\n{}\n\nIdentify all fields to extract, their types, and descriptions.",
        user_description.trim()
    )
}

/// Strict JSON Schema describing `ExtractionRequirements`.
///
/// `field_type` is constrained to the closed token set so the service
/// can only answer with types the synthesizer knows.
pub fn requirements_json_schema() -> Value {
    json!({
        "type": "object",
        "title": REQUIREMENTS_SCHEMA_NAME,
        "description": "Parsed extraction requirements from user input",
        "properties": {
            "use_case_name": {
                "type": "string",
                "description": "Name for this extraction use case"
            },
            "fields": {
                "type": "array",
                "description": "List of fields to extract",
                "items": {
                    "type": "object",
                    "description": "Specification for a single field to extract",
                    "properties": {
                        "field_name": {
                            "type": "string",
                            "description": "Snake_case field name (e.g., 'project_title')"
                        },
                        "field_type": {
                            "type": "string",
                            "enum": TYPE_TOKENS,
                            "description": "Value type for this field"
                        },
                        "description": {
                            "type": "string",
                            "description": "What this field represents"
                        },
                        "required": {
                            "type": "boolean",
                            "description": "Whether this field is required"
                        }
                    },
                    "required": ["field_name", "field_type", "description", "required"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["use_case_name", "fields"],
        "additionalProperties": false
    })
}
