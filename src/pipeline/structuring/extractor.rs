use super::prompt::EXTRACTION_SYSTEM_PROMPT;
use super::schema::SchemaDescriptor;
use super::types::{ExtractedRecord, LlmClient, StructuredRequest};
use super::ExtractionError;

/// Extract one document against a synthesized schema.
///
/// The service is asked for output matching `schema.to_json_schema()`;
/// the reply is then checked against the descriptor before it becomes a
/// record.
pub fn extract_document(
    llm: &dyn LlmClient,
    model: &str,
    schema: &SchemaDescriptor,
    document_text: &str,
) -> Result<ExtractedRecord, ExtractionError> {
    let json_schema = schema.to_json_schema();
    extract_with_json_schema(llm, model, schema, &json_schema, document_text)
}

/// Same as [`extract_document`] with a pre-rendered JSON schema, so a
/// batch renders it once.
pub(crate) fn extract_with_json_schema(
    llm: &dyn LlmClient,
    model: &str,
    schema: &SchemaDescriptor,
    json_schema: &serde_json::Value,
    document_text: &str,
) -> Result<ExtractedRecord, ExtractionError> {
    let request = StructuredRequest {
        model,
        system: EXTRACTION_SYSTEM_PROMPT,
        user: document_text,
        schema_name: schema.schema_name(),
        schema: json_schema,
    };

    let reply = llm.generate_structured(&request)?;
    schema.validate(&reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::openai::{MockLlmClient, MockReply};
    use crate::pipeline::structuring::schema::synthesize_schema;
    use crate::pipeline::structuring::types::{ExtractionRequirements, FieldSpec, FieldValue};
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        synthesize_schema(&ExtractionRequirements {
            use_case_name: "Project Reports".into(),
            fields: vec![
                FieldSpec::new("project_title", "string", "Title", true),
                FieldSpec::new("acronym", "string", "Acronym", false),
            ],
        })
        .unwrap()
    }

    #[test]
    fn sends_document_with_descriptor_schema() {
        let mock = MockLlmClient::new(vec![MockReply::Json(json!({
            "project_title": "Green Energy Solutions",
            "acronym": "GES"
        }))]);
        let schema = schema();
        let record = extract_document(&mock, "gpt-4.1", &schema, "Title: Green Energy Solutions").unwrap();

        assert_eq!(
            record.get("project_title"),
            Some(&FieldValue::Text("Green Energy Solutions".into()))
        );
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user, "Title: Green Energy Solutions");
        assert_eq!(calls[0].system, EXTRACTION_SYSTEM_PROMPT);
        assert_eq!(calls[0].schema_name, "Project_Reports_Extraction");
        assert_eq!(calls[0].schema, schema.to_json_schema());
    }

    #[test]
    fn optional_field_may_be_null() {
        let mock = MockLlmClient::new(vec![MockReply::Json(json!({
            "project_title": "X",
            "acronym": null
        }))]);
        let record = extract_document(&mock, "m", &schema(), "doc").unwrap();
        assert_eq!(record.get("acronym"), Some(&FieldValue::Null));
    }

    #[test]
    fn non_conforming_reply_fails() {
        let mock = MockLlmClient::new(vec![MockReply::Json(json!({ "acronym": "X" }))]);
        let err = extract_document(&mock, "m", &schema(), "doc").unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn service_error_propagates() {
        let mock = MockLlmClient::new(vec![MockReply::Fail("boom".into())]);
        let err = extract_document(&mock, "m", &schema(), "doc").unwrap_err();
        assert!(err.is_service_error());
    }
}
