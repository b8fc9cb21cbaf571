use super::prompt::{
    build_requirements_prompt, requirements_json_schema, REQUIREMENTS_SCHEMA_NAME,
    REQUIREMENTS_SYSTEM_PROMPT,
};
use super::types::{ExtractionRequirements, LlmClient, StructuredRequest};
use super::ExtractionError;

/// Parse a natural-language description into field specifications.
///
/// One structured call against the fixed requirements schema. No retry:
/// any service failure or non-conforming payload is returned as is.
pub fn parse_requirements(
    llm: &dyn LlmClient,
    model: &str,
    user_description: &str,
) -> Result<ExtractionRequirements, ExtractionError> {
    if user_description.trim().is_empty() {
        return Err(ExtractionError::EmptyDescription);
    }

    let schema = requirements_json_schema();
    let prompt = build_requirements_prompt(user_description);
    let request = StructuredRequest {
        model,
        system: REQUIREMENTS_SYSTEM_PROMPT,
        user: &prompt,
        schema_name: REQUIREMENTS_SCHEMA_NAME,
        schema: &schema,
    };

    let reply = llm.generate_structured(&request)?;
    let requirements: ExtractionRequirements = serde_json::from_value(reply).map_err(|e| {
        ExtractionError::MalformedResponse(format!("requirements reply: {e}"))
    })?;

    tracing::info!(
        use_case = %requirements.use_case_name,
        fields = requirements.fields.len(),
        "Parsed extraction requirements"
    );
    Ok(requirements)
}
