pub mod cli;
pub mod config;
pub mod pipeline;

pub use pipeline::structuring::{
    extract_document, parse_requirements, sanitize_schema_name, synthesize_schema,
    ExtractedRecord, ExtractionError, ExtractionRequirements, ExtractionWorkflow, FieldSpec,
    FieldValue, LlmClient, OpenAiClient, SchemaDescriptor, ValueType, WorkflowReport,
};

use tracing_subscriber::EnvFilter;

/// Initialize tracing with `RUST_LOG`, falling back to the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build a workflow backed by the configured generative service.
pub fn workflow_from_config(
    service: &config::ServiceConfig,
) -> Result<ExtractionWorkflow, ExtractionError> {
    let client = OpenAiClient::new(service)?;
    Ok(ExtractionWorkflow::new(Box::new(client), &service.model))
}
