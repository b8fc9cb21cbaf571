pub mod types;
pub mod type_map;
pub mod sanitize;
pub mod schema;
pub mod prompt;
pub mod requirements;
pub mod extractor;
pub mod openai;
pub mod orchestrator;

pub use types::*;
pub use type_map::*;
pub use sanitize::*;
pub use schema::*;
pub use prompt::*;
pub use requirements::*;
pub use extractor::*;
pub use openai::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction description is empty")]
    EmptyDescription,

    #[error("Unknown type token '{token}' for field '{field}'")]
    UnknownTypeToken { field: String, token: String },

    #[error("Generative service is not reachable at {0}")]
    ServiceConnection(String),

    #[error("Generative service returned error (status {status}): {body}")]
    ServiceStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Generative service refused the request: {0}")]
    Refusal(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Response does not match schema: {0}")]
    SchemaViolation(String),

    #[error("Batch aborted at document index {index}: {source}")]
    BatchAborted {
        index: usize,
        #[source]
        source: Box<ExtractionError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractionError {
    /// True for failures raised by (or about) the generative service call.
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            ExtractionError::ServiceConnection(_)
                | ExtractionError::ServiceStatus { .. }
                | ExtractionError::HttpClient(_)
                | ExtractionError::Refusal(_)
                | ExtractionError::MalformedResponse(_)
                | ExtractionError::SchemaViolation(_)
        )
    }
}
