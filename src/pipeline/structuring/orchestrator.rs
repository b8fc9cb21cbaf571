use std::time::Instant;

use uuid::Uuid;

use super::extractor::extract_with_json_schema;
use super::requirements::parse_requirements;
use super::schema::{synthesize_schema, SchemaDescriptor};
use super::types::{ExtractedRecord, ExtractionRequirements, LlmClient};
use super::ExtractionError;

/// Position of a run in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Start,
    RequirementsParsed,
    SchemaBuilt,
    /// 1-based index of the document being extracted.
    Extracting(usize),
    Done,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::RequirementsParsed => write!(f, "requirements parsed"),
            Self::SchemaBuilt => write!(f, "schema built"),
            Self::Extracting(i) => write!(f, "extracting document {i}"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub requirements: ExtractionRequirements,
    pub schema: SchemaDescriptor,
    /// Index-aligned with the input documents.
    pub records: Vec<ExtractedRecord>,
}

/// Orchestrates the full pipeline:
/// parse requirements → synthesize schema → extract each document in order.
pub struct ExtractionWorkflow {
    llm: Box<dyn LlmClient + Send + Sync>,
    model_name: String,
}

impl ExtractionWorkflow {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model_name: &str) -> Self {
        Self {
            llm,
            model_name: model_name.to_string(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Run the workflow and return one record per document, in order.
    pub fn run<S: AsRef<str>>(
        &self,
        user_description: &str,
        documents: &[S],
    ) -> Result<Vec<ExtractedRecord>, ExtractionError> {
        self.run_report(user_description, documents)
            .map(|report| report.records)
    }

    /// Run the workflow and keep the intermediate requirements and schema.
    ///
    /// The first failure aborts the run; records already extracted for
    /// earlier documents are discarded.
    pub fn run_report<S: AsRef<str>>(
        &self,
        user_description: &str,
        documents: &[S],
    ) -> Result<WorkflowReport, ExtractionError> {
        let run_id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "extraction_workflow",
            run_id = %run_id,
            model = %self.model_name,
            documents = documents.len()
        )
        .entered();
        let start = Instant::now();
        let mut stage = WorkflowStage::Start;
        tracing::debug!(%stage, "Workflow started");

        let requirements = parse_requirements(self.llm.as_ref(), &self.model_name, user_description)?;
        stage = WorkflowStage::RequirementsParsed;
        tracing::debug!(%stage, fields = ?requirements.field_names(), "Identified fields to extract");

        let schema = synthesize_schema(&requirements)?;
        stage = WorkflowStage::SchemaBuilt;
        tracing::info!(%stage, schema = %schema.schema_name(), fields = schema.len(), "Created extraction schema");

        let json_schema = schema.to_json_schema();
        let mut records = Vec::with_capacity(documents.len());
        for (index, document) in documents.iter().enumerate() {
            stage = WorkflowStage::Extracting(index + 1);
            tracing::debug!(%stage, doc_index = index, "Extracting document");

            let record = extract_with_json_schema(
                self.llm.as_ref(),
                &self.model_name,
                &schema,
                &json_schema,
                document.as_ref(),
            )
            .map_err(|e| {
                tracing::error!(doc_index = index, error = %e, "Extraction failed, aborting batch");
                ExtractionError::BatchAborted {
                    index,
                    source: Box::new(e),
                }
            })?;
            records.push(record);
        }

        stage = WorkflowStage::Done;
        tracing::info!(
            %stage,
            records = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Extraction workflow complete"
        );

        Ok(WorkflowReport {
            requirements,
            schema,
            records,
        })
    }
}
