use std::process::ExitCode;

use clap::Parser;
use dynextract::cli::Args;
use dynextract::config::{self, ServiceConfig};

fn main() -> ExitCode {
    let args = Args::parse();
    dynextract::init_tracing();

    let mut documents = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        match std::fs::read_to_string(path) {
            Ok(text) => documents.push(text),
            Err(e) => {
                eprintln!("cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let workflow = match ServiceConfig::from_env().and_then(|c| dynextract::workflow_from_config(&c)) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("{} v{} using model {}", config::APP_NAME, config::APP_VERSION, workflow.model_name());

    let report = match workflow.run_report(&args.description, &documents) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("extraction failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    for (path, record) in args.documents.iter().zip(&report.records) {
        let missing: Vec<&str> = record
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            tracing::info!(document = %path.display(), fields = ?missing, "Optional fields not found");
        }
    }

    let output = serde_json::json!({
        "schema": report.schema.to_json_schema(),
        "records": report.records,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("cannot render results: {e}");
            ExitCode::FAILURE
        }
    }
}
