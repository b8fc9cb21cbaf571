//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Extract typed records from documents described in plain language.
#[derive(Parser, Debug)]
#[command(name = "dynextract")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// What to extract, e.g. "project title and total funding in euros"
    #[arg(value_name = "DESCRIPTION")]
    pub description: String,

    /// Documents to extract from, processed in the given order
    #[arg(value_name = "DOCUMENT", required = true)]
    pub documents: Vec<PathBuf>,
}
