pub mod structuring; // Requirements parsing, schema synthesis, per-document extraction
