//! CSV ingestion: reading, header resolution, row validation and dataset assembly.

pub mod dataset;
pub mod fields;
pub mod raw;
pub mod validate;

pub use dataset::{Dataset, DatasetSummary, build_dataset};
pub use fields::{CanonicalField, FieldMapping, FieldPatterns, ResolvedColumn, resolve_fields};
pub use raw::{CsvError, ParseDiagnostic, ParsedCsv, RawRow, RawValue, parse_csv, read_csv_file};
pub use validate::{
    FieldIssue, FieldProblem, Features, RejectionEntry, RowOutcome, ValidatedRecord, validate_row,
};

/// A dataset together with the column mapping and parser notes it came from.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub dataset: Dataset,
    pub mapping: FieldMapping,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Resolve, validate and aggregate an already parsed file.
pub fn ingest_parsed(parsed: &ParsedCsv, patterns: &FieldPatterns) -> IngestReport {
    let mapping = resolve_fields(&parsed.headers, patterns);
    for field in mapping.missing() {
        tracing::warn!("No column matches field '{field}'; every row will be rejected");
    }
    for diagnostic in &parsed.diagnostics {
        tracing::warn!("CSV shape: {diagnostic}");
    }
    let dataset = build_dataset(&parsed.rows, &mapping);
    let summary = dataset.summary();
    tracing::info!(
        "Validated {} rows: {} valid, {} rejected",
        summary.total(),
        summary.valid,
        summary.rejected
    );
    IngestReport {
        dataset,
        mapping,
        diagnostics: parsed.diagnostics.clone(),
    }
}

/// Parse CSV text and build the dataset in one step.
pub fn ingest_text(text: &str, patterns: &FieldPatterns) -> Result<IngestReport, CsvError> {
    let parsed = parse_csv(text)?;
    Ok(ingest_parsed(&parsed, patterns))
}
