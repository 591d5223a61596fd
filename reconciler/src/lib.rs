pub mod aggregate;
pub mod error;
pub mod matcher;
pub mod record;

use std::path::Path;

use logscan::{Conventions, LogSource, Marker, Patterns, ScanWarning, Scanner};

pub use error::{DiagnosticError, ReconcileError};
pub use record::{FAIL, PASS, ResultRecord, SUMMARY_ITEM};

/// Everything one parse produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub records: Vec<ResultRecord>,
    pub markers: Vec<Marker>,
    /// Markers skipped during segmentation.
    pub warnings: Vec<ScanWarning>,
}

/// Parse an in-memory log with the given conventions.
pub fn parse_log(
    source: &LogSource,
    source_id: usize,
    patterns: &Patterns,
) -> Result<Report, DiagnosticError> {
    let scanned = Scanner::new(source, source_id, patterns).scan()?;
    let records = aggregate::aggregate(source, &scanned, patterns, source_id)?;
    Ok(Report {
        records,
        markers: scanned.markers,
        warnings: scanned.warnings,
    })
}

/// Parse log text with the default conventions.
pub fn parse_text(text: &str) -> Result<Vec<ResultRecord>, DiagnosticError> {
    let patterns = Conventions::default().compile()?;
    let source = LogSource::new(text.to_string());
    parse_log(&source, 0, &patterns).map(|report| report.records)
}

/// Read a log file fully and parse it with the default conventions.
pub fn parse_file(path: &Path) -> Result<Vec<ResultRecord>, DiagnosticError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ReconcileError::IoError(format!("cannot read '{}': {}", path.display(), e))
    })?;
    parse_text(&text)
}
