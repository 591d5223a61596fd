use std::fmt;
use std::ops::Range;

use logscan::{ConventionError, ScanError, ScanErrorKind};

#[derive(Debug)]
pub enum ReconcileError {
    Scan(ScanErrorKind),
    Conventions(ConventionError),
    /// The i-th located test case does not belong to the i-th table row.
    UnmatchedResult {
        marker: String,
        case: String,
        row: String,
    },
    IoError(String),
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Scan(kind) => kind.fmt(f),
            ReconcileError::Conventions(err) => err.fmt(f),
            ReconcileError::UnmatchedResult { marker, case, row } => write!(
                f,
                "no matching result found for test case '{}' in {} (table row is '{}')",
                case, marker, row
            ),
            ReconcileError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ReconcileError {}

/// A fatal parse error enriched with the log location it concerns.
#[derive(Debug)]
pub struct DiagnosticError {
    pub error: ReconcileError,
    pub span: Option<Range<usize>>,
    /// 0-based log line of the span start.
    pub line: Option<usize>,
    pub source_id: usize,
}

impl DiagnosticError {
    pub fn at(error: ReconcileError, line: usize, span: Range<usize>, source_id: usize) -> Self {
        DiagnosticError {
            error,
            span: Some(span),
            line: Some(line),
            source_id,
        }
    }
}

impl From<ReconcileError> for DiagnosticError {
    fn from(error: ReconcileError) -> Self {
        DiagnosticError {
            error,
            span: None,
            line: None,
            source_id: 0,
        }
    }
}

impl From<ScanError> for DiagnosticError {
    fn from(err: ScanError) -> Self {
        DiagnosticError {
            error: ReconcileError::Scan(err.kind),
            span: err.span,
            line: err.line,
            source_id: err.file_id,
        }
    }
}

impl From<ConventionError> for DiagnosticError {
    fn from(err: ConventionError) -> Self {
        ReconcileError::Conventions(err).into()
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for DiagnosticError {}
