use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// Fatal scan failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// No line carries the summary start phrase.
    MissingSummaryStart { phrase: String },
    /// The summary start phrase is never followed by the end phrase.
    MissingSummaryEnd { phrase: String },
    /// The summary region lists no identifier with a timestamp.
    NoMarkers { prefix: String },
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanErrorKind::MissingSummaryStart { phrase } => {
                write!(f, "could not locate summary block: no '{}' line", phrase)
            }
            ScanErrorKind::MissingSummaryEnd { phrase } => {
                write!(f, "could not locate summary block: '{}' never follows its start", phrase)
            }
            ScanErrorKind::NoMarkers { prefix } => {
                write!(f, "no {} markers found in summary block", prefix)
            }
        }
    }
}

/// A fatal scan error with the log lines it concerns.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    /// Byte span in the log, when the error can be pinned to lines.
    pub span: Option<Range<usize>>,
    /// First 0-based line of the span.
    pub line: Option<usize>,
    pub file_id: usize,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, file_id: usize) -> Self {
        ScanError {
            kind,
            span: None,
            line: None,
            file_id,
        }
    }

    pub fn at(mut self, line: usize, span: Range<usize>) -> Self {
        self.line = Some(line);
        self.span = Some(span);
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::error().with_message(self.kind.to_string());
        match &self.span {
            Some(span) => diagnostic.with_labels(vec![Label::primary(self.file_id, span.clone())]),
            None => diagnostic,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ScanError {}

/// Why a marker contributed no block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    TagNotFound,
    BannerNotFound,
}

/// A non-fatal scan problem: the marker is skipped and scanning continues.
#[derive(Debug, Clone)]
pub struct ScanWarning {
    pub kind: WarningKind,
    pub marker: String,
    /// Line the warning points at: the summary entry for a missing tag, the
    /// tag line for a missing banner.
    pub line: usize,
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ScanWarning {
    pub fn message(&self) -> String {
        match self.kind {
            WarningKind::TagNotFound => format!("<{}> tag not found, skipping", self.marker),
            WarningKind::BannerNotFound => {
                format!("3-line banner not found before <{}>, skipping", self.marker)
            }
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let note = match self.kind {
            WarningKind::TagNotFound => "every listed marker needs an unclaimed tag line",
            WarningKind::BannerNotFound => {
                "the banner's middle line must contain the marker's summary timestamp"
            }
        };
        Diagnostic::new(Severity::Warning)
            .with_message(self.message())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(vec![note.to_string()])
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
