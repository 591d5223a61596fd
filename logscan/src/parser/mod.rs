pub mod error;
mod segment;
mod summary;
mod table;

pub use error::{ScanError, ScanErrorKind, ScanWarning, WarningKind};

use crate::block::Block;
use crate::conventions::Patterns;
use crate::marker::{Marker, SummaryRegion};
use crate::source::LogSource;
use crate::ScannedLog;

use segment::{Placement, Segmenter};
use summary::SummarySearch;

/// Scanner entry point: summary, markers, then one block per marker.
pub struct Scanner<'a> {
    source: &'a LogSource,
    file_id: usize,
    patterns: &'a Patterns,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a LogSource, file_id: usize, patterns: &'a Patterns) -> Self {
        Scanner {
            source,
            file_id,
            patterns,
        }
    }

    /// Locate the summary region and read its markers.
    pub fn markers(&self) -> Result<(SummaryRegion, Vec<Marker>), ScanError> {
        let lines: Vec<&str> = self.source.lines().collect();
        self.markers_in(&lines)
    }

    /// Segment the whole log.
    ///
    /// Markers whose tag or banner cannot be found are skipped with a warning;
    /// only a missing summary or an empty marker list is fatal.
    pub fn scan(&self) -> Result<ScannedLog, ScanError> {
        let lines: Vec<&str> = self.source.lines().collect();
        let (summary, markers) = self.markers_in(&lines)?;

        let mut segmenter = Segmenter::new(&lines, self.patterns.conventions.banner_border);
        let mut blocks = Vec::new();
        let mut warnings = Vec::new();

        for marker in &markers {
            match segmenter.place(marker) {
                Placement::Placed { start, end } => {
                    let rows = table::parse_result_table(&lines[start..=end], start, self.patterns);
                    blocks.push(Block {
                        marker: marker.clone(),
                        start,
                        end,
                        rows,
                    });
                }
                Placement::TagNotFound => {
                    warnings.push(self.warning(WarningKind::TagNotFound, marker, marker.line));
                }
                Placement::BannerNotFound { anchor } => {
                    warnings.push(self.warning(WarningKind::BannerNotFound, marker, anchor));
                }
            }
        }

        Ok(ScannedLog {
            summary,
            markers,
            blocks,
            claimed: segmenter.into_consumed(),
            warnings,
        })
    }

    fn markers_in(&self, lines: &[&str]) -> Result<(SummaryRegion, Vec<Marker>), ScanError> {
        let conventions = &self.patterns.conventions;
        let summary = match summary::locate(lines, self.patterns) {
            SummarySearch::Found(region) => region,
            SummarySearch::MissingStart => {
                return Err(ScanError::new(
                    ScanErrorKind::MissingSummaryStart {
                        phrase: conventions.summary_start.clone(),
                    },
                    self.file_id,
                ));
            }
            SummarySearch::MissingEnd { start } => {
                return Err(ScanError::new(
                    ScanErrorKind::MissingSummaryEnd {
                        phrase: conventions.summary_end.clone(),
                    },
                    self.file_id,
                )
                .at(start, self.source.span(start..=start)));
            }
        };

        let markers = summary::extract_markers(lines, summary, self.patterns);
        if markers.is_empty() {
            return Err(ScanError::new(
                ScanErrorKind::NoMarkers {
                    prefix: conventions.marker_prefix.clone(),
                },
                self.file_id,
            )
            .at(summary.start, self.source.span(summary.lines())));
        }
        Ok((summary, markers))
    }

    fn warning(&self, kind: WarningKind, marker: &Marker, line: usize) -> ScanWarning {
        ScanWarning {
            kind,
            marker: marker.name.clone(),
            line,
            span: self.source.span(line..=line),
            file_id: self.file_id,
        }
    }
}
