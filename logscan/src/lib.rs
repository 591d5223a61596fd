pub mod block;
pub mod conventions;
pub mod interval;
pub mod marker;
pub mod parser;
pub mod source;

pub use block::{Block, SubtestRow};
pub use conventions::{ConventionError, Conventions, Patterns, SubtestIndicators};
pub use interval::IntervalSet;
pub use marker::{Marker, SummaryRegion};
pub use parser::{ScanError, ScanErrorKind, ScanWarning, Scanner, WarningKind};
pub use source::LogSource;

/// A segmented harness log.
#[derive(Debug, Clone)]
pub struct ScannedLog {
    pub summary: SummaryRegion,
    /// Every marker listed in the summary, in order, placed or not.
    pub markers: Vec<Marker>,
    /// Placed blocks, in marker order. Their line ranges never intersect.
    pub blocks: Vec<Block>,
    /// Union of all block ranges.
    pub claimed: IntervalSet,
    /// Markers that were skipped.
    pub warnings: Vec<ScanWarning>,
}

impl ScannedLog {
    /// Names of all summary markers, used to decide the overall verdict.
    pub fn marker_names(&self) -> Vec<&str> {
        self.markers.iter().map(|m| m.name.as_str()).collect()
    }
}
