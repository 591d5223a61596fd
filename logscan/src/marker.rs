use std::ops::RangeInclusive;

/// The log region that lists every test the harness executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRegion {
    /// Line holding the summary start phrase.
    pub start: usize,
    /// Line holding the summary end phrase (inclusive).
    pub end: usize,
}

impl SummaryRegion {
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// A block identifier and its start timestamp, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Identifier including its reserved prefix, e.g. `_f_login`.
    pub name: String,
    /// `HH:MM:SS` timestamp the banner of this block must carry.
    pub timestamp: String,
    /// Summary line the marker was read from.
    pub line: usize,
}

impl Marker {
    /// The angle-bracket tag closing this marker's block.
    pub fn tag(&self) -> String {
        format!("<{}>", self.name)
    }
}
