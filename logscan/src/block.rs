use std::ops::RangeInclusive;

use crate::marker::Marker;

/// A line range owned exclusively by one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub marker: Marker,
    /// First line of the start banner.
    pub start: usize,
    /// The tag line (inclusive).
    pub end: usize,
    /// Rows of the last result table found inside the block.
    pub rows: Vec<SubtestRow>,
}

impl Block {
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// One row of a structured result table.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtestRow {
    pub name: String,
    /// Upper-cased status, optionally with a `:SUBSTATUS` suffix.
    pub status: String,
    pub duration: f64,
    pub error_code: i64,
    /// Absolute line the row was read from.
    pub line: usize,
}
