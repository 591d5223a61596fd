use std::ops::RangeInclusive;

/// A monotonically growing set of consumed line indices.
///
/// Stored as sorted, disjoint, non-adjacent inclusive ranges. Lines are only
/// ever added; nothing is removed once claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    ranges: Vec<(usize, usize)>,
}

impl IntervalSet {
    pub fn new() -> Self {
        IntervalSet { ranges: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Claim every line in `start..=end`. An inverted range claims nothing.
    pub fn insert(&mut self, start: usize, end: usize) {
        if start > end {
            return;
        }

        // First stored range that overlaps or touches the new one.
        let lo = self
            .ranges
            .partition_point(|&(_, e)| e.saturating_add(1) < start);
        let mut merged = (start, end);
        let mut hi = lo;
        while hi < self.ranges.len() && self.ranges[hi].0 <= end.saturating_add(1) {
            merged.0 = merged.0.min(self.ranges[hi].0);
            merged.1 = merged.1.max(self.ranges[hi].1);
            hi += 1;
        }
        self.ranges.splice(lo..hi, std::iter::once(merged));
    }

    pub fn contains(&self, line: usize) -> bool {
        let idx = self.ranges.partition_point(|&(_, e)| e < line);
        self.ranges.get(idx).is_some_and(|&(s, _)| s <= line)
    }

    /// The highest consumed line strictly below `line`.
    pub fn last_below(&self, line: usize) -> Option<usize> {
        let idx = self.ranges.partition_point(|&(s, _)| s < line);
        let (_, end) = *self.ranges.get(idx.checked_sub(1)?)?;
        Some(end.min(line - 1))
    }

    /// Lines in `0..limit` that are not consumed, in ascending order.
    pub fn free_lines(&self, limit: usize) -> impl Iterator<Item = usize> + '_ {
        (0..limit).filter(move |&line| !self.contains(line))
    }

    pub fn ranges(&self) -> impl Iterator<Item = RangeInclusive<usize>> + '_ {
        self.ranges.iter().map(|&(s, e)| s..=e)
    }
}
