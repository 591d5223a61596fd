use crate::interval::IntervalSet;
use crate::marker::Marker;

/// Outcome of placing one marker's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Placed { start: usize, end: usize },
    TagNotFound,
    BannerNotFound { anchor: usize },
}

/// Carves the log into blocks, one marker at a time.
///
/// Owns the global consumed-line set: once a block is placed its lines are
/// never handed to another marker.
pub(crate) struct Segmenter<'a> {
    lines: &'a [&'a str],
    border: char,
    consumed: IntervalSet,
}

impl<'a> Segmenter<'a> {
    pub(crate) fn new(lines: &'a [&'a str], border: char) -> Self {
        Segmenter {
            lines,
            border,
            consumed: IntervalSet::new(),
        }
    }

    pub(crate) fn place(&mut self, marker: &Marker) -> Placement {
        let Some(anchor) = self.find_anchor(&marker.tag()) else {
            return Placement::TagNotFound;
        };
        let Some(start) = self.find_banner(anchor, &marker.timestamp) else {
            return Placement::BannerNotFound { anchor };
        };
        self.consumed.insert(start, anchor);
        Placement::Placed { start, end: anchor }
    }

    pub(crate) fn into_consumed(self) -> IntervalSet {
        self.consumed
    }

    /// First unclaimed line containing the marker's tag.
    fn find_anchor(&self, tag: &str) -> Option<usize> {
        self.consumed
            .free_lines(self.lines.len())
            .find(|&idx| self.lines[idx].trim().contains(tag))
    }

    /// Walk upward from the anchor to the nearest banner carrying `timestamp`.
    /// Returns the banner's top line.
    ///
    /// The cursor stops at the previous block below the anchor, so a banner
    /// can never overlap a claimed line.
    fn find_banner(&self, anchor: usize, timestamp: &str) -> Option<usize> {
        let floor = self.consumed.last_below(anchor).map_or(0, |line| line + 1);
        (floor + 2..anchor)
            .rev()
            .find(|&bottom| {
                is_banner(
                    self.lines[bottom - 2],
                    self.lines[bottom - 1],
                    self.lines[bottom],
                    self.border,
                    timestamp,
                )
            })
            .map(|bottom| bottom - 2)
    }
}

fn is_border(line: &str, border: char) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == border)
}

/// A three-line box: two border rows around `#  ... timestamp ...  #`.
fn is_banner(top: &str, middle: &str, bottom: &str, border: char, timestamp: &str) -> bool {
    if !is_border(top, border) || !is_border(bottom, border) {
        return false;
    }
    let middle = middle.trim();
    let Some(interior) = middle
        .strip_prefix(border)
        .and_then(|rest| rest.strip_suffix(border))
    else {
        return false;
    };
    let interior = interior.trim();
    !interior.is_empty() && interior.contains(timestamp)
}
