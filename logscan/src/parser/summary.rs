use crate::conventions::Patterns;
use crate::marker::{Marker, SummaryRegion};

pub(crate) enum SummarySearch {
    Found(SummaryRegion),
    MissingStart,
    MissingEnd { start: usize },
}

/// Find the first start phrase, then the first end phrase after it.
pub(crate) fn locate(lines: &[&str], patterns: &Patterns) -> SummarySearch {
    let Some(start) = lines
        .iter()
        .position(|line| patterns.summary_start.is_match(line))
    else {
        return SummarySearch::MissingStart;
    };

    match lines[start + 1..]
        .iter()
        .position(|line| patterns.summary_end.is_match(line))
    {
        Some(offset) => SummarySearch::Found(SummaryRegion {
            start,
            end: start + 1 + offset,
        }),
        None => SummarySearch::MissingEnd { start },
    }
}

/// Collect `(identifier, timestamp)` pairs from the summary region, in order.
/// A line needs both to qualify. Duplicates are kept.
pub(crate) fn extract_markers(
    lines: &[&str],
    region: SummaryRegion,
    patterns: &Patterns,
) -> Vec<Marker> {
    region
        .lines()
        .filter_map(|idx| {
            let line = lines[idx];
            let name = patterns.marker.find(line)?;
            let timestamp = patterns.find_timestamp(line)?;
            Some(Marker {
                name: name.as_str().to_string(),
                timestamp: timestamp.to_string(),
                line: idx,
            })
        })
        .collect()
}
