use logscan::{ConventionError, IntervalSet, Patterns, SubtestIndicators, SubtestRow};

use crate::record::PASS;

/// Where a subtest's narrative was found, relative to the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedTestCase {
    pub name: String,
    pub start_line: usize,
    pub start_time: Option<String>,
    pub end_line: Option<usize>,
    pub end_time: Option<String>,
}

/// A located test case paired with the status of its table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedResult {
    pub name: String,
    pub status: String,
    pub start_line: usize,
    pub end_line: Option<usize>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockMatch {
    /// No table rows, or none of them could be located.
    Empty,
    Matched {
        results: Vec<CorrelatedResult>,
        /// Status of the table's last row; the block's overall status.
        status: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    Conventions(ConventionError),
    Unmatched {
        case: String,
        row: String,
        /// Absolute line of the offending table row.
        row_line: usize,
    },
}

impl From<ConventionError> for MatchError {
    fn from(err: ConventionError) -> Self {
        MatchError::Conventions(err)
    }
}

enum StartSearch {
    /// A generic "test start" line with a timestamp at or above the indicator.
    Found {
        line: usize,
        time: Option<String>,
        indicator: usize,
    },
    /// The specific phrase exists but nothing above it opens a test.
    Unanchored,
    Absent,
}

/// Locate every row's narrative inside `lines` and pair them with the rows.
///
/// Rows without a start phrase are dropped. Locating stops if the first
/// located case ends above its own start. Pairing is positional: the i-th
/// located case must belong to the i-th row unless one of them is the
/// synthetic end marker.
pub fn match_block(
    lines: &[&str],
    rows: &[SubtestRow],
    patterns: &Patterns,
) -> Result<BlockMatch, MatchError> {
    let Some(last_row) = rows.last() else {
        return Ok(BlockMatch::Empty);
    };

    let mut consumed = IntervalSet::new();
    let mut located = Vec::new();

    for row in rows {
        let indicators = patterns.subtest_indicators(&row.name)?;
        let start = find_start(lines, &indicators, &consumed, patterns);
        let end = find_end(lines, &consumed, patterns);

        let StartSearch::Found {
            line: start_line,
            time: start_time,
            indicator,
        } = start
        else {
            continue;
        };

        let claim_end = end.as_ref().map_or(indicator, |&(line, _)| line);
        // The first span ending above its own start claims nothing: stop.
        if claim_end < start_line && consumed.is_empty() {
            break;
        }
        consumed.insert(start_line, claim_end);

        let (end_line, end_time) = match end {
            Some((line, time)) => (Some(line), time),
            None => (None, None),
        };
        located.push(LocatedTestCase {
            name: row.name.clone(),
            start_line,
            start_time,
            end_line,
            end_time,
        });
    }

    if located.is_empty() {
        return Ok(BlockMatch::Empty);
    }

    let results = correlate(located, rows, &patterns.conventions.synthetic_end_name)?;
    Ok(BlockMatch::Matched {
        results,
        status: last_row.status.clone(),
    })
}

fn find_start(
    lines: &[&str],
    indicators: &SubtestIndicators,
    consumed: &IntervalSet,
    patterns: &Patterns,
) -> StartSearch {
    let Some(indicator) = consumed
        .free_lines(lines.len())
        .find(|&idx| indicators.matches(lines[idx]))
    else {
        return StartSearch::Absent;
    };

    // The specific phrase is often preceded by a generic banner line that
    // carries the timestamp.
    (0..=indicator)
        .rev()
        .find_map(|idx| {
            let line = lines[idx];
            if !patterns.generic_start.is_match(line) {
                return None;
            }
            let time = patterns.find_timestamp(line)?;
            Some(StartSearch::Found {
                line: idx,
                time: Some(time.to_string()),
                indicator,
            })
        })
        .unwrap_or(StartSearch::Unanchored)
}

fn find_end(
    lines: &[&str],
    consumed: &IntervalSet,
    patterns: &Patterns,
) -> Option<(usize, Option<String>)> {
    let idx = consumed
        .free_lines(lines.len())
        .find(|&idx| patterns.generic_end.is_match(lines[idx]))?;
    let time = patterns.find_timestamp(lines[idx]).map(str::to_string);
    Some((idx, time))
}

fn correlate(
    located: Vec<LocatedTestCase>,
    rows: &[SubtestRow],
    sentinel: &str,
) -> Result<Vec<CorrelatedResult>, MatchError> {
    let is_sentinel = |name: &str| name.to_lowercase() == sentinel.to_lowercase();

    located
        .into_iter()
        .zip(rows)
        .map(|(case, row)| {
            let status = if case.name == row.name {
                row.status.clone()
            } else if is_sentinel(&case.name) || is_sentinel(&row.name) {
                PASS.to_string()
            } else {
                return Err(MatchError::Unmatched {
                    case: case.name,
                    row: row.name.clone(),
                    row_line: row.line,
                });
            };
            Ok(CorrelatedResult {
                name: case.name,
                status,
                start_line: case.start_line,
                end_line: case.end_line,
                start_time: case.start_time,
                end_time: case.end_time,
            })
        })
        .collect()
}
