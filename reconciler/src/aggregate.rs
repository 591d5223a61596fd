use logscan::{Block, LogSource, Patterns, ScannedLog};

use crate::error::{DiagnosticError, ReconcileError};
use crate::matcher::{self, BlockMatch, MatchError};
use crate::record::{FAIL, PASS, ResultRecord, SUMMARY_ITEM};

/// Turn a segmented log into the flat record list.
///
/// Records come out block by block (subtests first, then the block record)
/// and end with the summary verdict. A correlation mismatch in any block
/// aborts the whole parse.
pub fn aggregate(
    source: &LogSource,
    scanned: &ScannedLog,
    patterns: &Patterns,
    source_id: usize,
) -> Result<Vec<ResultRecord>, DiagnosticError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut records = Vec::new();

    for block in &scanned.blocks {
        let block_lines = &lines[block.lines()];
        let matched = matcher::match_block(block_lines, &block.rows, patterns)
            .map_err(|err| match_error(err, block, source, source_id))?;
        append_block(&mut records, block, block_lines, matched, patterns);
    }

    if let Some(last_block) = scanned.blocks.last() {
        if trailing_failure(&lines, last_block.end + 1, scanned.summary.start, patterns) {
            if let Some(last) = records.last_mut() {
                last.status = FAIL.to_string();
            }
        }
    }

    let marker_names = scanned.marker_names();
    let summary_failed = records
        .iter()
        .any(|r| marker_names.contains(&r.test_item.as_str()) && r.failed());

    records.push(ResultRecord {
        test_item: SUMMARY_ITEM.to_string(),
        test_name: None,
        status: if summary_failed { FAIL } else { PASS }.to_string(),
        absolute_line_number: scanned.summary.start.saturating_sub(1),
        absolute_end_line_number: Some(scanned.summary.end),
        start_time: None,
        end_time: None,
        has_subtests: None,
    });

    Ok(records)
}

fn append_block(
    records: &mut Vec<ResultRecord>,
    block: &Block,
    block_lines: &[&str],
    matched: BlockMatch,
    patterns: &Patterns,
) {
    let marker = &block.marker.name;
    let start_time = block_lines
        .first()
        .and_then(|line| patterns.find_timestamp(line))
        .map(str::to_string);
    let end_time = block_lines
        .last()
        .and_then(|line| patterns.find_timestamp(line))
        .map(str::to_string);

    // Heuristic: a block with no correlated rows is reported as passing,
    // whatever its narrative says.
    let BlockMatch::Matched { results, status } = matched else {
        records.push(ResultRecord {
            test_item: marker.clone(),
            test_name: None,
            status: PASS.to_string(),
            absolute_line_number: block.start,
            absolute_end_line_number: Some(block.end),
            start_time,
            end_time,
            has_subtests: Some(false),
        });
        return;
    };

    let aggregate_name = patterns.conventions.aggregate_row_name.to_lowercase();
    for result in results {
        if result.name.to_lowercase() == aggregate_name {
            continue;
        }
        records.push(ResultRecord {
            test_item: marker.clone(),
            test_name: Some(result.name),
            status: result.status,
            absolute_line_number: block.start + result.start_line,
            absolute_end_line_number: result.end_line.map(|line| block.start + line),
            start_time: result.start_time,
            end_time: result.end_time,
            has_subtests: None,
        });
    }

    records.push(ResultRecord {
        test_item: marker.clone(),
        test_name: None,
        status,
        absolute_line_number: block.start,
        absolute_end_line_number: Some(block.end),
        start_time,
        end_time,
        has_subtests: Some(true),
    });
}

/// Heuristic: an error id printed after the last block but before the
/// summary means the last test failed even if its table says otherwise.
fn trailing_failure(lines: &[&str], from: usize, to: usize, patterns: &Patterns) -> bool {
    if from >= to {
        return false;
    }
    let token = patterns.conventions.failure_token.to_lowercase();
    lines[from..to]
        .iter()
        .any(|line| line.to_lowercase().contains(&token))
}

fn match_error(err: MatchError, block: &Block, source: &LogSource, source_id: usize) -> DiagnosticError {
    match err {
        MatchError::Conventions(err) => err.into(),
        MatchError::Unmatched { case, row, row_line } => DiagnosticError::at(
            ReconcileError::UnmatchedResult {
                marker: block.marker.name.clone(),
                case,
                row,
            },
            row_line,
            source.span(row_line..=row_line),
            source_id,
        ),
    }
}
