use crate::block::SubtestRow;
use crate::conventions::Patterns;

/// Extract the last result table from a block.
///
/// A table starts at a matching row on the block's first line or right after a
/// separator line (punctuation only), and continues through consecutive
/// matching rows. When the harness reruns a test it prints the table again, so
/// each new separator-led table replaces the previous one and the final one
/// wins. Rows outside a table are ignored, disabled rows are dropped.
///
/// `offset` is the absolute line of `lines[0]`.
pub(crate) fn parse_result_table(lines: &[&str], offset: usize, patterns: &Patterns) -> Vec<SubtestRow> {
    let disabled = patterns.conventions.disabled_status.to_uppercase();
    let mut last_table = Vec::new();
    let mut current = Vec::new();
    let mut inside = false;

    for (idx, line) in lines.iter().enumerate() {
        let Some(row) = parse_row(line.trim(), offset + idx, patterns) else {
            inside = false;
            continue;
        };

        if idx == 0 {
            inside = true;
        } else if is_separator(lines[idx - 1]) {
            if !current.is_empty() {
                last_table = std::mem::take(&mut current);
            }
            inside = true;
        } else if !inside {
            continue;
        }

        if row.status != disabled {
            current.push(row);
        }
    }

    if !current.is_empty() {
        last_table = current;
    }
    last_table
}

fn parse_row(line: &str, absolute: usize, patterns: &Patterns) -> Option<SubtestRow> {
    let caps = patterns.table_row.captures(line)?;
    Some(SubtestRow {
        name: caps[1].to_string(),
        status: caps[2].to_uppercase(),
        duration: caps[3].parse().ok()?,
        error_code: parse_error_code(&caps[4]),
        line: absolute,
    })
}

/// Codes outside the `i64` range saturate rather than drop the row.
fn parse_error_code(text: &str) -> i64 {
    text.parse().unwrap_or(if text.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.chars().any(char::is_alphanumeric)
}
