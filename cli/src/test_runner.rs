use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use logscan::{Conventions, LogSource, ScanWarning};
use reconciler::{Report, ResultRecord};

const FIXTURE_SUFFIX: &str = ".case.log";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must point at this 0-based log line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectedRecord {
    pub test_item: String,
    pub status: String,

    #[serde(default)]
    pub test_name: Option<String>,

    #[serde(default)]
    pub has_subtests: Option<bool>,

    /// Expected `absoluteLineNumber`, 0-based within the log body.
    #[serde(default)]
    pub line: Option<usize>,
}

impl ExpectedRecord {
    fn matches(&self, record: &ResultRecord) -> bool {
        record.test_item == self.test_item
            && record.status == self.status
            && (self.test_name.is_none() || record.test_name == self.test_name)
            && (self.has_subtests.is_none() || record.has_subtests == self.has_subtests)
            && self.line.is_none_or(|line| record.absolute_line_number == line)
    }

    fn describe(&self) -> String {
        let mut text = format!("{} {}", self.test_item, self.status);
        if let Some(name) = &self.test_name {
            text.push_str(&format!(" test_name={}", name));
        }
        if let Some(has_subtests) = self.has_subtests {
            text.push_str(&format!(" has_subtests={}", has_subtests));
        }
        if let Some(line) = self.line {
            text.push_str(&format!(" line={}", line));
        }
        text
    }
}

#[derive(Debug, Deserialize)]
pub struct FixtureConfig {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    /// The fatal error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected status of the closing summary record.
    #[serde(default)]
    pub expect_summary: Option<String>,

    /// Records that must appear, in this order (other records may sit between).
    #[serde(default)]
    pub expect_records: Option<Vec<ExpectedRecord>>,

    /// Expected warnings. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,

    /// Harness conventions for this log; defaults when absent.
    #[serde(default)]
    pub conventions: Option<Conventions>,
}

/// Split a `.case.log` file into its TOML front matter and the log body.
fn parse_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- front matter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- front matter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, body))
}

pub enum FixtureOutcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: FixtureOutcome,
}

impl FixtureResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(FIXTURE_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_fixture(path: &Path) -> FixtureResult {
    let fail = |description: Option<String>, reason: String| FixtureResult {
        path: path.to_path_buf(),
        description,
        outcome: FixtureOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, body) = match parse_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("front matter error: {}", e)),
    };
    let description = config.description.clone();

    let patterns = match config.conventions.clone().unwrap_or_default().compile() {
        Ok(p) => p,
        Err(e) => return fail(description, format!("invalid conventions: {}", e)),
    };

    let source = LogSource::new(body.to_string());
    let result = reconciler::parse_log(&source, 0, &patterns);

    let reason = match (&config.expect_error, result) {
        (Some(expected), Err(err)) => {
            let err_str = err.to_string();
            if err_str.contains(expected.as_str()) {
                None
            } else {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, err_str
                ))
            }
        }
        (Some(expected), Ok(_)) => Some(format!(
            "expected error containing \"{}\", but parsing succeeded",
            expected
        )),
        (None, Err(err)) => Some(format!("unexpected error: {}", err)),
        (None, Ok(report)) => check_report(&config, &report),
    };

    match reason {
        Some(reason) => fail(description, reason),
        None => FixtureResult {
            path: path.to_path_buf(),
            description,
            outcome: FixtureOutcome::Pass,
        },
    }
}

/// Check a successful parse against the fixture. Returns `Some(reason)` on mismatch.
fn check_report(config: &FixtureConfig, report: &Report) -> Option<String> {
    if let Some(expected) = &config.expect_summary {
        match report.records.last() {
            Some(summary) if summary.is_summary() => {
                if &summary.status != expected {
                    return Some(format!(
                        "expected summary {}, got {}",
                        expected, summary.status
                    ));
                }
            }
            _ => return Some("output has no summary record".to_string()),
        }
    }

    if let Some(expected) = &config.expect_records {
        if let Some(reason) = check_records(&report.records, expected) {
            return Some(reason);
        }
    }

    if let Some(expected) = &config.expect_warnings {
        if let Some(reason) = check_warnings(&report.warnings, expected) {
            return Some(reason);
        }
    }

    None
}

fn check_records(records: &[ResultRecord], expected: &[ExpectedRecord]) -> Option<String> {
    let mut remaining = records.iter();
    for (i, want) in expected.iter().enumerate() {
        if !remaining.any(|record| want.matches(record)) {
            let actual: Vec<String> = records
                .iter()
                .map(|r| {
                    format!(
                        "  - {} {} line={} name={}",
                        r.test_item,
                        r.status,
                        r.absolute_line_number,
                        r.test_name.as_deref().unwrap_or("-")
                    )
                })
                .collect();
            return Some(format!(
                "record[{}]: no match for \"{}\" (in order)\n  actual records:\n{}",
                i,
                want.describe(),
                actual.join("\n")
            ));
        }
    }
    None
}

fn check_warnings(warnings: &[ScanWarning], expected: &[ExpectedWarning]) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual.is_empty() {
                "    (none)".to_string()
            } else {
                actual.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected).enumerate() {
        let msg = actual.to_string();
        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }
        if let Some(line) = expected.line {
            if actual.line != line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but it points at line {}",
                    i, line, actual.line
                ));
            }
        }
    }

    None
}

/// Discover fixtures grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(FIXTURE_SUFFIX))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// List available categories for the given fixture path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} fixtures)", label, files.len());
    }
}

/// ANSI styling for the runner's report, or plain text with `--no-color`.
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

/// Run all fixtures under `path` (or a single file).
/// If `categories` is non-empty, only fixtures in those categories run.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { color: !no_color };

    let selected: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
            return 1;
        }
        let selected = select_categories(&all_categories, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
    };
    let show_headers = !path.is_file();

    let mut passed = 0usize;
    let mut failures: Vec<FixtureResult> = Vec::new();

    for (cat, files) in &selected {
        if show_headers {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", palette.bold(header));
        }

        for file in files {
            let result = run_fixture(file);
            match &result.outcome {
                FixtureOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), result.label());
                }
                FixtureOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let FixtureOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("31", "FAILED"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

fn select_categories(
    all: &BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> Vec<(String, Vec<PathBuf>)> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    }

    let mut filtered: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let prefix = format!("{}/", req);
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&prefix) {
                filtered.insert(cat.clone(), files.clone());
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered.into_iter().collect()
}
