use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// The textual conventions a harness uses to delimit its log.
///
/// Every literal the scanner looks for lives here so that a harness with a
/// slightly different dialect can be handled with a TOML file instead of a
/// code change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Conventions {
    /// Phrase opening the summary region (whole word, case-insensitive).
    pub summary_start: String,
    /// Phrase closing the summary region (whole word, case-insensitive).
    pub summary_end: String,
    /// Reserved prefix of block identifiers listed in the summary.
    pub marker_prefix: String,
    /// Character repeated along the edges of a start banner.
    pub banner_border: char,
    /// Table status whose rows are dropped.
    pub disabled_status: String,
    /// Row name standing for a synthetic end marker; always reported as passing.
    pub synthetic_end_name: String,
    /// Row name of the per-table aggregate line, never emitted as a subtest.
    pub aggregate_row_name: String,
    /// Substring that marks a trailing failure after the last block.
    pub failure_token: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Conventions {
            summary_start: "Test_Start".to_string(),
            summary_end: "Capture end".to_string(),
            marker_prefix: "_f_".to_string(),
            banner_border: '#',
            disabled_status: "DISABLED".to_string(),
            synthetic_end_name: "endtest".to_string(),
            aggregate_row_name: "total".to_string(),
            failure_token: "errorid".to_string(),
        }
    }
}

impl Conventions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConventionError> {
        toml::from_str(text).map_err(|e| ConventionError::Toml(e.to_string()))
    }

    /// Validate the conventions and compile the patterns derived from them.
    pub fn compile(&self) -> Result<Patterns, ConventionError> {
        let required = [
            ("summary_start", &self.summary_start),
            ("summary_end", &self.summary_end),
            ("marker_prefix", &self.marker_prefix),
            ("disabled_status", &self.disabled_status),
            ("synthetic_end_name", &self.synthetic_end_name),
            ("aggregate_row_name", &self.aggregate_row_name),
            ("failure_token", &self.failure_token),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConventionError::Empty(field));
            }
        }
        if self.banner_border.is_whitespace() || self.banner_border.is_alphanumeric() {
            return Err(ConventionError::InvalidBorder(self.banner_border));
        }

        Ok(Patterns {
            summary_start: build("summary_start", &whole_word(&self.summary_start), true)?,
            summary_end: build("summary_end", &whole_word(&self.summary_end), true)?,
            marker: build(
                "marker_prefix",
                &format!(r"{}\w+", regex::escape(&self.marker_prefix)),
                false,
            )?,
            timestamp: build("timestamp", r"\d{2}:\d{2}:\d{2}", false)?,
            table_row: build(
                "table_row",
                r"^(\S+)\s+([A-Z]+(?::[A-Z]+)?)\s+([0-9]*\.?[0-9]+)\s+(-?\d+)\s*$",
                true,
            )?,
            generic_start: build("generic_start", "test start", true)?,
            generic_end: build("generic_end", "test end", true)?,
            conventions: self.clone(),
        })
    }
}

/// Regexes compiled once per parse from a [`Conventions`] value.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub conventions: Conventions,
    pub summary_start: Regex,
    pub summary_end: Regex,
    pub marker: Regex,
    pub timestamp: Regex,
    pub table_row: Regex,
    pub generic_start: Regex,
    pub generic_end: Regex,
}

impl Patterns {
    /// First `HH:MM:SS` timestamp on the line.
    pub fn find_timestamp<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.timestamp.find(line).map(|m| m.as_str())
    }

    /// The specific phrasings that announce the start of subtest `name`.
    pub fn subtest_indicators(&self, name: &str) -> Result<SubtestIndicators, ConventionError> {
        let name = regex::escape(name);
        Ok(SubtestIndicators {
            phrases: vec![
                build("subtest_begin", &format!("test {name}: begin"), true)?,
                build("subtest_executing", &format!(r"executing\s+{name}\s*$"), true)?,
                build("subtest_name_attr", &format!(r#"NAME="{name}""#), true)?,
                build("subtest_start", &format!(r"{name}\s+test\s+start"), true)?,
            ],
        })
    }
}

/// Start phrases for one subtest. Any one of them is enough.
#[derive(Debug, Clone)]
pub struct SubtestIndicators {
    phrases: Vec<Regex>,
}

impl SubtestIndicators {
    pub fn matches(&self, line: &str) -> bool {
        self.phrases.iter().any(|re| re.is_match(line))
    }
}

/// Escape `phrase`, adding word boundaries where it starts or ends with a
/// word character.
fn whole_word(phrase: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if phrase.starts_with(is_word) { r"\b" } else { "" };
    let trail = if phrase.ends_with(is_word) { r"\b" } else { "" };
    format!("{}{}{}", lead, regex::escape(phrase), trail)
}

fn build(field: &'static str, pattern: &str, case_insensitive: bool) -> Result<Regex, ConventionError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| ConventionError::Pattern {
            field,
            message: e.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConventionError {
    Toml(String),
    Empty(&'static str),
    InvalidBorder(char),
    Pattern { field: &'static str, message: String },
}

impl fmt::Display for ConventionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConventionError::Toml(msg) => write!(f, "invalid conventions file: {}", msg),
            ConventionError::Empty(field) => write!(f, "convention '{}' must not be empty", field),
            ConventionError::InvalidBorder(c) => {
                write!(f, "banner border {:?} must be a visible punctuation character", c)
            }
            ConventionError::Pattern { field, message } => {
                write!(f, "pattern for '{}' failed to compile: {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConventionError {}
