//! Build log filtering pipeline: pattern, severity, tail, then max lines.

use std::str::FromStr;

use regex::Regex;

use super::error::ClientError;

const ERROR_MARKERS: &[&str] = &["error", "fail", "exception", "fatal", "[e]", "[error]"];
const WARNING_MARKERS: &[&str] = &["warn", "warning", "[w]", "[warn]"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl FromStr for Severity {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(ClientError::Validation(
                "invalid severity: must be 'error', 'warning', or 'info'".to_string(),
            )),
        }
    }
}

impl Severity {
    fn matches(self, line: &str) -> bool {
        let lower = line.to_lowercase();
        let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
        match self {
            Severity::Error => has_any(ERROR_MARKERS),
            Severity::Warning => has_any(WARNING_MARKERS),
            Severity::Info => {
                !line.trim().is_empty() && !has_any(ERROR_MARKERS) && !has_any(WARNING_MARKERS)
            }
        }
    }
}

/// Line matcher built from `filterPattern`. Falls back to a literal substring
/// search when the pattern is not a valid regular expression.
#[derive(Debug)]
pub enum LinePattern {
    Regex(Regex),
    Literal(String),
}

impl LinePattern {
    pub fn new(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => LinePattern::Regex(regex),
            Err(_) => LinePattern::Literal(pattern.to_string()),
        }
    }

    fn matches(&self, line: &str) -> bool {
        match self {
            LinePattern::Regex(regex) => regex.is_match(line),
            LinePattern::Literal(literal) => line.contains(literal.as_str()),
        }
    }
}

#[derive(Debug, Default)]
pub struct LogFilter {
    pub pattern: Option<LinePattern>,
    pub severity: Option<Severity>,
    pub tail_lines: Option<usize>,
    pub max_lines: Option<usize>,
}

impl LogFilter {
    /// Whether any narrowing filter was requested, which adds the
    /// `Filtered lines` figure to the summary.
    pub fn is_filtering(&self) -> bool {
        self.pattern.is_some() || self.severity.is_some() || self.tail_lines.is_some()
    }

    pub fn apply<'a>(&self, lines: &[&'a str]) -> Vec<&'a str> {
        let mut kept: Vec<&'a str> = lines
            .iter()
            .copied()
            .filter(|line| self.pattern.as_ref().map_or(true, |p| p.matches(line)))
            .filter(|line| self.severity.map_or(true, |s| s.matches(line)))
            .collect();

        if let Some(tail) = self.tail_lines.filter(|n| *n > 0) {
            if tail < kept.len() {
                kept.drain(..kept.len() - tail);
            }
        }
        if let Some(max) = self.max_lines.filter(|n| *n > 0) {
            kept.truncate(max);
        }
        kept
    }
}

/// Render the filtered log with its summary header.
pub fn render_log(build_id: &str, content: &str, filter: &LogFilter) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let kept = filter.apply(&lines);

    let mut result = format!(
        "Build log for build {}\nTotal lines: {}",
        build_id,
        lines.len()
    );
    if filter.is_filtering() {
        result.push_str(&format!(", Filtered lines: {}", kept.len()));
    }
    result.push_str(&format!(", Showing: {} lines\n\n", kept.len()));

    if kept.is_empty() {
        result.push_str("(No lines match the specified filters)");
    } else {
        result.push_str(&kept.join("\n"));
    }
    result
}
