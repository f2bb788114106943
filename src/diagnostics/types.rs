//! Diagnostic types

use crate::parser::Token;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 0,
    Warning = 1,
    Information = 2,
    Hint = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        }
    }

    /// Severity from a `diag` attribute: `E...`, `W...`, `I...`, anything else is a hint
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('E') => Severity::Error,
            Some('W') => Severity::Warning,
            Some('I') => Severity::Information,
            _ => Severity::Hint,
        }
    }
}

/// Position in source (0-based, as editors expect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Range in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// Span of a token, converted from its 1-based coordinates
    pub fn from_token(token: &Token) -> Self {
        Self::from_span(token.line, token.col, &token.text)
    }

    /// Span of `text` starting at 1-based `line`/`col`
    pub fn from_span(line: u32, col: u32, text: &str) -> Self {
        let (mut end_line, mut end_col) = (line, col);
        for ch in text.chars() {
            if ch == '\n' {
                end_line += 1;
                end_col = 1;
            } else {
                end_col += 1;
            }
        }
        Self::new(
            line.saturating_sub(1),
            col.saturating_sub(1),
            end_line.saturating_sub(1),
            end_col.saturating_sub(1),
        )
    }
}

/// A single diagnostic finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub range: Range,
    pub message: String,
    /// Rule id, e.g. `duplicate-id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, range: Range, message: impl Into<String>) -> Self {
        Self {
            severity,
            range,
            message: message.into(),
            code: None,
            source: None,
        }
    }

    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, range, message)
    }

    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, range, message)
    }

    pub fn info(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Information, range, message)
    }

    pub fn hint(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Hint, range, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// All findings for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
}

impl FileReport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            findings: Vec::new(),
        }
    }

    pub fn add(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;

    #[test]
    fn test_severity_keyword() {
        assert_eq!(Severity::from_keyword("Error"), Severity::Error);
        assert_eq!(Severity::from_keyword("warn"), Severity::Warning);
        assert_eq!(Severity::from_keyword("Info"), Severity::Information);
        assert_eq!(Severity::from_keyword("H"), Severity::Hint);
        assert_eq!(Severity::from_keyword(""), Severity::Hint);
    }

    #[test]
    fn test_range_from_token_is_zero_based() {
        let tokens = tokenize("<a>\n  <b x=\"1\"/></a>");
        let value = tokens.iter().find(|t| t.value == "1").unwrap();
        let range = Range::from_token(value);
        assert_eq!(range, Range::new(1, 7, 1, 10));
    }

    #[test]
    fn test_report_counts() {
        let range = Range::new(0, 0, 0, 1);
        let mut report = FileReport::new(PathBuf::from("a.xml"));
        assert!(report.is_clean());
        report.add(Finding::error(range, "bad").with_code("duplicate-id"));
        report.add(Finding::hint(range, "unknown tag"));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.count(Severity::Hint), 1);
    }
}
