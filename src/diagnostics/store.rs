//! Host-side store of the latest findings per file

use super::types::{FileReport, Finding, Severity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What is known about one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Never diagnosed, or forgotten since
    Unscanned,
    Clean,
    /// Diagnosed with this many findings
    Findings(usize),
}

/// Latest report per file; a newer report always replaces an older one
#[derive(Debug, Clone, Default)]
pub struct FindingsStore {
    reports: BTreeMap<PathBuf, Vec<Finding>>,
}

impl FindingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, report: FileReport) {
        self.reports.insert(report.path, report.findings);
    }

    pub fn state(&self, path: &Path) -> FileState {
        match self.reports.get(path) {
            None => FileState::Unscanned,
            Some(findings) if findings.is_empty() => FileState::Clean,
            Some(findings) => FileState::Findings(findings.len()),
        }
    }

    pub fn findings(&self, path: &Path) -> &[Finding] {
        self.reports.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// Forget a file, e.g. after it was deleted
    pub fn forget(&mut self, path: &Path) {
        self.reports.remove(path);
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }

    /// Files with at least one finding, in path order
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[Finding])> {
        self.reports
            .iter()
            .filter(|(_, findings)| !findings.is_empty())
            .map(|(path, findings)| (path.as_path(), findings.as_slice()))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.reports
            .values()
            .flatten()
            .filter(|f| f.severity == severity)
            .count()
    }

    /// Number of files diagnosed so far
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
