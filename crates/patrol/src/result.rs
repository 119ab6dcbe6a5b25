//! Check results and their aggregation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Severity of a check result. Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of running one tool on one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub file: PathBuf,
    pub tool: String,
    pub severity: Severity,
    /// Human-readable issues, best-effort parsed from tool output
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fixes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CheckResult {
    pub fn new(file: impl Into<PathBuf>, tool: impl Into<String>, severity: Severity) -> Self {
        Self {
            file: file.into(),
            tool: tool.into(),
            severity,
            issues: Vec::new(),
            raw_output: None,
            suggested_fixes: None,
            explanation: None,
        }
    }

    pub fn with_issues(mut self, issues: Vec<String>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_raw_output(mut self, output: impl Into<String>) -> Self {
        let output = output.into();
        if !output.trim().is_empty() {
            self.raw_output = Some(output);
        }
        self
    }

    pub fn with_fix(mut self, fix: Option<String>) -> Self {
        if let Some(fix) = fix {
            self.suggested_fixes.get_or_insert_with(Vec::new).push(fix);
        }
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Result of one tool process, before it is turned into a notice or a
/// [`CheckResult`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The tool ran to completion
    pub success: bool,
    /// Combined stdout + stderr
    pub output: String,
    pub has_errors: bool,
    pub has_warnings: bool,
}

impl ExecutionOutcome {
    /// A run that never happened or did not complete
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
            ..Default::default()
        }
    }
}

/// Worst severity per file
pub fn aggregate_by_file(results: &[CheckResult]) -> BTreeMap<PathBuf, Severity> {
    let mut status: BTreeMap<PathBuf, Severity> = BTreeMap::new();
    for result in results {
        status
            .entry(result.file.clone())
            .and_modify(|s| *s = (*s).max(result.severity))
            .or_insert(result.severity);
    }
    status
}

/// Totals for a batch review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files_checked: usize,
    pub files_with_issues: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Summary {
    pub fn from_results(files_checked: usize, results: &[CheckResult]) -> Self {
        let mut summary = Summary {
            files_checked,
            files_with_issues: aggregate_by_file(results).len(),
            ..Default::default()
        };
        for result in results {
            match result.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.infos += 1,
            }
        }
        summary
    }

    /// Highest severity present, if any
    pub fn worst(&self) -> Option<Severity> {
        if self.errors > 0 {
            Some(Severity::Error)
        } else if self.warnings > 0 {
            Some(Severity::Warning)
        } else if self.infos > 0 {
            Some(Severity::Info)
        } else {
            None
        }
    }
}
