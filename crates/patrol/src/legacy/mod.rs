//! Legacy per-language fallback checkers
//!
//! Used only when no core plugin or experimental tool handled a file. The
//! commands are fixed strings run through `sh -c`; only the shell-quoted file
//! path is interpolated, so they bypass the command validator.

mod commands;

pub use commands::{check_for, LegacyCheck};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::detect::Language;
use crate::error::ExecError;
use crate::executor::CHECK_TIMEOUT;
use crate::issues;
use crate::process::{self, working_dir};
use crate::result::{CheckResult, Severity};

/// Result of one legacy routine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    pub tool: String,
    pub success: bool,
    /// Output of the failing step, or of the last step on success
    pub output: String,
}

/// Runs the fallback routine for a language
#[async_trait]
pub trait FallbackRunner: Send + Sync {
    async fn run(&self, language: Language, path: &Path) -> Result<ToolRun, ExecError>;
}

/// The built-in shell routines
#[derive(Debug, Clone)]
pub struct LegacyCheckers {
    timeout: Duration,
}

impl Default for LegacyCheckers {
    fn default() -> Self {
        Self::new(CHECK_TIMEOUT)
    }
}

impl LegacyCheckers {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl FallbackRunner for LegacyCheckers {
    async fn run(&self, language: Language, path: &Path) -> Result<ToolRun, ExecError> {
        let check = check_for(language);
        let quoted = quote_path(path)?;
        let mut output = String::new();

        for step in check.steps {
            let command = step.replace(commands::FILE_PLACEHOLDER, &quoted);
            debug!(tool = check.tool, %command, "legacy step");

            match process::run_shell(&command, working_dir(path), self.timeout).await {
                Ok(out) if out.success() => output = out.output,
                Ok(out) => {
                    return Ok(ToolRun {
                        tool: check.tool.to_string(),
                        success: false,
                        output: out.output,
                    })
                }
                // Spawn failures and timeouts are tool failures, not errors
                Err(e) => {
                    return Ok(ToolRun {
                        tool: check.tool.to_string(),
                        success: false,
                        output: e.to_string(),
                    })
                }
            }
        }

        Ok(ToolRun {
            tool: check.tool.to_string(),
            success: true,
            output,
        })
    }
}

fn quote_path(path: &Path) -> Result<String, ExecError> {
    let text = path
        .to_str()
        .ok_or_else(|| ExecError::UnquotablePath(path.to_path_buf()))?;
    shlex::try_quote(text)
        .map(|q| q.into_owned())
        .map_err(|_| ExecError::UnquotablePath(path.to_path_buf()))
}

/// Review variant: a failing run becomes an error-severity result with its
/// parsed issues, capped at the routine's own limit and `max_issues`.
pub fn review_result(
    language: Language,
    path: &Path,
    run: &ToolRun,
    max_issues: usize,
) -> Option<CheckResult> {
    if run.success {
        return None;
    }

    let check = check_for(language);
    let limit = check.max_issues.min(max_issues);
    let fix = quote_path(path).ok().and_then(|q| check.fix_hint(&q));

    Some(
        CheckResult::new(path, run.tool.clone(), Severity::Error)
            .with_issues(issues::extract_any(&run.output, check.patterns, limit))
            .with_raw_output(run.output.clone())
            .with_fix(fix),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn failing_run(tool: &str, output: &str) -> ToolRun {
        ToolRun {
            tool: tool.to_string(),
            success: false,
            output: output.to_string(),
        }
    }

    #[test]
    fn test_review_result_for_passing_run_is_none() {
        let run = ToolRun {
            tool: "RuboCop".to_string(),
            success: true,
            output: String::new(),
        };
        assert!(review_result(Language::Ruby, Path::new("/p/a.rb"), &run, 20).is_none());
    }

    #[test]
    fn test_review_result_parses_and_truncates() {
        let output = (1..=40)
            .map(|i| format!("/p/a.rb:{}:1: C: Layout/Foo: bad", i))
            .collect::<Vec<_>>()
            .join("\n");
        let result = review_result(
            Language::Ruby,
            Path::new("/p/a.rb"),
            &failing_run("RuboCop", &output),
            100,
        )
        .unwrap();

        assert_eq!(result.severity, Severity::Error);
        assert_eq!(result.tool, "RuboCop");
        assert_eq!(result.issues.len(), 20);
        assert_eq!(result.issues[0], "1:1 C Layout/Foo: bad");
        assert_eq!(result.raw_output.as_deref(), Some(output.as_str()));
        assert_eq!(
            result.suggested_fixes,
            Some(vec!["rubocop -a /p/a.rb".to_string()])
        );

        let capped = review_result(
            Language::Ruby,
            Path::new("/p/a.rb"),
            &failing_run("RuboCop", &output),
            5,
        )
        .unwrap();
        assert_eq!(capped.issues.len(), 5);
    }

    #[test]
    fn test_review_result_uses_the_failing_steps_format() {
        let output = "[warn] src/a.js\n[warn] Code style issues found in the above file.\n";
        let result = review_result(
            Language::JavaScript,
            Path::new("/p/src/a.js"),
            &failing_run("ESLint + Prettier", output),
            20,
        )
        .unwrap();
        assert_eq!(
            result.issues,
            vec![
                "formatting: src/a.js",
                "formatting: Code style issues found in the above file.",
            ]
        );

        let ruff = review_result(
            Language::Python,
            Path::new("/p/a.py"),
            &failing_run("Ruff", "Would reformat: a.py\n1 file would be reformatted\n"),
            20,
        )
        .unwrap();
        assert_eq!(ruff.issues, vec!["formatting: a.py"]);
    }

    #[test]
    fn test_quote_path() {
        assert_eq!(quote_path(Path::new("/p/a.rb")).unwrap(), "/p/a.rb");
        assert_eq!(quote_path(Path::new("/p/a b.rb")).unwrap(), "'/p/a b.rb'");
        assert!(matches!(
            quote_path(Path::new("/p/a\0.rb")),
            Err(ExecError::UnquotablePath(_))
        ));
    }

    #[tokio::test]
    async fn test_php_routine_reports_its_tool() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.php");
        std::fs::write(&file, "<?php\n").unwrap();

        let run = LegacyCheckers::new(Duration::from_secs(10))
            .run(Language::Php, &file)
            .await
            .unwrap();
        assert_eq!(run.tool, "php -l");
        // Passes when php is installed, otherwise sh reports it missing
        if !run.success {
            assert!(!run.output.is_empty());
        }
    }
}
