use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{classify_exit, CorePlugin, PluginKind, RunOptions};
use crate::error::ExecError;
use crate::issues;
use crate::process::{self, working_dir};
use crate::result::ExecutionOutcome;

/// Ruff linter for Python sources and stubs
pub struct RuffPlugin {
    timeout: Duration,
}

impl RuffPlugin {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn args(path: &Path, options: RunOptions<'_>) -> Vec<String> {
        let mut args = vec!["check".to_string()];
        args.extend(options.flags.iter().cloned());
        if options.fix {
            args.push("--fix".to_string());
        }
        args.push(path.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl CorePlugin for RuffPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Ruff
    }

    fn display_name(&self) -> &str {
        "Ruff"
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext, "py" | "pyi")
    }

    async fn run(&self, path: &Path, options: RunOptions<'_>) -> Result<ExecutionOutcome, ExecError> {
        let out = process::run("ruff", &Self::args(path, options), working_dir(path), self.timeout).await?;
        Ok(classify_exit(out))
    }

    fn version_command(&self) -> (&str, Vec<String>) {
        ("ruff", vec!["--version".to_string()])
    }

    fn issues(&self, output: &str, limit: usize) -> Vec<String> {
        issues::extract(output, &issues::RUFF, limit)
    }

    fn fix_hint(&self, path: &Path) -> Option<String> {
        Some(format!("ruff check --fix {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_python() {
        let plugin = RuffPlugin::new(Duration::from_secs(30));
        assert!(plugin.can_handle_file(Path::new("x.py")));
        assert!(plugin.can_handle_file(Path::new("stubs/x.pyi")));
        assert!(!plugin.can_handle_file(Path::new("x.pyc")));
    }

    #[test]
    fn test_args() {
        let flags = vec!["--output-format".to_string(), "concise".to_string()];
        let args = RuffPlugin::args(
            Path::new("/p/x.py"),
            RunOptions {
                fix: false,
                flags: &flags,
            },
        );
        assert_eq!(args, vec!["check", "--output-format", "concise", "/p/x.py"]);
    }

    #[tokio::test]
    async fn test_run_never_panics_without_ruff() {
        let plugin = RuffPlugin::new(Duration::from_secs(5));
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.py");
        std::fs::write(&file, "x = 1\n").unwrap();
        match plugin.run(&file, RunOptions::default()).await {
            Ok(outcome) => assert!(outcome.success || !outcome.output.is_empty()),
            Err(e) => assert!(matches!(e, ExecError::Spawn { .. })),
        }
    }
}
