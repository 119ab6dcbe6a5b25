use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{classify_exit, CorePlugin, PluginKind, RunOptions};
use crate::error::ExecError;
use crate::issues;
use crate::process::{self, working_dir};
use crate::result::ExecutionOutcome;

const EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// ESLint through the project's local install
pub struct EslintPlugin {
    timeout: Duration,
}

impl EslintPlugin {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn args(path: &Path, options: RunOptions<'_>) -> Vec<String> {
        let mut args = vec!["--no-install".to_string(), "eslint".to_string()];
        args.extend(options.flags.iter().cloned());
        if options.fix {
            args.push("--fix".to_string());
        }
        args.push(path.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl CorePlugin for EslintPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Eslint
    }

    fn display_name(&self) -> &str {
        "ESLint"
    }

    fn supports_extension(&self, ext: &str) -> bool {
        EXTENSIONS.contains(&ext)
    }

    async fn run(&self, path: &Path, options: RunOptions<'_>) -> Result<ExecutionOutcome, ExecError> {
        let out = process::run("npx", &Self::args(path, options), working_dir(path), self.timeout).await?;
        Ok(classify_exit(out))
    }

    fn version_command(&self) -> (&str, Vec<String>) {
        ("npx", vec!["--no-install".to_string(), "eslint".to_string(), "--version".to_string()])
    }

    fn issues(&self, output: &str, limit: usize) -> Vec<String> {
        issues::extract(output, &issues::ESLINT, limit)
    }

    fn fix_hint(&self, path: &Path) -> Option<String> {
        Some(format!("npx eslint --fix {}", path.display()))
    }
}
