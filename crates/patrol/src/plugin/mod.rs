//! Secure core plugins
//!
//! A core plugin wraps one vetted tool. Arguments are assembled by hand from
//! the tools database's recommended flags plus the file path and the process
//! is spawned without a shell, so core tools never go through the command
//! validator: there is no command string to validate.

mod eslint;
mod ruff;

pub use eslint::EslintPlugin;
pub use ruff::RuffPlugin;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::detect::extension_of;
use crate::error::ExecError;
use crate::process::{self, ProcessOutput};
use crate::result::ExecutionOutcome;

/// The closed set of built-in plugins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Eslint,
    Ruff,
}

impl PluginKind {
    pub const ALL: [PluginKind; 2] = [PluginKind::Eslint, PluginKind::Ruff];

    /// Identifier used in the tools database
    pub fn id(&self) -> &'static str {
        match self {
            PluginKind::Eslint => "eslint",
            PluginKind::Ruff => "ruff",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "eslint" => Some(PluginKind::Eslint),
            "ruff" => Some(PluginKind::Ruff),
            _ => None,
        }
    }
}

/// Options for a single plugin run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// Let the tool rewrite the file
    pub fix: bool,
    /// Recommended flags from the tools database
    pub flags: &'a [String],
}

/// Uniform contract every core plugin satisfies
#[async_trait]
pub trait CorePlugin: Send + Sync {
    fn kind(&self) -> PluginKind;

    /// Name shown in notices and results
    fn display_name(&self) -> &str;

    /// `ext` is lowercase, without the dot
    fn supports_extension(&self, ext: &str) -> bool;

    /// Extension-based; the file's contents are not inspected
    fn can_handle_file(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.supports_extension(&ext))
    }

    async fn run(&self, path: &Path, options: RunOptions<'_>) -> Result<ExecutionOutcome, ExecError>;

    /// Program and arguments that print the tool's version
    fn version_command(&self) -> (&str, Vec<String>);

    /// Turn raw output into issue lines
    fn issues(&self, output: &str, limit: usize) -> Vec<String> {
        crate::issues::first_lines(output, limit)
    }

    /// Command the user can run to fix the file
    fn fix_hint(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Whether a plugin's tool answers its version command when run from `dir`.
///
/// `npx --no-install` exits 1 when the package is missing, the same code a
/// linter uses for "issues found", so the exit of a real run cannot tell the
/// two apart.
pub async fn is_installed(plugin: &dyn CorePlugin, dir: &Path, limit: Duration) -> bool {
    let (program, args) = plugin.version_command();
    match process::run(program, &args, dir, limit).await {
        Ok(out) if out.success() => true,
        Ok(out) => {
            debug!(plugin = plugin.kind().id(), code = ?out.code, "version check failed");
            false
        }
        Err(e) => {
            debug!(plugin = plugin.kind().id(), error = %e, "version check failed");
            false
        }
    }
}

/// Classify a linter exit: 1 means issues were found, 0 with a warning in
/// the output means warnings only, any other code means the tool itself
/// failed.
pub(crate) fn classify_exit(out: ProcessOutput) -> ExecutionOutcome {
    match out.code {
        Some(1) => ExecutionOutcome {
            success: true,
            has_errors: true,
            has_warnings: out.output.contains("warning"),
            output: out.output,
        },
        Some(0) => ExecutionOutcome {
            success: true,
            has_errors: false,
            has_warnings: out.output.contains("warning"),
            output: out.output,
        },
        _ => ExecutionOutcome::failed(out.output),
    }
}

/// Plugins available to the dispatcher, resolved once at startup
pub struct PluginSet {
    plugins: HashMap<PluginKind, Box<dyn CorePlugin>>,
}

impl PluginSet {
    /// Every built-in plugin with the given process timeout
    pub fn builtin(timeout: Duration) -> Self {
        let mut set = Self::empty();
        for kind in PluginKind::ALL {
            let plugin: Box<dyn CorePlugin> = match kind {
                PluginKind::Eslint => Box::new(EslintPlugin::new(timeout)),
                PluginKind::Ruff => Box::new(RuffPlugin::new(timeout)),
            };
            set = set.with(plugin);
        }
        set
    }

    pub fn empty() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Register (or replace) the implementation for a plugin's kind
    pub fn with(mut self, plugin: Box<dyn CorePlugin>) -> Self {
        self.plugins.insert(plugin.kind(), plugin);
        self
    }

    pub fn get(&self, kind: PluginKind) -> Option<&dyn CorePlugin> {
        self.plugins.get(&kind).map(|p| p.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(code: Option<i32>, text: &str) -> ProcessOutput {
        ProcessOutput {
            code,
            output: text.to_string(),
        }
    }

    #[test]
    fn test_classify_exit() {
        let clean = classify_exit(out(Some(0), ""));
        assert!(clean.success && !clean.has_errors && !clean.has_warnings);

        let warned = classify_exit(out(Some(0), "1:1  warning  x  no-console"));
        assert!(warned.success && !warned.has_errors && warned.has_warnings);

        let errored = classify_exit(out(Some(1), "1:1  error  x  no-undef"));
        assert!(errored.success && errored.has_errors);

        let crashed = classify_exit(out(Some(2), "Oops! Something went wrong!"));
        assert!(!crashed.success);
        assert_eq!(crashed.output, "Oops! Something went wrong!");

        assert!(!classify_exit(out(None, "")).success);
    }

    #[test]
    fn test_plugin_kind_ids() {
        for kind in PluginKind::ALL {
            assert_eq!(PluginKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(PluginKind::from_id("ESLint"), Some(PluginKind::Eslint));
        assert_eq!(PluginKind::from_id("tslint"), None);
    }

    #[test]
    fn test_builtin_set_resolves_every_kind() {
        let set = PluginSet::builtin(Duration::from_secs(30));
        for kind in PluginKind::ALL {
            assert_eq!(set.get(kind).map(|p| p.kind()), Some(kind));
        }
        assert!(PluginSet::empty().get(PluginKind::Eslint).is_none());
    }
}
