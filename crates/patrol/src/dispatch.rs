//! Per-file dispatch across the three check tiers
//!
//! For each file the dispatcher tries, in order:
//!
//! 1. core plugins registered for the extension
//! 2. experimental tools (validated, installed, exit 0)
//! 3. the legacy checker for the file's language
//!
//! and stops at the first tier that handles the file. A core plugin only
//! runs once its tool answers a version check from the file's directory.
//! Tool failures at any
//! tier are logged and never abort other files; only a registry lookup error
//! is returned to the caller.

use patrol_core::{PatrolConfig, ReviewTiers};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::detect::{extension_of, Language};
use crate::error::RegistryError;
use crate::executor::{log_rejection, mentions_error, ExperimentalExecutor};
use crate::issues;
use crate::legacy::{self, FallbackRunner, LegacyCheckers};
use crate::notifier::Notifier;
use crate::plugin::{self, CorePlugin, PluginKind, PluginSet, RunOptions};
use crate::process::working_dir;
use crate::registry::{ExperimentalToolDescriptor, ToolDescriptor, ToolLookup};
use crate::result::{CheckResult, Severity};

/// Tool name used for results of files whose check blew up
pub const UNKNOWN_TOOL: &str = "Unknown";

/// Dispatch tier, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Core,
    Experimental,
    Legacy,
}

/// Verdict of the tool that handled a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

/// The tool that handled a file and what it reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub tier: Tier,
    pub tool: String,
    pub status: Status,
    pub output: String,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
}

impl Dispatched {
    /// Review form; a clean pass yields no result
    pub fn into_check_result(self, file: &Path) -> Option<CheckResult> {
        let severity = match self.status {
            Status::Pass => return None,
            Status::Warn => Severity::Warning,
            Status::Fail => Severity::Error,
        };
        Some(
            CheckResult::new(file, self.tool, severity)
                .with_issues(self.issues)
                .with_raw_output(self.output)
                .with_fix(self.fix_hint),
        )
    }
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Handled(Dispatched),
    /// No tier claimed the file
    Unhandled,
    /// The last-resort tier failed unexpectedly
    Errored(String),
}

/// Knobs shared by live and batch runs
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub fix: bool,
    pub review_tiers: ReviewTiers,
    pub max_review_issues: usize,
    pub disabled_tools: Vec<String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_config(&PatrolConfig::default(), false)
    }
}

impl DispatchOptions {
    pub fn from_config(config: &PatrolConfig, fix: bool) -> Self {
        Self {
            fix,
            review_tiers: config.review_tiers,
            max_review_issues: config.max_review_issues,
            disabled_tools: config.disabled_tools.clone(),
        }
    }

    fn is_disabled(&self, tool: &str) -> bool {
        self.disabled_tools.iter().any(|t| t.eq_ignore_ascii_case(tool))
    }
}

/// Routes files to the first tier that can check them
pub struct Dispatcher {
    registry: Arc<dyn ToolLookup>,
    notifier: Arc<dyn Notifier>,
    plugins: PluginSet,
    executor: ExperimentalExecutor,
    fallback: Arc<dyn FallbackRunner>,
    options: DispatchOptions,
    /// Version check results per plugin and working directory
    installed: Mutex<HashMap<(PluginKind, PathBuf), bool>>,
}

impl Dispatcher {
    /// Dispatcher with the built-in plugins, executor and legacy checkers
    pub fn new(registry: Arc<dyn ToolLookup>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            registry,
            notifier,
            plugins: PluginSet::builtin(crate::executor::CHECK_TIMEOUT),
            executor: ExperimentalExecutor::default(),
            fallback: Arc::new(LegacyCheckers::default()),
            options: DispatchOptions::default(),
            installed: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_plugins(mut self, plugins: PluginSet) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_executor(mut self, executor: ExperimentalExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackRunner>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Live mode: check one file and notify.
    ///
    /// Unknown extensions are a silent no-op.
    pub async fn check_file(&self, path: &Path) -> Result<Option<Dispatched>, RegistryError> {
        match self.dispatch(path, ReviewTiers::All).await? {
            FileOutcome::Handled(dispatched) => {
                match dispatched.status {
                    Status::Pass => self.notifier.report_success(path, &dispatched.tool),
                    Status::Warn => {
                        self.notifier
                            .report_warning(path, &dispatched.tool, &dispatched.output)
                    }
                    Status::Fail => {
                        self.notifier
                            .report_failure(path, &dispatched.tool, &dispatched.output)
                    }
                }
                Ok(Some(dispatched))
            }
            FileOutcome::Unhandled => Ok(None),
            FileOutcome::Errored(message) => {
                warn!(file = %path.display(), "check failed: {}", message);
                Ok(None)
            }
        }
    }

    /// Batch mode: one result per file with something to report, in input
    /// order. Nothing is notified.
    pub async fn check_files(&self, paths: &[PathBuf]) -> Result<Vec<CheckResult>, RegistryError> {
        let mut results = Vec::new();
        for path in paths {
            if let Some(result) = self.review_file(path).await? {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Batch mode for a single file
    pub async fn review_file(&self, path: &Path) -> Result<Option<CheckResult>, RegistryError> {
        Ok(match self.dispatch(path, self.options.review_tiers).await? {
            FileOutcome::Handled(dispatched) => dispatched.into_check_result(path),
            FileOutcome::Unhandled => None,
            FileOutcome::Errored(message) => Some(
                CheckResult::new(path, UNKNOWN_TOOL, Severity::Error)
                    .with_issues(vec![message.clone()])
                    .with_explanation(message),
            ),
        })
    }

    /// Run the tiers for a file without reporting anything
    pub async fn dispatch(&self, path: &Path, tiers: ReviewTiers) -> Result<FileOutcome, RegistryError> {
        let ext = match extension_of(path) {
            Some(ext) => ext,
            None => {
                debug!(file = %path.display(), "no extension, skipping");
                return Ok(FileOutcome::Unhandled);
            }
        };

        if tiers == ReviewTiers::All {
            let core = self.registry.core_tools_for_extension(&ext)?;
            if let Some(dispatched) = self.try_core(path, &core).await {
                return Ok(FileOutcome::Handled(dispatched));
            }

            let experimental = self.registry.experimental_tools_for_extension(&ext)?;
            if let Some(dispatched) = self.try_experimental(path, &experimental).await {
                return Ok(FileOutcome::Handled(dispatched));
            }
        }

        Ok(self.try_legacy(path, &ext).await)
    }

    async fn try_core(&self, path: &Path, tools: &[ToolDescriptor]) -> Option<Dispatched> {
        for tool in tools {
            if self.options.is_disabled(&tool.name) {
                debug!(tool = %tool.name, "disabled");
                continue;
            }

            let plugin = match self.plugins.get(tool.plugin) {
                Some(plugin) => plugin,
                None => {
                    debug!(tool = %tool.name, plugin = tool.plugin.id(), "plugin not available");
                    continue;
                }
            };
            if !plugin.can_handle_file(path) {
                continue;
            }
            if !self.core_installed(plugin, path).await {
                debug!(tool = %tool.name, "not installed, skipping");
                continue;
            }

            let options = RunOptions {
                fix: self.options.fix,
                flags: &tool.recommended_flags,
            };
            match plugin.run(path, options).await {
                Ok(outcome) if outcome.success => {
                    let status = if outcome.has_errors {
                        Status::Fail
                    } else if outcome.has_warnings {
                        Status::Warn
                    } else {
                        Status::Pass
                    };
                    let issues = match status {
                        Status::Pass => Vec::new(),
                        _ => plugin.issues(&outcome.output, self.options.max_review_issues),
                    };
                    info!(file = %path.display(), tool = %tool.name, ?status, "core check");
                    return Some(Dispatched {
                        tier: Tier::Core,
                        tool: tool.name.clone(),
                        status,
                        issues,
                        fix_hint: plugin.fix_hint(path),
                        output: outcome.output,
                    });
                }
                Ok(outcome) => {
                    warn!(
                        tool = %tool.name,
                        "core tool did not run cleanly: {}",
                        outcome.output.lines().next().unwrap_or("")
                    );
                }
                Err(e) => warn!(tool = %tool.name, error = %e, "core tool failed"),
            }
        }
        None
    }

    async fn core_installed(&self, core: &dyn CorePlugin, path: &Path) -> bool {
        let dir = working_dir(path);
        let key = (core.kind(), dir.to_path_buf());

        let cached = match self.installed.lock() {
            Ok(known) => known.get(&key).copied(),
            Err(_) => None,
        };
        if let Some(installed) = cached {
            return installed;
        }

        let installed = plugin::is_installed(core, dir, self.executor.probe_timeout()).await;
        if let Ok(mut known) = self.installed.lock() {
            known.insert(key, installed);
        }
        installed
    }

    async fn try_experimental(
        &self,
        path: &Path,
        tools: &[ExperimentalToolDescriptor],
    ) -> Option<Dispatched> {
        for tool in tools {
            if self.options.is_disabled(&tool.name) {
                debug!(tool = %tool.name, "disabled");
                continue;
            }

            // Validate before probing so a rejected template never runs
            if let Err(rejection) = self.executor.prepare(tool, path) {
                log_rejection(&tool.name, &rejection, path);
                continue;
            }
            if !self.executor.is_installed(tool, path).await {
                debug!(tool = %tool.name, "not installed, skipping");
                continue;
            }

            let outcome = self.executor.execute(tool, path).await;
            if !outcome.success {
                debug!(tool = %tool.name, "experimental tool did not handle file");
                continue;
            }

            let status = if mentions_error(&outcome.output) {
                Status::Fail
            } else {
                Status::Pass
            };
            let issues = match status {
                Status::Fail => issues::first_lines(&outcome.output, self.options.max_review_issues),
                _ => Vec::new(),
            };
            info!(file = %path.display(), tool = %tool.name, ?status, "experimental check");
            return Some(Dispatched {
                tier: Tier::Experimental,
                tool: tool.name.clone(),
                status,
                output: outcome.output,
                issues,
                fix_hint: None,
            });
        }
        None
    }

    async fn try_legacy(&self, path: &Path, ext: &str) -> FileOutcome {
        let language = match Language::from_extension(ext) {
            Some(language) => language,
            None => {
                debug!(file = %path.display(), "no checker for extension");
                return FileOutcome::Unhandled;
            }
        };

        let check = legacy::check_for(language);
        if self.options.is_disabled(check.tool) {
            debug!(tool = check.tool, "disabled");
            return FileOutcome::Unhandled;
        }

        match self.fallback.run(language, path).await {
            Ok(run) => {
                let status = if run.success { Status::Pass } else { Status::Fail };
                let (issues, fix_hint) =
                    match legacy::review_result(language, path, &run, self.options.max_review_issues) {
                        Some(result) => (
                            result.issues,
                            result.suggested_fixes.and_then(|f| f.into_iter().next()),
                        ),
                        None => (Vec::new(), None),
                    };
                info!(file = %path.display(), tool = %run.tool, ?status, "legacy check");
                FileOutcome::Handled(Dispatched {
                    tier: Tier::Legacy,
                    tool: run.tool,
                    status,
                    output: run.output,
                    issues,
                    fix_hint,
                })
            }
            Err(e) => FileOutcome::Errored(e.to_string()),
        }
    }
}
