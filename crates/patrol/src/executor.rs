//! Experimental tool execution
//!
//! Experimental tools come from the tools database as command templates.
//! They are rendered, validated, and only then run, without a shell, in the
//! checked file's directory.
//!
//! The validator sees the rendered command line with the raw path in it, so
//! a file whose name contains a shell metacharacter or a quote (`a(1).ts`,
//! `it's.ts`) is refused by every experimental tool even though the path
//! would reach the tool as a single argument. Such files fall through to the
//! legacy tier; [`Rejection::caused_by_path`] tells these cases apart from a
//! dangerous template.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::process::{self, working_dir};
use crate::registry::ExperimentalToolDescriptor;
use crate::result::ExecutionOutcome;
use crate::template::{CommandTemplate, RenderedCommand};
use crate::validator::{CommandValidator, Violation};

/// Default hard timeout for a check
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for version probes
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why an experimental command was not built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error(transparent)]
    Template(#[from] crate::template::TemplateError),
    #[error("command rejected: {0}")]
    Unsafe(Violation),
}

impl Rejection {
    /// Whether the file name, not the template, broke a rule
    pub fn caused_by_path(&self, file_path: &Path) -> bool {
        let path = file_path.to_string_lossy();
        match self {
            Rejection::Unsafe(Violation::Metacharacter(c)) => path.contains(*c),
            Rejection::Unsafe(Violation::UnbalancedQuotes) => path.contains(['\'', '"']),
            _ => false,
        }
    }
}

/// Runs experimental tools behind the command validator
#[derive(Debug, Clone)]
pub struct ExperimentalExecutor {
    validator: CommandValidator,
    timeout: Duration,
    probe_timeout: Duration,
}

impl Default for ExperimentalExecutor {
    fn default() -> Self {
        Self::new(CommandValidator::default())
    }
}

impl ExperimentalExecutor {
    pub fn new(validator: CommandValidator) -> Self {
        Self {
            validator,
            timeout: CHECK_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, check: Duration, probe: Duration) -> Self {
        self.timeout = check;
        self.probe_timeout = probe;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Render and validate a descriptor's command for a file
    pub fn prepare(
        &self,
        descriptor: &ExperimentalToolDescriptor,
        file_path: &Path,
    ) -> Result<RenderedCommand, Rejection> {
        let template = CommandTemplate::parse(&descriptor.command_template)?;
        let rendered = template.render(file_path);
        self.validator
            .check(&rendered.line, &file_path.to_string_lossy())
            .map_err(Rejection::Unsafe)?;
        Ok(rendered)
    }

    /// Whether the tool behind a descriptor answers a version probe.
    ///
    /// Any failure (missing binary, non-zero exit, timeout) means "not
    /// installed".
    pub async fn is_installed(&self, descriptor: &ExperimentalToolDescriptor, file_path: &Path) -> bool {
        self.is_installed_in(descriptor, working_dir(file_path)).await
    }

    /// Version probe run from `dir`
    pub async fn is_installed_in(&self, descriptor: &ExperimentalToolDescriptor, dir: &Path) -> bool {
        let template = match CommandTemplate::parse(&descriptor.command_template) {
            Ok(t) => t,
            Err(_) => return false,
        };

        if !self.validator.is_trusted_launcher(template.launcher()) {
            return false;
        }

        match process::run(
            template.launcher(),
            &template.probe_args(),
            dir,
            self.probe_timeout,
        )
        .await
        {
            Ok(out) if out.success() => true,
            Ok(out) => {
                debug!(tool = %descriptor.name, code = ?out.code, "version probe failed");
                false
            }
            Err(e) => {
                debug!(tool = %descriptor.name, error = %e, "version probe failed");
                false
            }
        }
    }

    /// Run an experimental tool on a file.
    ///
    /// Never fails: rejection, spawn errors and timeouts come back as a
    /// non-success outcome carrying the message.
    pub async fn execute(
        &self,
        descriptor: &ExperimentalToolDescriptor,
        file_path: &Path,
    ) -> ExecutionOutcome {
        let command = match self.prepare(descriptor, file_path) {
            Ok(c) => c,
            Err(rejection) => {
                log_rejection(&descriptor.name, &rejection, file_path);
                return ExecutionOutcome::failed(rejection.to_string());
            }
        };

        match process::run(
            &command.program,
            &command.args,
            working_dir(file_path),
            self.timeout,
        )
        .await
        {
            Ok(out) => ExecutionOutcome {
                success: out.success(),
                output: out.output,
                has_errors: false,
                has_warnings: false,
            },
            Err(e) => ExecutionOutcome::failed(e.to_string()),
        }
    }
}

/// Rejections caused by the file name are routine; the rest point at a bad
/// tools database entry
pub(crate) fn log_rejection(tool: &str, rejection: &Rejection, file_path: &Path) {
    if rejection.caused_by_path(file_path) {
        debug!(tool, file = %file_path.display(), "file name not accepted by command validator: {}", rejection);
    } else {
        warn!(tool, "{}", rejection);
    }
}

/// Whether experimental tool output reports a problem.
///
/// Plain substring match on `error`. Tools that print the word in normal
/// output are misclassified as failing.
pub fn mentions_error(output: &str) -> bool {
    output.contains("error")
}
