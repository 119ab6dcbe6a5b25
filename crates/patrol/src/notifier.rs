//! Live-mode reporting of per-file check outcomes

use colored::Colorize;
use patrol_core::format::head_lines;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Lines of tool output shown under a failure
const FAILURE_PREVIEW_LINES: usize = 10;

/// Receives live check outcomes. Implementations must not fail the caller.
pub trait Notifier: Send + Sync {
    fn report_success(&self, file: &Path, tool: &str);

    fn report_failure(&self, file: &Path, tool: &str, output: &str);

    /// Tool passed with warnings
    fn report_warning(&self, file: &Path, tool: &str, _output: &str) {
        info!(file = %file.display(), tool, "passed with warnings");
    }
}

/// Colored terminal output
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    /// `quiet` hides successes and warnings
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for ConsoleNotifier {
    fn report_success(&self, file: &Path, tool: &str) {
        if self.quiet {
            return;
        }
        println!("{} {} {}", "ok".green(), file.display(), format!("({})", tool).dimmed());
    }

    fn report_failure(&self, file: &Path, tool: &str, output: &str) {
        println!("{} {} {}", "FAIL".red().bold(), file.display(), format!("({})", tool).dimmed());
        let preview = head_lines(output.trim_end(), FAILURE_PREVIEW_LINES);
        for line in preview.lines().filter(|l| !l.trim().is_empty()) {
            println!("     {}", line.dimmed());
        }
    }

    fn report_warning(&self, file: &Path, tool: &str, _output: &str) {
        if self.quiet {
            return;
        }
        println!("{} {} {}", "warn".yellow(), file.display(), format!("({})", tool).dimmed());
    }
}

/// Fire and forget; the dispatcher never waits on a notification backend
fn desktop(notice: patrol_notify::Notification) {
    if let Err(e) = patrol_notify::spawn(&notice) {
        warn!(error = %e, "desktop notification failed");
    }
}

/// Console output plus a desktop notification per outcome
pub struct DesktopNotifier<N> {
    inner: N,
}

impl<N: Notifier> DesktopNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

impl<N: Notifier> Notifier for DesktopNotifier<N> {
    fn report_success(&self, file: &Path, tool: &str) {
        self.inner.report_success(file, tool);
        desktop(patrol_notify::check_passed(&file.to_string_lossy(), tool));
    }

    fn report_failure(&self, file: &Path, tool: &str, output: &str) {
        self.inner.report_failure(file, tool, output);
        desktop(patrol_notify::check_failed(&file.to_string_lossy(), tool, output));
    }

    fn report_warning(&self, file: &Path, tool: &str, output: &str) {
        self.inner.report_warning(file, tool, output);
    }
}

#[derive(Debug, Serialize)]
struct Event<'a> {
    event: &'a str,
    file: &'a Path,
    tool: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
}

/// One JSON object per line on stdout
#[derive(Debug, Clone, Default)]
pub struct JsonLinesNotifier;

impl JsonLinesNotifier {
    fn emit(&self, event: &Event<'_>) {
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", line);
            }
            Err(e) => warn!(error = %e, "failed to encode event"),
        }
    }
}

impl Notifier for JsonLinesNotifier {
    fn report_success(&self, file: &Path, tool: &str) {
        self.emit(&Event {
            event: "success",
            file,
            tool,
            output: None,
        });
    }

    fn report_failure(&self, file: &Path, tool: &str, output: &str) {
        self.emit(&Event {
            event: "failure",
            file,
            tool,
            output: Some(output),
        });
    }

    fn report_warning(&self, file: &Path, tool: &str, output: &str) {
        self.emit(&Event {
            event: "warning",
            file,
            tool,
            output: Some(output),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Notifier for &Recorder {
        fn report_success(&self, _file: &Path, tool: &str) {
            self.seen.lock().unwrap().push(format!("ok {}", tool));
        }

        fn report_failure(&self, _file: &Path, tool: &str, _output: &str) {
            self.seen.lock().unwrap().push(format!("fail {}", tool));
        }
    }

    #[tokio::test]
    async fn test_desktop_notifier_forwards_without_blocking() {
        let recorder = Recorder::default();
        let notifier = DesktopNotifier::new(&recorder);

        let start = Instant::now();
        notifier.report_success(Path::new("/p/a.js"), "ESLint");
        notifier.report_failure(Path::new("/p/a.js"), "ESLint", "1:1 error x");

        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["ok ESLint".to_string(), "fail ESLint".to_string()]
        );
    }

    #[test]
    fn test_event_encoding() {
        let event = Event {
            event: "failure",
            file: Path::new("/p/a.js"),
            tool: "ESLint",
            output: Some("1:1 error x"),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "failure");
        assert_eq!(json["file"], "/p/a.js");
        assert_eq!(json["output"], "1:1 error x");

        let ok = Event {
            event: "success",
            file: Path::new("/p/a.js"),
            tool: "ESLint",
            output: None,
        };
        assert!(serde_json::to_value(&ok).unwrap().get("output").is_none());
    }
}
