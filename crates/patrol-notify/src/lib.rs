//! patrol-notify - Desktop notifications for check results
//!
//! Works on macOS (osascript/terminal-notifier), Linux (notify-send, kdialog)
//! and WSL, falling back to a plain stdout line everywhere else.

mod backend;

pub use backend::{Backend, Notification, Urgency};

use anyhow::Result;
use patrol_core::format::truncate;

/// Default notification title
pub const DEFAULT_TITLE: &str = "patrol";

/// Longest notification body sent to a desktop backend
const MAX_BODY: usize = 240;

/// Hand a notification to the detected backend without waiting on it
pub fn spawn(notification: &Notification) -> Result<()> {
    let backend = Backend::detect();
    tracing::debug!(backend = backend.name(), "spawning desktop notification");
    backend.spawn(notification)
}

/// Notification for a file that passed a tool
pub fn check_passed(file: &str, tool: &str) -> Notification {
    Notification::new(format!("{} passed {}", file, tool))
        .with_title(format!("{}: ok", DEFAULT_TITLE))
        .with_urgency(Urgency::Low)
        .with_timeout(3)
}

/// Notification for a file a tool reported problems in
pub fn check_failed(file: &str, tool: &str, output: &str) -> Notification {
    let first_line = output.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let body = if first_line.is_empty() {
        format!("{} failed {}", file, tool)
    } else {
        format!("{} failed {}: {}", file, tool, first_line.trim())
    };

    Notification::new(truncate(&body, MAX_BODY))
        .with_title(format!("{}: critical failure", DEFAULT_TITLE))
        .with_urgency(Urgency::Critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_failed_uses_first_output_line() {
        let n = check_failed("src/a.js", "ESLint", "\n  1:1  error  boom  no-undef\nmore");
        assert_eq!(n.urgency, Urgency::Critical);
        assert_eq!(n.message, "src/a.js failed ESLint: 1:1  error  boom  no-undef");
    }

    #[test]
    fn test_check_failed_truncates_long_output() {
        let long = "x".repeat(1000);
        let n = check_failed("a.py", "Ruff", &long);
        assert_eq!(n.message.chars().count(), MAX_BODY);
    }

    #[test]
    fn test_check_passed() {
        let n = check_passed("a.rb", "RuboCop");
        assert_eq!(n.urgency, Urgency::Low);
        assert!(n.message.contains("a.rb passed RuboCop"));
    }
}
