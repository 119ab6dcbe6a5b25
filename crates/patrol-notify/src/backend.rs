//! Notification backends for different platforms

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Notification urgency levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// A notification to display
#[derive(Debug, Clone, Default)]
pub struct Notification {
    /// Notification title
    pub title: String,
    /// Notification message/body
    pub message: String,
    /// Urgency level
    pub urgency: Urgency,
    /// Auto-dismiss timeout in seconds (optional)
    pub timeout: Option<u32>,
}

impl Notification {
    /// Create a new notification with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: crate::DEFAULT_TITLE.to_string(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }
}

/// Available notification backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// macOS terminal-notifier
    TerminalNotifier,
    /// macOS osascript
    Osascript,
    /// Linux notify-send
    NotifySend,
    /// KDE kdialog
    Kdialog,
    /// WSL PowerShell
    Wsl,
    /// Plain stdout line
    Echo,
}

impl Backend {
    /// Detect the best available backend for the current platform
    pub fn detect() -> Self {
        #[cfg(target_os = "macos")]
        {
            if which::which("terminal-notifier").is_ok() {
                return Self::TerminalNotifier;
            }
            return Self::Osascript;
        }

        #[cfg(target_os = "linux")]
        {
            if std::env::var("WSL_DISTRO_NAME").is_ok() {
                return Self::Wsl;
            }
            if which::which("notify-send").is_ok() {
                return Self::NotifySend;
            }
            if which::which("kdialog").is_ok() {
                return Self::Kdialog;
            }
            return Self::Echo;
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Self::Echo
        }
    }

    /// Get the name of this backend
    pub fn name(&self) -> &'static str {
        match self {
            Self::TerminalNotifier => "terminal-notifier",
            Self::Osascript => "osascript",
            Self::NotifySend => "notify-send",
            Self::Kdialog => "kdialog",
            Self::Wsl => "wsl",
            Self::Echo => "echo",
        }
    }

    /// Build the process invocation for a notification.
    ///
    /// Returns `None` for [`Backend::Echo`], which prints instead of spawning.
    pub fn command(&self, notification: &Notification) -> Option<Command> {
        let title = notification.title.as_str();
        let message = notification.message.as_str();

        let cmd = match self {
            Self::TerminalNotifier => {
                let mut cmd = Command::new("terminal-notifier");
                cmd.args(["-title", title, "-message", message, "-group", "patrol"]);
                if notification.urgency == Urgency::Critical {
                    cmd.args(["-sound", "Basso"]);
                }
                cmd
            }
            Self::Osascript => {
                let script = format!(
                    r#"display notification "{}" with title "{}""#,
                    message.replace('"', r#"\""#),
                    title.replace('"', r#"\""#)
                );
                let mut cmd = Command::new("osascript");
                cmd.args(["-e", &script]);
                cmd
            }
            Self::NotifySend => {
                let mut cmd = Command::new("notify-send");
                cmd.args(["--urgency", notification.urgency.as_str()]);
                if let Some(timeout) = notification.timeout {
                    cmd.args(["--expire-time", &(timeout * 1000).to_string()]);
                }
                cmd.args([title, message]);
                cmd
            }
            Self::Kdialog => {
                let timeout = notification.timeout.unwrap_or(5).to_string();
                let mut cmd = Command::new("kdialog");
                cmd.args(["--passivepopup", message, &timeout, "--title", title]);
                cmd
            }
            Self::Wsl => {
                let ps_script = format!(
                    r#"[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null; $t = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02); $t.GetElementsByTagName('text')[0].AppendChild($t.CreateTextNode('{}')) | Out-Null; $t.GetElementsByTagName('text')[1].AppendChild($t.CreateTextNode('{}')) | Out-Null; [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier('patrol').Show([Windows.UI.Notifications.ToastNotification]::new($t))"#,
                    title.replace('\'', "''"),
                    message.replace('\'', "''")
                );
                let mut cmd = Command::new("powershell.exe");
                cmd.args(["-Command", &ps_script]);
                cmd
            }
            Self::Echo => return None,
        };

        Some(cmd)
    }

    /// Start the backend without waiting for it to finish
    pub fn spawn(&self, notification: &Notification) -> Result<()> {
        let Some(mut cmd) = self.command(notification) else {
            println!("[{}] {}", notification.title, notification.message);
            return Ok(());
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to run {}", self.name()))?;
        Ok(())
    }
}
