//! Safety gate for experimental tool commands
//!
//! Every command built from a tools-database template passes through
//! [`CommandValidator`] before anything is spawned. The rules are
//! intentionally conservative:
//!
//! 1. the command must contain the target file path verbatim
//! 2. no shell metacharacter may appear outside quotes (`$` and `` ` `` are
//!    rejected even inside double quotes, where a shell would expand them)
//! 3. the first token must be one of the trusted launchers

use std::fmt;

/// Launchers an experimental command may start with
pub const TRUSTED_LAUNCHERS: &[&str] = &["npx", "bunx", "node", "bun", "deno", "tsx"];

/// Characters that let a command chain, redirect or substitute
const METACHARACTERS: &[char] = &['&', '|', ';', '>', '<', '`', '$', '(', ')'];

/// Why a command was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The command does not mention the file it claims to check
    MissingFilePath,
    /// An unquoted shell metacharacter
    Metacharacter(char),
    /// A quote that is never closed
    UnbalancedQuotes,
    /// The first token is not a trusted launcher
    UntrustedLauncher(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingFilePath => write!(f, "command does not contain the target file path"),
            Violation::Metacharacter(c) => write!(f, "unquoted shell metacharacter '{}'", c),
            Violation::UnbalancedQuotes => write!(f, "unbalanced quotes"),
            Violation::UntrustedLauncher(l) if l.is_empty() => write!(f, "empty command"),
            Violation::UntrustedLauncher(l) => write!(f, "untrusted launcher '{}'", l),
        }
    }
}

/// Decides whether a constructed command may run
#[derive(Debug, Clone)]
pub struct CommandValidator {
    launchers: Vec<String>,
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::with_launchers(TRUSTED_LAUNCHERS.iter().copied())
    }
}

impl CommandValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator accepting a different launcher set
    pub fn with_launchers<I, S>(launchers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            launchers: launchers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn launchers(&self) -> &[String] {
        &self.launchers
    }

    pub fn is_trusted_launcher(&self, token: &str) -> bool {
        self.launchers.iter().any(|l| l == token)
    }

    /// Check all rules, reporting the first one broken
    pub fn check(&self, command: &str, file_path: &str) -> Result<(), Violation> {
        if file_path.is_empty() || !command.contains(file_path) {
            return Err(Violation::MissingFilePath);
        }

        scan_metacharacters(command)?;

        let launcher = command.split_whitespace().next().unwrap_or("");
        if !self.is_trusted_launcher(launcher) {
            return Err(Violation::UntrustedLauncher(launcher.to_string()));
        }

        Ok(())
    }

    pub fn is_valid_command(&self, command: &str, file_path: &str) -> bool {
        self.check(command, file_path).is_ok()
    }
}

/// Validate with the default launcher set
pub fn is_valid_command(command: &str, file_path: &str) -> bool {
    CommandValidator::default().is_valid_command(command, file_path)
}

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Single,
    Double,
}

fn scan_metacharacters(command: &str) -> Result<(), Violation> {
    let mut quote = Quote::None;

    for c in command.chars() {
        match (quote, c) {
            (Quote::None, '\'') => quote = Quote::Single,
            (Quote::None, '"') => quote = Quote::Double,
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            (Quote::Single, _) => {}
            (Quote::Double, '$' | '`') => return Err(Violation::Metacharacter(c)),
            (Quote::Double, _) => {}
            (Quote::None, c) if METACHARACTERS.contains(&c) => {
                return Err(Violation::Metacharacter(c))
            }
            (Quote::None, _) => {}
        }
    }

    if quote != Quote::None {
        return Err(Violation::UnbalancedQuotes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "/work/app/src/b.ts";

    #[test]
    fn test_accepts_plain_npx_command() {
        assert!(is_valid_command("npx toolx /work/app/src/b.ts", FILE));
        assert!(is_valid_command("deno lint --quiet /work/app/src/b.ts", FILE));
    }

    #[test]
    fn test_rejects_chained_command() {
        let cmd = "npx toolx /work/app/src/b.ts && rm -rf /";
        assert_eq!(
            CommandValidator::new().check(cmd, FILE),
            Err(Violation::Metacharacter('&'))
        );
    }

    #[test]
    fn test_rejects_every_unquoted_chaining_form() {
        for cmd in [
            "npx toolx /work/app/src/b.ts; rm -rf /",
            "npx toolx /work/app/src/b.ts || true",
            "npx toolx /work/app/src/b.ts | sh",
            "npx toolx /work/app/src/b.ts > /etc/passwd",
            "npx toolx < /work/app/src/b.ts",
            "npx toolx `whoami` /work/app/src/b.ts",
            "npx toolx $(whoami) /work/app/src/b.ts",
            "npx toolx /work/app/src/b.ts &",
        ] {
            assert!(!is_valid_command(cmd, FILE), "accepted: {}", cmd);
        }
    }

    #[test]
    fn test_quoted_metacharacters_are_tolerated() {
        assert!(is_valid_command("npx toolx --sep ';' /work/app/src/b.ts", FILE));
        assert!(is_valid_command(r#"npx toolx --glob "a|b" /work/app/src/b.ts"#, FILE));
        assert!(is_valid_command("npx toolx --re '$(x)' /work/app/src/b.ts", FILE));
    }

    #[test]
    fn test_substitution_inside_double_quotes_is_rejected() {
        assert!(!is_valid_command(r#"npx toolx "$(id)" /work/app/src/b.ts"#, FILE));
        assert!(!is_valid_command(r#"npx toolx "`id`" /work/app/src/b.ts"#, FILE));
    }

    #[test]
    fn test_rejects_unbalanced_quotes() {
        assert_eq!(
            CommandValidator::new().check("npx toolx '/work/app/src/b.ts", FILE),
            Err(Violation::UnbalancedQuotes)
        );
    }

    #[test]
    fn test_requires_literal_file_path() {
        assert_eq!(
            CommandValidator::new().check("npx toolx /work/app/src/other.ts", FILE),
            Err(Violation::MissingFilePath)
        );
        assert!(!is_valid_command("npx toolx {filePath}", FILE));
        assert!(!is_valid_command("npx toolx", ""));
    }

    #[test]
    fn test_rejects_untrusted_launchers() {
        for cmd in [
            "bash /work/app/src/b.ts",
            "python -m toolx /work/app/src/b.ts",
            "npxx toolx /work/app/src/b.ts",
            "/usr/bin/npx toolx /work/app/src/b.ts",
            "curl http://evil /work/app/src/b.ts",
        ] {
            assert!(
                matches!(
                    CommandValidator::new().check(cmd, FILE),
                    Err(Violation::UntrustedLauncher(_))
                ),
                "accepted: {}",
                cmd
            );
        }
    }

    #[test]
    fn test_custom_launchers() {
        let validator = CommandValidator::with_launchers(["sh"]);
        assert!(validator.is_valid_command("sh /tmp/x.sh", "/tmp/x.sh"));
        assert!(!validator.is_valid_command("npx toolx /tmp/x.sh", "/tmp/x.sh"));
    }

    #[test]
    fn test_violation_messages() {
        assert_eq!(
            Violation::UntrustedLauncher("bash".into()).to_string(),
            "untrusted launcher 'bash'"
        );
        assert_eq!(Violation::UntrustedLauncher(String::new()).to_string(), "empty command");
    }
}
