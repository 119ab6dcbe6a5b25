//! Structured command templates for experimental tools
//!
//! A template like `npx --no-install oxlint {filePath}` is tokenized once
//! into a launcher plus arguments. Rendering substitutes the placeholder per
//! argument, so the file path always travels as a single argv entry and no
//! shell ever sees it.

use std::path::Path;

/// Placeholder replaced by the checked file's path
pub const FILE_PATH_PLACEHOLDER: &str = "{filePath}";

/// Launchers that fetch and run a named package
const PACKAGE_RUNNERS: &[&str] = &["npx", "bunx", "pnpx"];

/// A template could not be tokenized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("command template is empty")]
    Empty,
    #[error("command template has invalid quoting: {0}")]
    InvalidQuoting(String),
}

/// A parsed command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    raw: String,
    launcher: String,
    args: Vec<String>,
}

/// A template with the file path filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// The full command line, as validated
    pub line: String,
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let tokens = shlex::split(template)
            .ok_or_else(|| TemplateError::InvalidQuoting(template.to_string()))?;
        let mut tokens = tokens.into_iter();
        let launcher = tokens.next().ok_or(TemplateError::Empty)?;

        Ok(Self {
            raw: template.to_string(),
            launcher,
            args: tokens.collect(),
        })
    }

    pub fn launcher(&self) -> &str {
        &self.launcher
    }

    pub fn render(&self, file_path: &Path) -> RenderedCommand {
        let path = file_path.to_string_lossy();
        RenderedCommand {
            line: self.raw.replace(FILE_PATH_PLACEHOLDER, &path),
            program: self.launcher.clone(),
            args: self
                .args
                .iter()
                .map(|a| a.replace(FILE_PATH_PLACEHOLDER, &path))
                .collect(),
        }
    }

    /// Arguments for the installed-tool probe.
    ///
    /// Package runners probe the package itself without installing it
    /// (`npx --no-install oxlint --version`); other launchers probe the
    /// launcher (`deno --version`).
    pub fn probe_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if PACKAGE_RUNNERS.contains(&self.launcher.as_str()) {
            for arg in &self.args {
                if arg.contains(FILE_PATH_PLACEHOLDER) {
                    break;
                }
                args.push(arg.clone());
                if !arg.starts_with('-') {
                    break;
                }
            }
            if self.launcher == "npx" && !args.iter().any(|a| a == "--no-install") {
                args.insert(0, "--no-install".to_string());
            }
        }

        args.push("--version".to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let template = CommandTemplate::parse("npx toolx --config 'a b.json' {filePath}").unwrap();
        assert_eq!(template.launcher(), "npx");

        let rendered = template.render(Path::new("/p/my file.ts"));
        assert_eq!(rendered.program, "npx");
        assert_eq!(rendered.args, vec!["toolx", "--config", "a b.json", "/p/my file.ts"]);
        assert_eq!(rendered.line, "npx toolx --config 'a b.json' /p/my file.ts");
    }

    #[test]
    fn test_placeholder_inside_argument() {
        let template = CommandTemplate::parse("node lint.js --file={filePath}").unwrap();
        let rendered = template.render(Path::new("/p/a.js"));
        assert_eq!(rendered.args, vec!["lint.js", "--file=/p/a.js"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(CommandTemplate::parse("   "), Err(TemplateError::Empty));
        assert!(matches!(
            CommandTemplate::parse("npx 'unterminated {filePath}"),
            Err(TemplateError::InvalidQuoting(_))
        ));
    }

    #[test]
    fn test_probe_args() {
        let npx = CommandTemplate::parse("npx toolx {filePath}").unwrap();
        assert_eq!(npx.probe_args(), vec!["--no-install", "toolx", "--version"]);

        let scoped = CommandTemplate::parse("npx --no-install @biomejs/biome lint {filePath}").unwrap();
        assert_eq!(scoped.probe_args(), vec!["--no-install", "@biomejs/biome", "--version"]);

        let deno = CommandTemplate::parse("deno lint {filePath}").unwrap();
        assert_eq!(deno.probe_args(), vec!["--version"]);
    }
}
