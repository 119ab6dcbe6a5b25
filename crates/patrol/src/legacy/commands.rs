//! Hardcoded per-language check commands
//!
//! `{file}` is replaced with the shell-quoted file path. Steps run in order
//! and the first failing step decides the result.

use crate::detect::Language;
use crate::issues::{self, IssuePattern};

/// Placeholder for the quoted file path
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Fixed check routine for one language
#[derive(Debug, Clone, Copy)]
pub struct LegacyCheck {
    pub language: Language,
    /// Tool name shown in notices and results
    pub tool: &'static str,
    pub steps: &'static [&'static str],
    /// Issue formats of the tools the steps run, in step order
    pub patterns: &'static [IssuePattern],
    /// Parsed issues kept in a review result
    pub max_issues: usize,
    pub fix: Option<&'static str>,
}

impl LegacyCheck {
    /// Fix command for a file, path already quoted
    pub fn fix_hint(&self, quoted_path: &str) -> Option<String> {
        self.fix.map(|f| f.replace(FILE_PLACEHOLDER, quoted_path))
    }
}

const JAVASCRIPT: LegacyCheck = LegacyCheck {
    language: Language::JavaScript,
    tool: "ESLint + Prettier",
    steps: &[
        "npx --no-install eslint {file}",
        "npx --no-install prettier --check {file}",
    ],
    patterns: &[issues::ESLINT, issues::PRETTIER],
    max_issues: 20,
    fix: Some("npx eslint --fix {file} && npx prettier --write {file}"),
};

const PYTHON: LegacyCheck = LegacyCheck {
    language: Language::Python,
    tool: "Ruff",
    steps: &[
        "ruff check --output-format concise {file}",
        "ruff format --check {file}",
    ],
    patterns: &[issues::RUFF, issues::RUFF_FORMAT],
    max_issues: 20,
    fix: Some("ruff check --fix {file} && ruff format {file}"),
};

const GO: LegacyCheck = LegacyCheck {
    language: Language::Go,
    tool: "gofmt + go vet",
    steps: &[
        "test -z \"$(gofmt -l {file})\" || { gofmt -d {file}; exit 1; }",
        "go vet {file}",
    ],
    patterns: &[issues::GO],
    max_issues: 15,
    fix: Some("gofmt -w {file}"),
};

const RUST: LegacyCheck = LegacyCheck {
    language: Language::Rust,
    tool: "rustfmt",
    steps: &["rustfmt --check --edition 2021 {file}"],
    patterns: &[issues::RUSTFMT],
    max_issues: 10,
    fix: Some("rustfmt --edition 2021 {file}"),
};

const CSHARP: LegacyCheck = LegacyCheck {
    language: Language::CSharp,
    tool: "dotnet format",
    steps: &["dotnet format whitespace --verify-no-changes --folder --include {file}"],
    patterns: &[issues::DOTNET],
    max_issues: 15,
    fix: Some("dotnet format whitespace --folder --include {file}"),
};

const JAVA: LegacyCheck = LegacyCheck {
    language: Language::Java,
    tool: "javac",
    steps: &[
        "out=\"${TMPDIR:-/tmp}/patrol-javac\" && mkdir -p \"$out\" && javac -Xlint:all -proc:none -d \"$out\" {file}",
    ],
    patterns: &[issues::JAVAC],
    max_issues: 15,
    fix: None,
};

const PHP: LegacyCheck = LegacyCheck {
    language: Language::Php,
    tool: "php -l",
    steps: &["php -l {file}"],
    patterns: &[issues::PHP_LINT],
    max_issues: 10,
    fix: None,
};

const RUBY: LegacyCheck = LegacyCheck {
    language: Language::Ruby,
    tool: "RuboCop",
    steps: &["rubocop --format emacs {file}"],
    patterns: &[issues::RUBOCOP],
    max_issues: 20,
    fix: Some("rubocop -a {file}"),
};

/// The check routine for a language
pub fn check_for(language: Language) -> &'static LegacyCheck {
    match language {
        Language::JavaScript => &JAVASCRIPT,
        Language::Python => &PYTHON,
        Language::Go => &GO,
        Language::Rust => &RUST,
        Language::CSharp => &CSHARP,
        Language::Java => &JAVA,
        Language::Php => &PHP,
        Language::Ruby => &RUBY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_a_routine() {
        for language in Language::ALL {
            let check = check_for(language);
            assert_eq!(check.language, language);
            assert!(!check.steps.is_empty());
            assert!((10..=20).contains(&check.max_issues));
            for step in check.steps {
                assert!(step.contains(FILE_PLACEHOLDER), "{} step lacks path", check.tool);
            }
            assert!(!check.patterns.is_empty());
            assert!(check.patterns.len() <= check.steps.len());
        }
    }

    #[test]
    fn test_fix_hint_substitutes_path() {
        assert_eq!(
            check_for(Language::Ruby).fix_hint("'/p/a b.rb'").as_deref(),
            Some("rubocop -a '/p/a b.rb'")
        );
        assert!(check_for(Language::Php).fix_hint("/p/a.php").is_none());
    }
}
