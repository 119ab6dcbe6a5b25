//! Best-effort extraction of issue lines from tool output
//!
//! Each pattern pairs a line regex with an expansion template
//! (`regex::Captures::expand` syntax). Output that matches nothing falls back
//! to its first non-empty lines so a failing tool never yields an empty
//! issue list.

use regex::Regex;
use tracing::warn;

/// A tool-specific issue line format
#[derive(Debug, Clone, Copy)]
pub struct IssuePattern {
    pub regex: &'static str,
    pub template: &'static str,
}

/// ESLint stylish: `  3:7  error  'x' is not defined  no-undef`
pub const ESLINT: IssuePattern = IssuePattern {
    regex: r"^\s*(\d+):(\d+)\s+(error|warning)\s+(.+?)\s{2,}(\S+)\s*$",
    template: "${1}:${2} ${3} ${4} (${5})",
};

/// Ruff concise: `a.py:4:5: F841 Local variable `x` is assigned to but never used`
pub const RUFF: IssuePattern = IssuePattern {
    regex: r"^.+?:(\d+):(\d+): ([A-Z]+\d+) (.+)$",
    template: "${1}:${2} ${3} ${4}",
};

/// Prettier check: `[warn] src/a.js`
pub const PRETTIER: IssuePattern = IssuePattern {
    regex: r"^\[warn\] (.+?)$",
    template: "formatting: ${1}",
};

/// ruff format --check: `Would reformat: src/a.py`
pub const RUFF_FORMAT: IssuePattern = IssuePattern {
    regex: r"^Would reformat: (.+?)$",
    template: "formatting: ${1}",
};

/// go vet / compiler: `./main.go:12:2: undefined: foo`
pub const GO: IssuePattern = IssuePattern {
    regex: r"^.*?\.go:(\d+):(\d+): (.+)$",
    template: "${1}:${2} ${3}",
};

/// rustfmt --check: `Diff in /p/src/main.rs:4:` or `Diff in /p/src/main.rs at line 4:`
pub const RUSTFMT: IssuePattern = IssuePattern {
    regex: r"^Diff in .+?(?: at line |:)(\d+):",
    template: "line ${1}: formatting differs from rustfmt",
};

/// MSBuild style: `Program.cs(3,5): warning WHITESPACE: Fix whitespace formatting.`
pub const DOTNET: IssuePattern = IssuePattern {
    regex: r"^.*?\((\d+),(\d+)\): (error|warning) (\w+): (.+?)(?: \[.+\])?$",
    template: "${1}:${2} ${3} ${5} (${4})",
};

/// javac: `Main.java:5: error: ';' expected`
pub const JAVAC: IssuePattern = IssuePattern {
    regex: r"^.*?\.java:(\d+): (error|warning): (.+)$",
    template: "${1} ${2} ${3}",
};

/// php -l: `PHP Parse error:  syntax error, unexpected '}' in a.php on line 7`
pub const PHP_LINT: IssuePattern = IssuePattern {
    regex: r"(Parse error|Fatal error|Warning|Deprecated):\s+(.+?) in .+? on line (\d+)",
    template: "${3} ${1}: ${2}",
};

/// RuboCop emacs format: `/p/a.rb:3:1: C: Style/FrozenStringLiteralComment: Missing ...`
pub const RUBOCOP: IssuePattern = IssuePattern {
    regex: r"^.+?:(\d+):(\d+): ([CWEF]): (.+)$",
    template: "${1}:${2} ${3} ${4}",
};

/// Extract up to `limit` issues matching `pattern`
pub fn extract(output: &str, pattern: &IssuePattern, limit: usize) -> Vec<String> {
    extract_any(output, std::slice::from_ref(pattern), limit)
}

/// Extract with the first pattern that matches anything; a routine with
/// several steps has one pattern per tool
pub fn extract_any(output: &str, patterns: &[IssuePattern], limit: usize) -> Vec<String> {
    for pattern in patterns {
        let issues = matching(output, pattern, limit);
        if !issues.is_empty() {
            return issues;
        }
    }
    first_lines(output, limit)
}

fn matching(output: &str, pattern: &IssuePattern, limit: usize) -> Vec<String> {
    let re = match Regex::new(pattern.regex) {
        Ok(re) => re,
        Err(e) => {
            warn!(pattern = pattern.regex, error = %e, "invalid issue pattern");
            return Vec::new();
        }
    };

    output
        .lines()
        .filter_map(|line| re.captures(line))
        .take(limit)
        .map(|caps| {
            let mut issue = String::new();
            caps.expand(pattern.template, &mut issue);
            issue
        })
        .collect()
}

/// First `limit` non-empty, trimmed lines
pub fn first_lines(output: &str, limit: usize) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        for p in [ESLINT, RUFF, RUFF_FORMAT, PRETTIER, GO, RUSTFMT, DOTNET, JAVAC, PHP_LINT, RUBOCOP] {
            assert!(Regex::new(p.regex).is_ok(), "bad pattern {}", p.regex);
        }
    }

    #[test]
    fn test_eslint_stylish() {
        let output = "\n/p/a.js\n  1:7   error    'x' is assigned a value but never used  no-unused-vars\n  2:1   warning  Unexpected console statement             no-console\n\n✖ 2 problems (1 error, 1 warning)\n";
        let issues = extract(output, &ESLINT, 20);
        assert_eq!(
            issues,
            vec![
                "1:7 error 'x' is assigned a value but never used (no-unused-vars)",
                "2:1 warning Unexpected console statement (no-console)",
            ]
        );
    }

    #[test]
    fn test_ruff_concise() {
        let output = "test-python-error.py:4:5: F841 Local variable `unused_variable` is assigned to but never used\nFound 1 error.\n";
        assert_eq!(
            extract(output, &RUFF, 10),
            vec!["4:5 F841 Local variable `unused_variable` is assigned to but never used"]
        );
    }

    #[test]
    fn test_rustfmt_both_formats() {
        let output = "Diff in /p/src/main.rs:4:\nDiff in /p/src/main.rs at line 18:\n";
        assert_eq!(
            extract(output, &RUSTFMT, 10),
            vec![
                "line 4: formatting differs from rustfmt",
                "line 18: formatting differs from rustfmt",
            ]
        );
    }

    #[test]
    fn test_php_and_rubocop() {
        let php = "PHP Parse error:  syntax error, unexpected '}' in /p/a.php on line 7\nErrors parsing /p/a.php\n";
        assert_eq!(
            extract(php, &PHP_LINT, 10),
            vec!["7 Parse error: syntax error, unexpected '}'"]
        );

        let rb = "/p/a.rb:3:1: C: Style/FrozenStringLiteralComment: Missing magic comment.\n";
        assert_eq!(
            extract(rb, &RUBOCOP, 10),
            vec!["3:1 C Style/FrozenStringLiteralComment: Missing magic comment."]
        );
    }

    #[test]
    fn test_dotnet_strips_project_suffix() {
        let output = "/p/Program.cs(3,5): warning WHITESPACE: Fix whitespace formatting. [/p/App.csproj]\n";
        assert_eq!(
            extract(output, &DOTNET, 10),
            vec!["3:5 warning Fix whitespace formatting. (WHITESPACE)"]
        );
    }

    #[test]
    fn test_extract_any_uses_first_matching_pattern() {
        let output = "Checking formatting...\n[warn] src/a.js\n";
        assert_eq!(
            extract_any(output, &[ESLINT, PRETTIER], 20),
            vec!["formatting: src/a.js"]
        );
        assert_eq!(
            extract_any("boom\n", &[ESLINT, PRETTIER], 20),
            vec!["boom"]
        );
    }

    #[test]
    fn test_limit_and_fallback() {
        let output = (1..=30)
            .map(|i| format!("a.go:{}:1: bad thing", i))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(extract(&output, &GO, 10).len(), 10);

        let unmatched = "sh: 1: rubocop: not found\n\n";
        assert_eq!(extract(unmatched, &RUBOCOP, 10), vec!["sh: 1: rubocop: not found"]);
    }
}
