//! Project type and file language detection

use serde::Serialize;
use std::path::Path;

/// Supported project types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Go,
    Ruby,
    Php,
    CSharp,
    Java,
    Unknown,
}

impl ProjectType {
    /// Get the name of the project type
    pub fn name(&self) -> &'static str {
        match self {
            ProjectType::Rust => "rust",
            ProjectType::Python => "python",
            ProjectType::TypeScript => "typescript",
            ProjectType::JavaScript => "javascript",
            ProjectType::Go => "go",
            ProjectType::Ruby => "ruby",
            ProjectType::Php => "php",
            ProjectType::CSharp => "csharp",
            ProjectType::Java => "java",
            ProjectType::Unknown => "unknown",
        }
    }

    /// Source extensions typical for this project type
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ProjectType::Rust => &["rs"],
            ProjectType::Python => &["py", "pyi"],
            ProjectType::TypeScript => &["ts", "tsx", "js", "jsx"],
            ProjectType::JavaScript => &["js", "jsx", "mjs", "cjs"],
            ProjectType::Go => &["go"],
            ProjectType::Ruby => &["rb"],
            ProjectType::Php => &["php"],
            ProjectType::CSharp => &["cs"],
            ProjectType::Java => &["java"],
            ProjectType::Unknown => &[],
        }
    }
}

/// Detect project type from directory contents
pub fn detect_project_type(path: &Path) -> ProjectType {
    // Indicator files, in priority order
    if path.join("Cargo.toml").exists() {
        return ProjectType::Rust;
    }

    if path.join("go.mod").exists() {
        return ProjectType::Go;
    }

    if path.join("package.json").exists() {
        if path.join("tsconfig.json").exists() {
            return ProjectType::TypeScript;
        }
        return ProjectType::JavaScript;
    }

    if path.join("pyproject.toml").exists()
        || path.join("setup.py").exists()
        || path.join("requirements.txt").exists()
    {
        return ProjectType::Python;
    }

    if path.join("Gemfile").exists() {
        return ProjectType::Ruby;
    }

    if path.join("composer.json").exists() {
        return ProjectType::Php;
    }

    if path.join("pom.xml").exists()
        || path.join("build.gradle").exists()
        || path.join("build.gradle.kts").exists()
    {
        return ProjectType::Java;
    }

    if has_entry_with_suffix(path, &[".csproj", ".sln"]) {
        return ProjectType::CSharp;
    }

    ProjectType::Unknown
}

/// Check if the directory has an entry ending with any of the suffixes
fn has_entry_with_suffix(path: &Path, suffixes: &[&str]) -> bool {
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if suffixes.iter().any(|s| name_str.ends_with(s)) {
                return true;
            }
        }
    }
    false
}

/// Detect Node.js package manager
pub fn detect_package_manager(path: &Path) -> &'static str {
    if path.join("pnpm-lock.yaml").exists() {
        "pnpm"
    } else if path.join("yarn.lock").exists() {
        "yarn"
    } else if path.join("bun.lockb").exists() {
        "bun"
    } else {
        "npm"
    }
}

/// Lowercased file extension without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// Languages that have a built-in fallback checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// JavaScript and TypeScript
    JavaScript,
    Python,
    Go,
    Rust,
    CSharp,
    Java,
    Php,
    Ruby,
}

impl Language {
    pub const ALL: [Language; 8] = [
        Language::JavaScript,
        Language::Python,
        Language::Go,
        Language::Rust,
        Language::CSharp,
        Language::Java,
        Language::Php,
        Language::Ruby,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::Php => "php",
            Language::Ruby => "ruby",
        }
    }

    /// Map a lowercased extension to its language
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts" => Some(Language::JavaScript),
            "py" | "pyi" => Some(Language::Python),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            "cs" => Some(Language::CSharp),
            "java" => Some(Language::Java),
            "php" => Some(Language::Php),
            "rb" | "rake" => Some(Language::Ruby),
            _ => None,
        }
    }

    pub fn of_path(path: &Path) -> Option<Self> {
        extension_of(path).and_then(|ext| Self::from_extension(&ext))
    }
}
