//! Tools database lookup
//!
//! The database is a versioned JSON document listing core tools (backed by a
//! built-in plugin) and experimental tools (backed by a command template):
//!
//! ```json
//! {
//!   "version": "1.2.0",
//!   "core": [
//!     { "name": "ESLint", "plugin": "eslint", "extensions": ["js", "ts"],
//!       "recommended_flags": ["--format", "stylish"] }
//!   ],
//!   "experimental": [
//!     { "name": "Oxlint", "command_template": "npx --no-install oxlint {filePath}",
//!       "extensions": ["js", "ts"] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::RegistryError;
use crate::plugin::PluginKind;

/// Major version of the database format this build understands
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

/// A trusted, built-in tool integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub plugin: PluginKind,
    /// Flags the plugin passes before the file path
    pub recommended_flags: Vec<String>,
    pub extensions: Vec<String>,
}

impl ToolDescriptor {
    pub fn supports(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// A tool integrated only through a command template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentalToolDescriptor {
    pub name: String,
    /// Command line containing a `{filePath}` placeholder
    #[serde(alias = "commandTemplate")]
    pub command_template: String,
    pub extensions: Vec<String>,
}

impl ExperimentalToolDescriptor {
    pub fn supports(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Read-only lookup of candidate tools for a file extension.
///
/// Extensions are lowercase without the leading dot. An empty list is a
/// normal answer; an `Err` aborts the whole run.
pub trait ToolLookup: Send + Sync {
    fn core_tools_for_extension(&self, ext: &str) -> Result<Vec<ToolDescriptor>, RegistryError>;

    fn experimental_tools_for_extension(
        &self,
        ext: &str,
    ) -> Result<Vec<ExperimentalToolDescriptor>, RegistryError>;
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    version: String,
    #[serde(default)]
    core: Vec<RawCoreTool>,
    #[serde(default)]
    experimental: Vec<ExperimentalToolDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RawCoreTool {
    name: String,
    plugin: String,
    #[serde(default, alias = "recommendedFlags")]
    recommended_flags: Vec<String>,
    extensions: Vec<String>,
}

/// In-memory tools database
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    version: String,
    core: Vec<ToolDescriptor>,
    experimental: Vec<ExperimentalToolDescriptor>,
}

impl ToolRegistry {
    /// Load a database from a JSON file
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Parse a database document. `origin` is only used in error messages.
    pub fn from_json(content: &str, origin: &Path) -> Result<Self, RegistryError> {
        let doc: RegistryDocument =
            serde_json::from_str(content).map_err(|source| RegistryError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_document(doc)
    }

    fn from_document(doc: RegistryDocument) -> Result<Self, RegistryError> {
        let major = doc
            .version
            .split('.')
            .next()
            .and_then(|m| m.trim_start_matches('v').parse::<u64>().ok());
        if major != Some(SUPPORTED_MAJOR_VERSION) {
            return Err(RegistryError::UnsupportedVersion {
                found: doc.version,
                expected: SUPPORTED_MAJOR_VERSION,
            });
        }

        let mut core = Vec::with_capacity(doc.core.len());
        for raw in doc.core {
            match PluginKind::from_id(&raw.plugin) {
                Some(plugin) => core.push(ToolDescriptor {
                    name: raw.name,
                    plugin,
                    recommended_flags: raw.recommended_flags,
                    extensions: normalize_extensions(&raw.extensions),
                }),
                None => warn!(
                    tool = %raw.name,
                    plugin = %raw.plugin,
                    "unknown core plugin in tools database, skipping"
                ),
            }
        }

        let experimental = doc
            .experimental
            .into_iter()
            .map(|mut tool| {
                tool.extensions = normalize_extensions(&tool.extensions);
                tool
            })
            .collect();

        Ok(Self {
            version: doc.version,
            core,
            experimental,
        })
    }

    /// The database shipped with patrol
    pub fn builtin() -> Self {
        let js = ["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];
        let core = vec![
            ToolDescriptor {
                name: "ESLint".to_string(),
                plugin: PluginKind::Eslint,
                recommended_flags: strings(&["--format", "stylish"]),
                extensions: strings(&js),
            },
            ToolDescriptor {
                name: "Ruff".to_string(),
                plugin: PluginKind::Ruff,
                recommended_flags: strings(&["--output-format", "concise"]),
                extensions: strings(&["py", "pyi"]),
            },
        ];

        let experimental = vec![
            ExperimentalToolDescriptor {
                name: "Oxlint".to_string(),
                command_template: "npx --no-install oxlint {filePath}".to_string(),
                extensions: strings(&js),
            },
            ExperimentalToolDescriptor {
                name: "Biome".to_string(),
                command_template: "npx --no-install @biomejs/biome lint {filePath}".to_string(),
                extensions: strings(&["js", "jsx", "ts", "tsx", "json"]),
            },
            ExperimentalToolDescriptor {
                name: "Stylelint".to_string(),
                command_template: "npx --no-install stylelint {filePath}".to_string(),
                extensions: strings(&["css", "scss"]),
            },
            ExperimentalToolDescriptor {
                name: "markdownlint".to_string(),
                command_template: "npx --no-install markdownlint-cli2 {filePath}".to_string(),
                extensions: strings(&["md", "markdown"]),
            },
            ExperimentalToolDescriptor {
                name: "Deno Lint".to_string(),
                command_template: "deno lint {filePath}".to_string(),
                extensions: strings(&["ts", "tsx"]),
            },
        ];

        Self {
            version: format!("{}.0.0", SUPPORTED_MAJOR_VERSION),
            core,
            experimental,
        }
    }

    /// An empty database (every lookup falls through to legacy checks)
    pub fn empty() -> Self {
        Self {
            version: format!("{}.0.0", SUPPORTED_MAJOR_VERSION),
            core: Vec::new(),
            experimental: Vec::new(),
        }
    }

    pub fn with_core(mut self, tool: ToolDescriptor) -> Self {
        self.core.push(tool);
        self
    }

    pub fn with_experimental(mut self, tool: ExperimentalToolDescriptor) -> Self {
        self.experimental.push(tool);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn core_tools(&self) -> &[ToolDescriptor] {
        &self.core
    }

    pub fn experimental_tools(&self) -> &[ExperimentalToolDescriptor] {
        &self.experimental
    }
}

impl ToolLookup for ToolRegistry {
    fn core_tools_for_extension(&self, ext: &str) -> Result<Vec<ToolDescriptor>, RegistryError> {
        Ok(self.core.iter().filter(|t| t.supports(ext)).cloned().collect())
    }

    fn experimental_tools_for_extension(
        &self,
        ext: &str,
    ) -> Result<Vec<ExperimentalToolDescriptor>, RegistryError> {
        Ok(self
            .experimental
            .iter()
            .filter(|t| t.supports(ext))
            .cloned()
            .collect())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "version": "1.4.2",
        "core": [
            { "name": "ESLint", "plugin": "eslint", "extensions": [".JS", "ts"],
              "recommendedFlags": ["--max-warnings", "0"] },
            { "name": "Mystery", "plugin": "not-a-plugin", "extensions": ["js"] }
        ],
        "experimental": [
            { "name": "Oxlint", "commandTemplate": "npx oxlint {filePath}", "extensions": ["js"] }
        ]
    }"#;

    #[test]
    fn test_parse_normalizes_and_drops_unknown_plugins() {
        let registry = ToolRegistry::from_json(DOC, Path::new("tools.json")).unwrap();
        assert_eq!(registry.version(), "1.4.2");
        assert_eq!(registry.core_tools().len(), 1);

        let eslint = &registry.core_tools()[0];
        assert_eq!(eslint.plugin, PluginKind::Eslint);
        assert_eq!(eslint.extensions, vec!["js", "ts"]);
        assert_eq!(eslint.recommended_flags, vec!["--max-warnings", "0"]);
    }

    #[test]
    fn test_lookup_by_extension_preserves_order() {
        let registry = ToolRegistry::from_json(DOC, Path::new("tools.json")).unwrap();
        let core = registry.core_tools_for_extension("js").unwrap();
        assert_eq!(core[0].name, "ESLint");
        let experimental = registry.experimental_tools_for_extension("js").unwrap();
        assert_eq!(experimental[0].command_template, "npx oxlint {filePath}");
        assert!(registry.core_tools_for_extension("rb").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_other_major_versions() {
        let doc = r#"{ "version": "2.0.0" }"#;
        assert!(matches!(
            ToolRegistry::from_json(doc, Path::new("tools.json")),
            Err(RegistryError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            ToolRegistry::from_json("{ nope", Path::new("tools.json")),
            Err(RegistryError::Parse { .. })
        ));
    }

    #[test]
    fn test_builtin_covers_js_and_python() {
        let registry = ToolRegistry::builtin();
        assert_eq!(registry.core_tools_for_extension("tsx").unwrap()[0].name, "ESLint");
        assert_eq!(registry.core_tools_for_extension("py").unwrap()[0].name, "Ruff");
        assert!(!registry.experimental_tools_for_extension("css").unwrap().is_empty());
        assert!(registry.core_tools_for_extension("rb").unwrap().is_empty());
    }
}
