//! Error types shared across the check tiers

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures launching or waiting on an external tool
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} timed out after {limit:?}")]
    Timeout { program: String, limit: Duration },

    #[error("Failed to collect output of {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    #[error("Cannot pass path to a shell: {0}")]
    UnquotablePath(PathBuf),
}

/// Failures loading the tools database
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read tools database {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse tools database {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unsupported tools database version {found} (expected {expected}.x)")]
    UnsupportedVersion { found: String, expected: u64 },
}
