//! patrol-core - Shared functionality for the patrol crates
//!
//! Paths, project configuration and small formatting helpers used by both the
//! checker and the notification backends.

pub mod config;
pub mod format;
pub mod paths;

pub use config::{ConfigError, PatrolConfig, ReviewTiers};
pub use paths::Paths;
