//! Shared error types for corpus analysis.
//!
//! Only failures that stop a run before it starts surface as [`Error`]:
//! an unusable language profile, an unreadable configuration file, or a
//! caller explicitly asking for a module outcome that does not exist.
//! Everything that goes wrong *inside* a run (absent resources, module
//! errors, module panics) is recorded in the run result instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::registry::RejectionReason;

/// Main error type for corpuslens operations
#[derive(Debug, Error)]
pub enum Error {
    /// The language profile is structurally invalid; no run may start
    #[error("Profile construction failed for '{code}': {reason}")]
    ProfileConstruction { code: String, reason: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// A resource was requested that the profile cannot provide
    #[error("Resource '{name}' unavailable: {reason}")]
    ResourceUnavailable { name: String, reason: String },

    /// A module candidate or registration was refused by the registry
    #[error("Module rejected: {0}")]
    ModuleRejected(#[from] RejectionReason),

    /// A module was selected but did not run
    #[error("Module '{module}' skipped: {reason}")]
    ModuleSkipped { module: String, reason: String },

    /// A module ran and failed
    #[error("Module '{module}' failed: {message}")]
    ModuleRuntime { module: String, message: String },

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a profile construction error
    pub fn profile(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProfileConstruction {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with optional path context
    pub fn config(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path,
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }

    /// True when the error prevented a profile from being built
    pub fn is_profile_failure(&self) -> bool {
        matches!(self, Self::ProfileConstruction { .. } | Self::Config { .. })
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
