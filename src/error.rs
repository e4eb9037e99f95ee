//! Error types for ubuntu-standalone-builder

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for build config generation
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error(
        "The extra PPA url must be of the \"ppa:foo/bar\" form, or be an \"https://\" URL pointing to a private PPA (got '{0}')"
    )]
    InvalidPpa(String),

    #[error("You must provide a --build-ppa-key parameter if using a private PPA URL ({0})")]
    MissingPpaKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read hook script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read parameters file {}: {source}", .path.display())]
    ParametersFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl BuilderError {
    /// Create a hook script read error
    pub fn script(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Script {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was caused by bad user-supplied parameters
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidPpa(_) | Self::MissingPpaKey(_) | Self::Config(_)
        )
    }
}
