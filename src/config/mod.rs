//! Build parameters and cloud-config types
//!
//! `BuildParameters` describes what to build. `CloudConfig` is the typed view
//! of a generated document, used to check the rendered text before it is
//! written anywhere.

pub mod loader;
pub mod params;

pub use params::{BuildParameters, ParameterOverrides};

use crate::BuilderError;
use crate::modules::write_files::decode_content;
use serde::{Deserialize, Serialize};

/// The subset of cloud-config emitted by the builder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Packages to install
    pub packages: Vec<String>,

    /// Shell commands to run, in order
    pub runcmd: Vec<String>,

    /// Files to write; `None` when the key is absent
    pub write_files: Option<Vec<WriteFileConfig>>,
}

/// File to write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileConfig {
    pub path: String,
    #[serde(default)]
    pub content: String,
    pub encoding: Option<String>,
    pub owner: Option<String>,
    pub permissions: Option<String>,
}

impl WriteFileConfig {
    /// Decoded file content
    pub fn decoded(&self) -> Result<Vec<u8>, BuilderError> {
        decode_content(&self.content, self.encoding.as_deref())
    }
}

impl CloudConfig {
    /// Parse cloud-config from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // Strip #cloud-config header if present
        let yaml = yaml
            .strip_prefix("#cloud-config")
            .map(|s| s.trim_start())
            .unwrap_or(yaml);

        serde_yaml::from_str(yaml)
    }

    /// Check if this looks like a cloud-config (starts with #cloud-config)
    pub fn is_cloud_config(data: &str) -> bool {
        data.lines().next().map(str::trim) == Some("#cloud-config")
    }

    /// Parse a generated document and check it is well formed
    pub fn parse_generated(doc: &str) -> Result<Self, BuilderError> {
        if !Self::is_cloud_config(doc) {
            return Err(BuilderError::InvalidData(
                "document does not start with #cloud-config".to_string(),
            ));
        }

        let config = Self::from_yaml(doc)?;
        if config.runcmd.is_empty() {
            return Err(BuilderError::InvalidData("runcmd is empty".to_string()));
        }
        if let Some(files) = &config.write_files {
            if files.is_empty() {
                return Err(BuilderError::InvalidData(
                    "write_files is present but empty".to_string(),
                ));
            }
            for file in files {
                file.decoded()?;
            }
        }

        Ok(config)
    }
}
