//! Parameter and hook script loader
//!
//! Reads the optional parameters file and the hook scripts named by the
//! build parameters. Scripts are read whole, as raw bytes.

use super::{BuildParameters, ParameterOverrides};
use crate::BuilderError;
use crate::modules::HookScripts;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Load a YAML parameters file
///
/// Relative script paths in the file are resolved against its directory.
pub async fn load_parameters_file(
    path: impl AsRef<Path>,
) -> Result<ParameterOverrides, BuilderError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| BuilderError::ParametersFile {
            path: path.to_path_buf(),
            source,
        })?;

    let overrides: ParameterOverrides = if content.trim().is_empty() {
        ParameterOverrides::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| {
            BuilderError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?
    };

    info!("Loaded build parameters from {}", path.display());
    Ok(match path.parent() {
        Some(dir) => overrides.relative_to(dir),
        None => overrides,
    })
}

/// Read the hook scripts named by `params`
pub async fn load_hook_scripts(params: &BuildParameters) -> Result<HookScripts, BuilderError> {
    let chroot = match &params.customisation_script {
        Some(path) => Some(read_script(path).await?),
        None => None,
    };
    let binary = match &params.binary_customisation_script {
        Some(path) => Some(read_script(path).await?),
        None => None,
    };

    Ok(HookScripts { chroot, binary })
}

async fn read_script(path: &Path) -> Result<Vec<u8>, BuilderError> {
    let content = fs::read(path)
        .await
        .map_err(|e| BuilderError::script(path, e))?;
    debug!("Read {} bytes from {}", content.len(), path.display());
    Ok(content)
}

/// Configuration loader builder for more control
pub struct ParameterLoader {
    defaults: ParameterOverrides,
    config_file: Option<std::path::PathBuf>,
    overrides: Vec<ParameterOverrides>,
}

impl ParameterLoader {
    /// Create a new loader starting from the built-in defaults
    pub fn new() -> Self {
        Self {
            defaults: ParameterOverrides::default(),
            config_file: None,
            overrides: Vec::new(),
        }
    }

    /// Replace built-in defaults; the parameters file still takes precedence
    pub fn defaults(mut self, defaults: ParameterOverrides) -> Self {
        self.defaults = defaults;
        self
    }

    /// Read a parameters file before applying overrides
    pub fn config_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Add an overlay; later overlays take precedence
    pub fn overrides(mut self, overrides: ParameterOverrides) -> Self {
        self.overrides.push(overrides);
        self
    }

    /// Load, merge and validate the parameters
    pub async fn load(self) -> Result<BuildParameters, BuilderError> {
        let mut params = BuildParameters::default().apply(self.defaults);

        if let Some(path) = &self.config_file {
            params = params.apply(load_parameters_file(path).await?);
        }
        for overrides in self.overrides {
            params = params.apply(overrides);
        }

        params.validate()?;
        Ok(params)
    }
}

impl Default for ParameterLoader {
    fn default() -> Self {
        Self::new()
    }
}
