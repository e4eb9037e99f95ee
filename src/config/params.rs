//! Build parameters
//!
//! Parameters are layered with later sources taking precedence:
//! 1. Built-in defaults
//! 2. Parameters file (`--config`)
//! 3. Command line flags

use crate::BuilderError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SUITE: &str = "xenial";
pub const DEFAULT_BUILD_ID: &str = "root";
pub const DEFAULT_HOMEDIR: &str = "/home/ubuntu";

/// Inputs for a single render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParameters {
    /// Ubuntu suite to build, e.g. `xenial`
    pub suite: String,
    pub build_id: String,
    /// Directory inside the instance where the build happens
    pub homedir: PathBuf,
    /// PPA injected into the build chroot (`ppa:` or private `https://`)
    pub ppa: Option<String>,
    /// Signing key of a private build PPA
    pub ppa_key: Option<String>,
    /// PPA injected into the built image, `user/archive[:priority]`
    pub image_ppa: Option<String>,
    pub customisation_script: Option<PathBuf>,
    pub binary_customisation_script: Option<PathBuf>,
    /// Glob of binary hooks to keep; all others are disabled
    pub binary_hook_filter: Option<String>,
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            suite: DEFAULT_SUITE.to_string(),
            build_id: DEFAULT_BUILD_ID.to_string(),
            homedir: PathBuf::from(DEFAULT_HOMEDIR),
            ppa: None,
            ppa_key: None,
            image_ppa: None,
            customisation_script: None,
            binary_customisation_script: None,
            binary_hook_filter: None,
        }
    }
}

impl BuildParameters {
    /// Apply an overlay; values set in `overrides` win
    pub fn apply(mut self, overrides: ParameterOverrides) -> Self {
        if let Some(suite) = overrides.suite {
            self.suite = suite;
        }
        if let Some(build_id) = overrides.build_id {
            self.build_id = build_id;
        }
        if let Some(homedir) = overrides.homedir {
            self.homedir = homedir;
        }
        if overrides.ppa.is_some() {
            self.ppa = overrides.ppa;
        }
        if overrides.ppa_key.is_some() {
            self.ppa_key = overrides.ppa_key;
        }
        if overrides.image_ppa.is_some() {
            self.image_ppa = overrides.image_ppa;
        }
        if overrides.customisation_script.is_some() {
            self.customisation_script = overrides.customisation_script;
        }
        if overrides.binary_customisation_script.is_some() {
            self.binary_customisation_script = overrides.binary_customisation_script;
        }
        if overrides.binary_hook_filter.is_some() {
            self.binary_hook_filter = overrides.binary_hook_filter;
        }
        self
    }

    /// Home directory as it appears in generated paths, without a trailing slash
    pub fn homedir_str(&self) -> String {
        let homedir = self.homedir.to_string_lossy();
        homedir.trim_end_matches('/').to_string()
    }

    /// Reject values that would produce a broken build environment
    pub fn validate(&self) -> Result<(), BuilderError> {
        check_word("suite", &self.suite)?;
        check_word("build id", &self.build_id)?;
        if self.build_id.contains('/') {
            return Err(BuilderError::Config(format!(
                "build id must not contain '/': {}",
                self.build_id
            )));
        }
        if !self.homedir.is_absolute() {
            return Err(BuilderError::Config(format!(
                "homedir must be an absolute path: {}",
                self.homedir.display()
            )));
        }
        if self.homedir_str().is_empty() {
            return Err(BuilderError::Config(
                "homedir must not be the filesystem root".to_string(),
            ));
        }
        check_word("homedir", &self.homedir_str())?;
        if let Some(ppa) = &self.ppa {
            check_word("build PPA", ppa)?;
        }
        if let Some(key) = &self.ppa_key {
            check_word("build PPA key", key)?;
        }
        if let Some(image_ppa) = &self.image_ppa {
            check_word("image PPA", image_ppa)?;
        }
        if let Some(filter) = &self.binary_hook_filter {
            check_word("binary hook filter", filter)?;
        }
        debug!("Validated build parameters: {:?}", self);
        Ok(())
    }
}

fn check_word(what: &str, value: &str) -> Result<(), BuilderError> {
    if value.is_empty() {
        return Err(BuilderError::Config(format!("{} must not be empty", what)));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '#'))
    {
        return Err(BuilderError::Config(format!(
            "{} must not contain whitespace, quotes or '#': {:?}",
            what, value
        )));
    }
    Ok(())
}

/// Partial parameters, as read from a parameters file or the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterOverrides {
    pub suite: Option<String>,
    pub build_id: Option<String>,
    pub homedir: Option<PathBuf>,
    #[serde(alias = "build_ppa")]
    pub ppa: Option<String>,
    #[serde(alias = "build_ppa_key")]
    pub ppa_key: Option<String>,
    pub image_ppa: Option<String>,
    #[serde(alias = "customization_script")]
    pub customisation_script: Option<PathBuf>,
    #[serde(alias = "binary_customization_script")]
    pub binary_customisation_script: Option<PathBuf>,
    pub binary_hook_filter: Option<String>,
}

impl ParameterOverrides {
    /// Resolve relative script paths against `base`
    pub fn relative_to(mut self, base: &Path) -> Self {
        for script in [
            &mut self.customisation_script,
            &mut self.binary_customisation_script,
        ]
        .into_iter()
        .flatten()
        {
            if script.is_relative() {
                *script = base.join(&*script);
            }
        }
        self
    }
}
