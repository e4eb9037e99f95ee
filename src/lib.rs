//! ubuntu-standalone-builder library
//!
//! Generates cloud-config documents that turn a throwaway cloud instance into
//! an Ubuntu CPC image builder, without Launchpad.
//!
//! # Overview
//!
//! - **Parameters**: [`config::BuildParameters`], layered from defaults, an
//!   optional parameters file and the command line
//! - **Build PPA**: [`modules::ppa`] turns a `ppa:` or private `https://`
//!   PPA into apt setup commands for the build chroot
//! - **Hooks**: [`modules::write_files`] embeds customisation scripts as
//!   livecd-rootfs hooks
//! - **Rendering**: [`template`] fills the embedded cloud-config template

pub mod config;
pub mod modules;
pub mod output;
pub mod template;

mod error;

pub use config::{BuildParameters, CloudConfig, ParameterOverrides};
pub use error::BuilderError;
pub use modules::{HookScripts, HookStanza, HookType, PpaSource};

use template::{TemplateRenderer, build_context};
use tracing::{debug, info, warn};

/// Render a cloud-config document from parameters and loaded hook scripts
///
/// Parameters are validated first, and the rendered text is parsed back
/// before being returned, so an `Ok` result is always a complete, valid YAML
/// document.
pub fn render(params: &BuildParameters, scripts: &HookScripts) -> Result<String, BuilderError> {
    params.validate()?;
    let renderer = TemplateRenderer::new()?;

    let ppa_conf = match params.ppa.as_deref() {
        Some(ppa) => modules::ppa_snippet(ppa, params.ppa_key.as_deref(), &params.suite)?,
        None => {
            if params.ppa_key.is_some() {
                warn!("Ignoring build PPA key, no build PPA given");
            }
            String::new()
        }
    };

    let write_files = modules::build_write_files(params, scripts, &renderer)?;
    debug!("Built {} write_files stanzas", write_files.len());

    let ctx = build_context(params, &ppa_conf, &write_files);
    let doc = renderer.render_cloud_config(&ctx)?;

    CloudConfig::parse_generated(&doc)?;
    Ok(doc)
}

/// Validate parameters, load hook scripts and render the document
pub async fn generate(params: &BuildParameters) -> Result<String, BuilderError> {
    params.validate()?;
    let scripts = config::loader::load_hook_scripts(params).await?;

    info!(
        "Generating {} build config (build id {})",
        params.suite, params.build_id
    );
    render(params, &scripts)
}
