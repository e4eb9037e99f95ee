//! Embedded template rendering
//!
//! The cloud-config document and the binary hook filter script are
//! Jinja2 templates compiled into the binary. Undefined variables are an
//! error, so a missing placeholder never renders as an empty string.

pub mod context;

pub use context::build_context;

use crate::BuilderError;
use crate::modules::write_files::RESERVED_HOOK_GLOBS;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

const CLOUD_CONFIG_NAME: &str = "cloud-config.yaml";
const CLOUD_CONFIG_TEMPLATE: &str = include_str!("../../templates/cloud-config.yaml.j2");

const HOOK_FILTER_NAME: &str = "binary-hook-filter.sh";
const HOOK_FILTER_TEMPLATE: &str = include_str!("../../templates/hooks/binary-hook-filter.sh.j2");

/// Renderer holding the embedded templates
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Create a renderer with all embedded templates loaded
    pub fn new() -> Result<Self, BuilderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_template(CLOUD_CONFIG_NAME, CLOUD_CONFIG_TEMPLATE)?;
        env.add_template(HOOK_FILTER_NAME, HOOK_FILTER_TEMPLATE)?;

        Ok(Self { env })
    }

    /// Render the cloud-config document
    pub fn render_cloud_config(
        &self,
        ctx: &HashMap<String, Value>,
    ) -> Result<String, BuilderError> {
        debug!("Rendering cloud-config template");
        self.render(CLOUD_CONFIG_NAME, ctx)
    }

    /// Render the binary hook filter script keeping hooks matching `allowed`
    pub fn render_hook_filter(&self, allowed: &str) -> Result<String, BuilderError> {
        debug!("Rendering binary hook filter for {}", allowed);
        self.render(
            HOOK_FILTER_NAME,
            minijinja::context! {
                allowed => allowed,
                reserved => RESERVED_HOOK_GLOBS,
            },
        )
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, BuilderError> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_render_hook_filter() {
        let renderer = TemplateRenderer::new().unwrap();
        let script = renderer.render_hook_filter("030-*").unwrap();

        assert!(script.starts_with("#!/bin/sh -eux\n"));
        assert!(script.contains("        030-*|9997*|9998*|9999*)\n"));
        assert!(script.contains("echo \"Skipped \\$0\""));
        assert!(script.ends_with("done\n"));
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = HashMap::new();
        ctx.insert("homedir".to_string(), Value::from("/home/ubuntu"));

        let result = renderer.render_cloud_config(&ctx);
        assert!(matches!(result, Err(BuilderError::Template(_))));
    }
}
