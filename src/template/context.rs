//! Template context building
//!
//! Builds the context for the cloud-config template from build parameters.

use crate::config::BuildParameters;
use crate::modules::HookStanza;
use minijinja::value::Value;
use std::collections::HashMap;

/// Build the cloud-config template context
///
/// `ppa_conf` is the already resolved build PPA snippet, empty when no PPA is
/// injected. `write_files` may be empty, in which case the section is left out.
pub fn build_context(
    params: &BuildParameters,
    ppa_conf: &str,
    write_files: &[HookStanza],
) -> HashMap<String, Value> {
    let mut ctx = HashMap::new();

    ctx.insert("homedir".to_string(), Value::from(params.homedir_str()));
    ctx.insert("build_id".to_string(), Value::from(params.build_id.clone()));
    ctx.insert("suite".to_string(), Value::from(params.suite.clone()));
    ctx.insert("ppa_conf".to_string(), Value::from(ppa_conf));
    ctx.insert(
        "image_ppa".to_string(),
        Value::from_serialize(&params.image_ppa),
    );
    ctx.insert(
        "write_files".to_string(),
        Value::from_serialize(write_files),
    );

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_context() {
        let params = BuildParameters {
            suite: "trusty".to_string(),
            image_ppa: Some("foo/bar:1001".to_string()),
            ..Default::default()
        };
        let ctx = build_context(&params, "", &[]);

        assert_eq!(ctx.get("suite").unwrap().to_string(), "trusty");
        assert_eq!(ctx.get("homedir").unwrap().to_string(), "/home/ubuntu");
        assert_eq!(ctx.get("image_ppa").unwrap().to_string(), "foo/bar:1001");
        assert!(!ctx.get("ppa_conf").unwrap().is_true());
        assert!(!ctx.get("write_files").unwrap().is_true());
    }

    #[test]
    fn test_absent_image_ppa_is_none() {
        let ctx = build_context(&BuildParameters::default(), "", &[]);
        assert!(ctx.get("image_ppa").unwrap().is_none());
    }
}
