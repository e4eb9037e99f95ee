//! Write files module
//!
//! Builds the `write_files` stanzas that drop livecd-rootfs hooks into the
//! build chroot. Hooks run in lexical filename order, so the numeric sequence
//! prefix of each hook decides when it runs.

use crate::BuilderError;
use crate::config::BuildParameters;
use crate::template::TemplateRenderer;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

pub const OWNER: &str = "root:root";
pub const PERMISSIONS: &str = "0755";
pub const ENCODING: &str = "b64";

/// Sequence of the hook that stubs out grub-probe
pub const SETUP_SEQUENCE: u16 = 9997;
/// Sequence of user supplied customisation hooks
pub const SCRIPT_SEQUENCE: u16 = 9998;
/// Sequence of the hook that restores grub-probe
pub const TEARDOWN_SEQUENCE: u16 = 9999;
/// Sequence of the binary hook filter; must sort below every disk image hook (030)
pub const FILTER_SEQUENCE: u16 = 0;

/// Hook name globs the binary hook filter never disables
pub const RESERVED_HOOK_GLOBS: &str = "9997*|9998*|9999*";

const HOOKS_DIR: &str = "chroot-autobuild/usr/share/livecd-rootfs/live-build/ubuntu-cpc/hooks";

const SETUP_CONTENT: &[u8] = include_bytes!("../../templates/hooks/grub-probe-setup.chroot");
const TEARDOWN_CONTENT: &[u8] = include_bytes!("../../templates/hooks/grub-probe-teardown.chroot");

/// livecd-rootfs hook phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
    /// Runs inside the image chroot
    Chroot,
    /// Runs outside the chroot, while image files are packed
    Binary,
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookType::Chroot => write!(f, "chroot"),
            HookType::Binary => write!(f, "binary"),
        }
    }
}

/// A single `write_files` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookStanza {
    pub encoding: &'static str,
    pub content: String,
    pub path: String,
    pub owner: &'static str,
    pub permissions: &'static str,
    #[serde(skip)]
    pub hook_type: HookType,
    #[serde(skip)]
    pub sequence: u16,
}

impl HookStanza {
    /// Encode `content` as a hook for the build rooted at `homedir`
    pub fn new(
        content: &[u8],
        hook_type: HookType,
        sequence: u16,
        params: &BuildParameters,
    ) -> Self {
        let path = hook_path(params, sequence, hook_type);
        debug!("Adding {} hook {} ({} bytes)", hook_type, path, content.len());

        Self {
            encoding: ENCODING,
            content: BASE64.encode(content),
            path,
            owner: OWNER,
            permissions: PERMISSIONS,
            hook_type,
            sequence,
        }
    }

    /// Hook file name, e.g. `9998-local-modifications.chroot`
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Destination of a hook inside the build chroot
pub fn hook_path(params: &BuildParameters, sequence: u16, hook_type: HookType) -> String {
    format!(
        "{}/build-{}/{}/{:03}-local-modifications.{}",
        params.homedir_str(),
        params.build_id,
        HOOKS_DIR,
        sequence,
        hook_type
    )
}

/// Raw contents of the user supplied hook scripts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookScripts {
    pub chroot: Option<Vec<u8>>,
    pub binary: Option<Vec<u8>>,
}

/// Build the ordered `write_files` stanzas for a render
///
/// Empty scripts produce no stanza. A chroot script is bracketed by the
/// grub-probe setup and teardown hooks.
pub fn build_write_files(
    params: &BuildParameters,
    scripts: &HookScripts,
    renderer: &TemplateRenderer,
) -> Result<Vec<HookStanza>, BuilderError> {
    let mut stanzas = Vec::new();

    match scripts.chroot.as_deref() {
        Some([]) => info!("Customisation script is empty, skipping chroot hook"),
        Some(content) => {
            stanzas.push(HookStanza::new(
                SETUP_CONTENT,
                HookType::Chroot,
                SETUP_SEQUENCE,
                params,
            ));
            stanzas.push(HookStanza::new(
                content,
                HookType::Chroot,
                SCRIPT_SEQUENCE,
                params,
            ));
            stanzas.push(HookStanza::new(
                TEARDOWN_CONTENT,
                HookType::Chroot,
                TEARDOWN_SEQUENCE,
                params,
            ));
        }
        None => {}
    }

    match scripts.binary.as_deref() {
        Some([]) => info!("Binary customisation script is empty, skipping binary hook"),
        Some(content) => {
            stanzas.push(HookStanza::new(content, HookType::Binary, SCRIPT_SEQUENCE, params));
        }
        None => {}
    }

    if let Some(filter) = params.binary_hook_filter.as_deref() {
        let content = renderer.render_hook_filter(filter)?;
        stanzas.push(HookStanza::new(
            content.as_bytes(),
            HookType::Binary,
            FILTER_SEQUENCE,
            params,
        ));
    }

    Ok(stanzas)
}

/// Decode the content of a `write_files` entry
pub fn decode_content(content: &str, encoding: Option<&str>) -> Result<Vec<u8>, BuilderError> {
    match encoding {
        Some("base64") | Some("b64") => BASE64
            .decode(content)
            .map_err(|e| BuilderError::InvalidData(format!("Invalid base64: {}", e))),
        Some(other) => Err(BuilderError::InvalidData(format!(
            "Unknown encoding: {}",
            other
        ))),
        None => Ok(content.as_bytes().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new().unwrap()
    }

    #[test]
    fn test_stanza_metadata() {
        let params = BuildParameters::default();
        let stanza = HookStanza::new(b"#!/bin/sh\ntrue", HookType::Chroot, 9998, &params);

        assert_eq!(stanza.owner, "root:root");
        assert_eq!(stanza.permissions, "0755");
        assert_eq!(stanza.encoding, "b64");
        assert_eq!(
            stanza.path,
            "/home/ubuntu/build-root/chroot-autobuild/usr/share/livecd-rootfs/live-build/ubuntu-cpc/hooks/9998-local-modifications.chroot"
        );
        assert_eq!(stanza.file_name(), "9998-local-modifications.chroot");
    }

    #[test]
    fn test_stanza_content_round_trips() {
        let params = BuildParameters::default();
        let raw = b"#!/bin/sh\nprintf '\\xff'\n\xff\xfe";
        let stanza = HookStanza::new(raw, HookType::Binary, 9998, &params);

        let decoded = decode_content(&stanza.content, Some(stanza.encoding)).unwrap();
        assert_eq!(decoded, raw);
    }

    #[test]
    fn test_hook_path_uses_homedir_and_build_id() {
        let params = BuildParameters {
            homedir: "/srv/builder/".into(),
            build_id: "nightly".to_string(),
            ..Default::default()
        };

        assert_eq!(
            hook_path(&params, FILTER_SEQUENCE, HookType::Binary),
            "/srv/builder/build-nightly/chroot-autobuild/usr/share/livecd-rootfs/live-build/ubuntu-cpc/hooks/000-local-modifications.binary"
        );
    }

    #[test]
    fn test_no_scripts_no_stanzas() {
        let stanzas =
            build_write_files(&BuildParameters::default(), &HookScripts::default(), &renderer())
                .unwrap();
        assert!(stanzas.is_empty());
    }

    #[test]
    fn test_chroot_script_is_bracketed() {
        let scripts = HookScripts {
            chroot: Some(b"#!/bin/sh\ntrue".to_vec()),
            binary: None,
        };
        let stanzas =
            build_write_files(&BuildParameters::default(), &scripts, &renderer()).unwrap();

        assert_eq!(stanzas.len(), 3);
        let names: Vec<&str> = stanzas.iter().map(|s| s.file_name()).collect();
        assert!(names[0] < names[1] && names[1] < names[2]);

        let setup = decode_content(&stanzas[0].content, Some("b64")).unwrap();
        assert!(String::from_utf8(setup).unwrap().contains("grub-probe.dist"));
        let teardown = decode_content(&stanzas[2].content, Some("b64")).unwrap();
        assert_eq!(teardown, TEARDOWN_CONTENT);
    }

    #[test]
    fn test_empty_scripts_are_skipped() {
        let scripts = HookScripts {
            chroot: Some(Vec::new()),
            binary: Some(Vec::new()),
        };
        let stanzas =
            build_write_files(&BuildParameters::default(), &scripts, &renderer()).unwrap();
        assert!(stanzas.is_empty());
    }

    #[test]
    fn test_binary_script_stanza() {
        let scripts = HookScripts {
            chroot: None,
            binary: Some(b"#!/bin/sh\necho binary".to_vec()),
        };
        let stanzas =
            build_write_files(&BuildParameters::default(), &scripts, &renderer()).unwrap();

        assert_eq!(stanzas.len(), 1);
        assert_eq!(stanzas[0].hook_type, HookType::Binary);
        assert_eq!(stanzas[0].file_name(), "9998-local-modifications.binary");
    }

    #[test]
    fn test_binary_hook_filter_stanza() {
        let params = BuildParameters {
            binary_hook_filter: Some("030-*".to_string()),
            ..Default::default()
        };
        let stanzas = build_write_files(&params, &HookScripts::default(), &renderer()).unwrap();

        assert_eq!(stanzas.len(), 1);
        assert!(stanzas[0].file_name() < "030");

        let content = decode_content(&stanzas[0].content, Some("b64")).unwrap();
        let content = String::from_utf8(content).unwrap();
        assert!(content.contains("030-*|9997*|9998*|9999*)"));
        assert!(content.starts_with("#!/bin/sh -eux\n"));
    }

    #[test]
    fn test_decode_unknown_encoding() {
        assert!(decode_content("abc", Some("gzip")).is_err());
        assert_eq!(decode_content("abc", None).unwrap(), b"abc");
    }
}
