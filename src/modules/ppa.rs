//! Build PPA module
//!
//! Translates a `--build-ppa` identifier into the `runcmd` lines that make the
//! archive available inside the build chroot.

use crate::BuilderError;
use tracing::{debug, warn};

/// Keyserver used to import private PPA signing keys
pub const KEYSERVER: &str = "hkp://keyserver.ubuntu.com:80";

/// sources.list.d entry written for private PPAs
pub const SOURCES_LIST_ENTRY: &str = "$CHROOT_ROOT/etc/apt/sources.list.d/builder-extra-ppa.list";

/// A PPA to inject into the build chroot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpaSource<'a> {
    /// Short form `ppa:user/archive`, added with add-apt-repository
    Public(&'a str),
    /// `https://` URL of a private PPA, signed with `key`
    Private { url: &'a str, key: &'a str },
}

impl<'a> PpaSource<'a> {
    /// Classify a PPA identifier
    ///
    /// A signing key is required for private PPAs and ignored for public ones.
    pub fn classify(ppa: &'a str, key: Option<&'a str>) -> Result<Self, BuilderError> {
        if ppa.starts_with("ppa:") {
            if let Some(key) = key {
                warn!("Ignoring build PPA key {} for public PPA {}", key, ppa);
            }
            Ok(Self::Public(ppa))
        } else if ppa.starts_with("https://") {
            match key {
                Some(key) => Ok(Self::Private { url: ppa, key }),
                None => Err(BuilderError::MissingPpaKey(ppa.to_string())),
            }
        } else {
            Err(BuilderError::InvalidPpa(ppa.to_string()))
        }
    }

    /// Render the `runcmd` list items for this PPA
    ///
    /// The result has no trailing newline and is spliced verbatim into the
    /// cloud-config template.
    pub fn snippet(&self, suite: &str) -> String {
        match self {
            Self::Public(ppa) => {
                format!("- chroot $CHROOT_ROOT add-apt-repository -y -u {}", ppa)
            }
            Self::Private { url, key } => [
                "- chroot $CHROOT_ROOT apt-get install -y apt-transport-https".to_string(),
                format!(
                    "- \"echo 'deb {} {} main' | tee {}\"",
                    url, suite, SOURCES_LIST_ENTRY
                ),
                format!(
                    "- \"chroot $CHROOT_ROOT apt-key adv --keyserver {} --recv-keys {}\"",
                    KEYSERVER, key
                ),
                "- chroot $CHROOT_ROOT apt-get -y update".to_string(),
            ]
            .join("\n"),
        }
    }
}

/// Resolve a PPA identifier straight to its `runcmd` snippet
pub fn ppa_snippet(ppa: &str, key: Option<&str>, suite: &str) -> Result<String, BuilderError> {
    let source = PpaSource::classify(ppa, key)?;
    debug!("Resolved build PPA {:?}", source);
    Ok(source.snippet(suite))
}
