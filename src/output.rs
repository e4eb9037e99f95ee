//! Output sink
//!
//! Writes a fully rendered document to a file or stdout. File output goes
//! through a sibling temporary file so a failed write never leaves a
//! truncated document at the destination.

use crate::BuilderError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Write `doc` to `outfile`, or to stdout when no file is given
pub async fn write_document(doc: &str, outfile: Option<&Path>) -> Result<(), BuilderError> {
    match outfile {
        Some(path) => write_file(doc, path).await,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(doc.as_bytes()).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

async fn write_file(doc: &str, path: &Path) -> Result<(), BuilderError> {
    let tmp = temp_path(path);
    debug!("Writing {} bytes to {}", doc.len(), tmp.display());

    if let Err(e) = fs::write(&tmp, doc).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!("Wrote cloud-config to {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| path.as_os_str()));
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_document_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.yaml");

        write_document("#cloud-config\n", Some(&path)).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#cloud-config\n");
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![OsString::from("output.yaml")]);
    }

    #[tokio::test]
    async fn test_write_document_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output.yaml");
        std::fs::write(&path, "stale").unwrap();

        write_document("#cloud-config\nfresh\n", Some(&path)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#cloud-config\nfresh\n");
    }

    #[tokio::test]
    async fn test_write_document_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing/dir/output.yaml");

        let err = write_document("#cloud-config\n", Some(&path)).await.unwrap_err();
        assert!(matches!(err, BuilderError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/tmp/out/output.yaml"));
        assert_eq!(tmp.parent(), Some(Path::new("/tmp/out")));
        assert!(tmp.file_name().unwrap().to_string_lossy().starts_with(".output.yaml."));
    }
}
