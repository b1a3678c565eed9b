use std::path::{Path, PathBuf};

use async_trait::async_trait;
use outpost_core::{CoreError, ValidationError};
use tracing::info;

/// Where generated artifacts end up: a clipboard copy or a file download.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn copy_text(&self, label: &str, text: &str) -> Result<PathBuf, CoreError>;

    async fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CoreError>;
}

/// Writes exports below one directory. Clipboard copies land in
/// `clipboard/<label>.txt`, downloads under their own file name.
#[derive(Debug, Clone)]
pub struct DirectoryExporter {
    root: PathBuf,
}

impl DirectoryExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, relative: PathBuf, bytes: &[u8]) -> Result<PathBuf, CoreError> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                CoreError::Configuration(format!(
                    "failed to create export directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "failed to write export '{}': {error}",
                path.display()
            ))
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote export");
        Ok(path)
    }
}

fn safe_file_name(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ValidationError::Invalid {
            field,
            reason: format!("'{name}' is not a plain file name"),
        });
    }
    Ok(name.to_owned())
}

#[async_trait]
impl Exporter for DirectoryExporter {
    async fn copy_text(&self, label: &str, text: &str) -> Result<PathBuf, CoreError> {
        let label = safe_file_name("label", label)?;
        self.write(
            PathBuf::from("clipboard").join(format!("{label}.txt")),
            text.as_bytes(),
        )
        .await
    }

    async fn download(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CoreError> {
        let file_name = safe_file_name("file_name", file_name)?;
        self.write(PathBuf::from(file_name), bytes).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "outpost-export-{prefix}-{nanos}-{}",
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn download_and_copy_write_below_root() {
        let root = unique_temp_dir("writes");
        let exporter = DirectoryExporter::new(&root);

        let script = exporter
            .download("install-outpost.sh", b"#!/bin/sh\n")
            .await
            .expect("download");
        assert_eq!(script, root.join("install-outpost.sh"));
        assert_eq!(std::fs::read(&script).expect("read script"), b"#!/bin/sh\n");

        let copied = exporter.copy_text("api-key", "oz_live_key0005").await.expect("copy");
        assert_eq!(copied, root.join("clipboard").join("api-key.txt"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn path_like_names_are_rejected() {
        let exporter = DirectoryExporter::new(unique_temp_dir("reject"));
        let error = exporter
            .download("../escape.sh", b"")
            .await
            .expect_err("traversal");
        assert!(error.is_validation());
        assert!(exporter.copy_text(" ", "x").await.is_err());
    }
}
