// Filesystem host adapter - Reads sources from disk, saves and shares deliverables

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::MediaTypeRules;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Host integration backed by the local filesystem.
///
/// Saved files land in `output_dir`; an existing file is never overwritten,
/// a numbered name is chosen instead. Sharing hands a staged copy to an
/// external command when one is configured.
pub struct FsHostAdapter {
    output_dir: PathBuf,
    share_command: Option<Vec<String>>,
}

impl FsHostAdapter {
    const MAX_NAME_ATTEMPTS: usize = 1000;

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            share_command: None,
        }
    }

    /// Enable sharing through a command line; the staged file path is
    /// appended as the last argument
    pub fn with_share_command(mut self, command_line: &str) -> Self {
        let parts: Vec<String> = command_line.split_whitespace().map(String::from).collect();
        self.share_command = if parts.is_empty() { None } else { Some(parts) };
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write atomically under the first free numbered name
    fn persist_unique(dir: &Path, bytes: &[u8], filename: &str) -> Result<PathBuf, DomainError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            DomainError::Delivery(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let mut staged = NamedTempFile::new_in(dir)
            .map_err(|e| DomainError::Delivery(format!("Failed to stage file: {}", e)))?;
        staged
            .write_all(bytes)
            .and_then(|_| staged.flush())
            .map_err(|e| DomainError::Delivery(format!("Failed to write file: {}", e)))?;

        let name = PathUtils::safe_file_name(filename);
        for attempt in 0..Self::MAX_NAME_ATTEMPTS {
            let target = PathUtils::numbered_candidate(dir, &name, attempt);
            match staged.persist_noclobber(&target) {
                Ok(_) => return Ok(target),
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    staged = e.file;
                }
                Err(e) => {
                    return Err(DomainError::Delivery(format!(
                        "Failed to save {}: {}",
                        target.display(),
                        e.error
                    )))
                }
            }
        }
        Err(DomainError::Delivery(format!(
            "No free file name for {} in {}",
            name,
            dir.display()
        )))
    }
}

#[async_trait]
impl DeliveryPort for FsHostAdapter {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, DomainError> {
        let dir = self.output_dir.clone();
        let bytes = bytes.to_vec();
        let filename = filename.to_string();
        let path = tokio::task::spawn_blocking(move || Self::persist_unique(&dir, &bytes, &filename))
            .await
            .map_err(|e| DomainError::Delivery(format!("Save task failed: {}", e)))??;

        info!("Saved {}", path.display());
        Ok(path)
    }

    fn can_share(&self) -> bool {
        self.share_command.is_some()
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn share(
        &self,
        bytes: &[u8],
        filename: &str,
        mime: &str,
    ) -> Result<SharedCopy, DomainError> {
        let Some((program, args)) = self.share_command.as_ref().and_then(|c| c.split_first())
        else {
            return Err(DomainError::Delivery("sharing is not configured".to_string()));
        };

        let staging = tempfile::Builder::new()
            .prefix("reeltrim-share-")
            .tempdir()
            .map_err(|e| DomainError::Delivery(format!("Failed to stage share: {}", e)))?;
        let staged = staging.path().join(PathUtils::safe_file_name(filename));
        tokio::fs::write(&staged, bytes)
            .await
            .map_err(|e| DomainError::Delivery(format!("Failed to stage share: {}", e)))?;

        debug!(program = %program, "Handing file to share command");
        let status = Command::new(program)
            .args(args)
            .arg(&staged)
            .env("REELTRIM_SHARE_MIME", mime)
            .env("REELTRIM_SHARE_NAME", filename)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| DomainError::Delivery(format!("{}: {}", program, e)))?;

        // Openers such as xdg-open return before the receiver reads the file
        if status.success() {
            Ok(SharedCopy::new(staged, staging))
        } else {
            Err(DomainError::Delivery(format!(
                "share command exited with {}",
                status
            )))
        }
    }
}

#[async_trait]
impl SourcePort for FsHostAdapter {
    async fn open(&self, path: &Path) -> Result<SourceFile, DomainError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::Io(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime = MediaTypeRules::mime_from_path(path);
        debug!(%name, %mime, size = bytes.len(), "Opened source");

        let origin = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(SourceFile::new(name, mime, bytes).with_origin(origin))
    }
}
