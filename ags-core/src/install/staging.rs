// ags-core/src/install/staging.rs
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ags_common::error::{AgsError, Result};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

const STAGING_PREFIX: &str = ".ags-staging-";

/// Scratch directory next to the artifact directory. Staged payloads live here
/// until committed; being on the same filesystem keeps the final rename atomic.
/// The directory and anything left in it are removed on drop.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn new(agents_dir: &Path) -> Result<Self> {
        let parent = agents_dir.parent().ok_or_else(|| {
            AgsError::IoError(format!(
                "Artifact directory {} has no parent for staging",
                agents_dir.display()
            ))
        })?;
        fs::create_dir_all(parent).map_err(|e| AgsError::Io(Arc::new(e)))?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| AgsError::Io(Arc::new(e)))?;
        debug!("Created staging area {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `bytes` to a fresh file in the staging area.
    pub fn stage(&self, name: &str, bytes: &[u8]) -> Result<StagedFile> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{name}."))
            .suffix(".part")
            .tempfile_in(self.dir.path())
            .map_err(|e| AgsError::Io(Arc::new(e)))?;
        file.write_all(bytes)?;
        file.flush()?;
        file.as_file().sync_all()?;
        Ok(StagedFile { file })
    }

    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!("Failed to remove staging area {}: {}", path.display(), e);
            AgsError::Io(Arc::new(e))
        })
    }
}

/// A payload sitting in the staging area.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Renames the staged file onto `target`, replacing any existing file.
    pub(crate) fn persist(self, target: &Path) -> Result<PathBuf> {
        let staged = self.file.path().to_path_buf();
        self.file.persist(target).map_err(|e| {
            warn!(
                "Failed to move staged file {} onto {}: {}",
                staged.display(),
                target.display(),
                e.error
            );
            AgsError::Io(Arc::new(e.error))
        })?;
        Ok(target.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_lives_next_to_the_artifact_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let agents = tmp.path().join("agents");
        let area = StagingArea::new(&agents).unwrap();
        assert_eq!(area.path().parent(), Some(tmp.path()));
        assert!(area
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_PREFIX));

        let staged = area.stage("a", b"hello").unwrap();
        assert_eq!(staged.len().unwrap(), 5);
        assert!(staged.path().starts_with(area.path()));

        let staging_path = area.path().to_path_buf();
        drop(staged);
        area.close().unwrap();
        assert!(!staging_path.exists());
    }

    #[test]
    fn persist_replaces_target() {
        let tmp = tempfile::tempdir().unwrap();
        let agents = tmp.path().join("agents");
        fs::create_dir_all(&agents).unwrap();
        let target = agents.join("a.md");
        fs::write(&target, "old").unwrap();

        let area = StagingArea::new(&agents).unwrap();
        let staged = area.stage("a", b"new").unwrap();
        staged.persist(&target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn stage_reports_write_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(&tmp.path().join("agents")).unwrap();
        fs::remove_dir_all(area.path()).unwrap();
        let err = area.stage("a", b"payload").unwrap_err();
        assert!(matches!(err, AgsError::Io(_)));
    }

    #[test]
    fn staged_bytes_are_on_disk_before_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let area = StagingArea::new(&tmp.path().join("agents")).unwrap();
        let staged = area.stage("a", b"payload").unwrap();
        assert_eq!(fs::read(staged.path()).unwrap(), b"payload");
    }
}
