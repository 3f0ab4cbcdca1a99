// ags-core/src/install/backup.rs
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ags_common::config::Config;
use ags_common::error::{AgsError, Result};
use ags_common::model::{artifact_file_name, ArtifactName};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub const BACKUP_MANIFEST_FILE: &str = "BACKUP_MANIFEST.json";
const MAX_NAME_COLLISIONS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub original: PathBuf,
    pub backup: PathBuf,
}

/// Snapshot of every artifact about to be overwritten in a run. Never deleted by
/// ags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub source_dir: PathBuf,
    pub artifacts: BTreeMap<ArtifactName, BackupEntry>,
}

impl BackupRecord {
    /// Copies `<agents_dir>/<name>.md` for every name into a new
    /// `<dir-name>.backup-<timestamp>` directory under the configured backup
    /// root. Any failure is reported as [`AgsError::Backup`]; a partial snapshot
    /// is left in place for inspection.
    pub fn create(
        config: &Config,
        names: &BTreeSet<ArtifactName>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let agents_dir = config.agents_dir();
        let stem = format!(
            "{}.backup-{}",
            config.agents_dir_name(),
            now.format("%Y%m%d-%H%M%S")
        );

        let path = create_unique_dir(&config.backup_root(), &stem)?;
        debug!("Backing up {} artifacts into {}", names.len(), path.display());

        let mut artifacts = BTreeMap::new();
        for name in names {
            let file_name = artifact_file_name(name);
            let original = agents_dir.join(&file_name);
            let backup = path.join(&file_name);
            fs::copy(&original, &backup).map_err(|e| {
                error!("Backup of {} failed: {}", original.display(), e);
                AgsError::Backup(format!("copy {}: {}", original.display(), e))
            })?;
            artifacts.insert(name.clone(), BackupEntry { original, backup });
        }

        let record = Self {
            path,
            created_at: now,
            source_dir: agents_dir.to_path_buf(),
            artifacts,
        };
        record.write_manifest()?;
        info!(
            "Backed up {} artifacts to {}",
            record.artifacts.len(),
            record.path.display()
        );
        Ok(record)
    }

    fn write_manifest(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AgsError::Backup(format!("serialize backup manifest: {e}")))?;
        fs::write(self.path.join(BACKUP_MANIFEST_FILE), json)
            .map_err(|e| AgsError::Backup(format!("write {BACKUP_MANIFEST_FILE}: {e}")))
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let raw = fs::read_to_string(dir.join(BACKUP_MANIFEST_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn backup_of(&self, name: &str) -> Option<&Path> {
        self.artifacts.get(name).map(|e| e.backup.as_path())
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn create_unique_dir(root: &Path, stem: &str) -> Result<PathBuf> {
    fs::create_dir_all(root)
        .map_err(|e| AgsError::Backup(format!("create {}: {}", root.display(), e)))?;
    for n in 0..MAX_NAME_COLLISIONS {
        let candidate = if n == 0 {
            root.join(stem)
        } else {
            root.join(format!("{stem}-{n}"))
        };
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(AgsError::Backup(format!(
                    "create {}: {}",
                    candidate.display(),
                    e
                )))
            }
        }
    }
    Err(AgsError::Backup(format!(
        "too many backups named {stem} in {}",
        root.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config_at(root: &Path) -> Config {
        let root = root.display().to_string();
        Config::load_from(|key| match key {
            "AGS_PROJECT_ROOT" => Some(root.clone()),
            "AGS_AGENTS_DIR" => Some("agents".to_string()),
            "AGS_CACHE_DIR" => Some(format!("{root}/cache")),
            _ => None,
        })
        .unwrap()
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn snapshots_files_and_writes_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_at(tmp.path());
        let agents = config.agents_dir().to_path_buf();
        fs::create_dir_all(&agents).unwrap();
        fs::write(agents.join("a.md"), "alpha").unwrap();
        fs::write(agents.join("b.md"), "beta").unwrap();

        let names: BTreeSet<String> = ["a".to_string()].into_iter().collect();
        let record = BackupRecord::create(&config, &names, fixed_now()).unwrap();

        assert_eq!(record.path, tmp.path().join("agents.backup-20260314-092653"));
        assert_eq!(fs::read_to_string(record.backup_of("a").unwrap()).unwrap(), "alpha");
        assert!(!record.path.join("b.md").exists());

        let reloaded = BackupRecord::load(&record.path).unwrap();
        assert_eq!(reloaded, record);
    }

    #[test]
    fn collisions_get_a_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_at(tmp.path());
        let agents = config.agents_dir().to_path_buf();
        fs::create_dir_all(&agents).unwrap();
        fs::write(agents.join("a.md"), "alpha").unwrap();
        let names: BTreeSet<String> = ["a".to_string()].into_iter().collect();

        let first = BackupRecord::create(&config, &names, fixed_now()).unwrap();
        let second = BackupRecord::create(&config, &names, fixed_now()).unwrap();
        assert_ne!(first.path, second.path);
        assert!(second.path.to_string_lossy().ends_with("-1"));
    }

    #[test]
    fn missing_source_is_backup_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_at(tmp.path());
        let agents = config.agents_dir().to_path_buf();
        fs::create_dir_all(&agents).unwrap();
        let names: BTreeSet<String> = ["ghost".to_string()].into_iter().collect();
        let err = BackupRecord::create(&config, &names, fixed_now()).unwrap_err();
        assert!(matches!(err, AgsError::Backup(_)));
    }
}
