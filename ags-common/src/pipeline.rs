// ags-common/src/pipeline.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AgsError;
use crate::model::ArtifactName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactAction {
    /// Create a file that does not exist yet.
    Install,
    /// Overwrite an existing file; requires a backup first.
    Upgrade,
}

impl ArtifactAction {
    pub fn overwrites(&self) -> bool {
        matches!(self, ArtifactAction::Upgrade)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncEvent {
    RunStarted {
        manifest: String,
    },
    ManifestLoaded {
        entries: usize,
    },
    PlanReady {
        new_installs: usize,
        upgrade_candidates: usize,
        up_to_date: usize,
        custom: usize,
        unresolved: usize,
    },
    DownloadStarted {
        name: ArtifactName,
        location: String,
    },
    DownloadRetry {
        name: ArtifactName,
        error: String,
    },
    DownloadFinished {
        name: ArtifactName,
        size_bytes: u64,
    },
    BackupCreated {
        path: PathBuf,
        entries: usize,
    },
    ArtifactCommitted {
        name: ArtifactName,
        action: ArtifactAction,
    },
    ArtifactFailed {
        name: ArtifactName,
        action: ArtifactAction,
        error: String, // Keep as String for simplicity in events
    },
    ArtifactSkipped {
        name: ArtifactName,
    },
    RunFinished {
        duration_secs: f64,
        success_count: usize,
        fail_count: usize,
    },
    LogInfo {
        message: String,
    },
    LogWarn {
        message: String,
    },
    LogError {
        message: String,
    },
}

impl SyncEvent {
    // AgsError kept for internal use, but events use String for error messages
    pub fn artifact_failed(name: ArtifactName, action: ArtifactAction, error: &AgsError) -> Self {
        SyncEvent::ArtifactFailed {
            name,
            action,
            error: error.to_string(),
        }
    }
}
