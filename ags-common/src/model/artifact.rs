// ags-common/src/model/artifact.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AgsError, Result};

/// Identity of an artifact: the join key across manifest, inventory and selection.
pub type ArtifactName = String;

/// File extension of an installed artifact; the file stem is its name.
pub const ARTIFACT_EXTENSION: &str = "md";

/// Rejects names that could not round-trip through a file stem or that would escape
/// the artifact directory.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.trim() != name
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(AgsError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn artifact_file_name(name: &str) -> String {
    format!("{name}.{ARTIFACT_EXTENSION}")
}

/// Why an artifact ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// Retrieval failed twice (initial attempt plus one retry).
    Transport(String),
    /// The payload was zero bytes.
    EmptyPayload,
    /// The upgrade sub-operation was cancelled because the backup could not be made.
    Backup(String),
    /// Staging or committing the file failed locally.
    Io(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Transport(msg) => write!(f, "transport failure: {msg}"),
            FailureReason::EmptyPayload => write!(f, "empty payload"),
            FailureReason::Backup(msg) => write!(f, "backup failed: {msg}"),
            FailureReason::Io(msg) => write!(f, "i/o error: {msg}"),
        }
    }
}

impl From<&AgsError> for FailureReason {
    fn from(err: &AgsError) -> Self {
        match err {
            AgsError::Transport { reason, .. } => FailureReason::Transport(reason.clone()),
            AgsError::Http(e) => FailureReason::Transport(e.to_string()),
            AgsError::EmptyPayload(_) => FailureReason::EmptyPayload,
            AgsError::Backup(msg) => FailureReason::Backup(msg.clone()),
            other => FailureReason::Io(other.to_string()),
        }
    }
}

/// Terminal state of one artifact touched by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed,
    Upgraded,
    Skipped,
    Failed(FailureReason),
}

impl InstallOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, InstallOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResult {
    pub name: ArtifactName,
    pub outcome: InstallOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for name in ["sdlc-enforcer", "python_expert", "a", "agent.v2"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_names_that_escape_or_hide() {
        for name in ["", " padded", "../etc", "a/b", "a\\b", ".hidden", ".."] {
            assert!(
                matches!(validate_name(name), Err(AgsError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn failure_reason_maps_from_errors() {
        let transport = AgsError::Transport {
            location: "x".into(),
            reason: "timeout".into(),
        };
        assert_eq!(
            FailureReason::from(&transport),
            FailureReason::Transport("timeout".into())
        );
        assert_eq!(
            FailureReason::from(&AgsError::EmptyPayload("x".into())),
            FailureReason::EmptyPayload
        );
    }

    #[test]
    fn outcome_serializes_with_reason() {
        let json = serde_json::to_string(&InstallOutcome::Failed(FailureReason::EmptyPayload))
            .unwrap();
        assert_eq!(
            json,
            r#"{"state":"failed","reason":{"kind":"empty_payload"}}"#
        );
    }
}
