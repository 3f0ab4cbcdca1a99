// ags-core/src/report.rs
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use ags_common::error::{AgsError, Result};
use ags_common::model::{ArtifactName, FailureReason, InstallOutcome, InstallResult};
use serde::Serialize;

/// Completion report of a sync run. Always produced, also for runs aborted by a
/// fatal error, in which case only `fatal` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub installed: BTreeSet<ArtifactName>,
    pub upgraded: BTreeSet<ArtifactName>,
    /// Upgrade candidates the resolution declined.
    pub kept_as_is: BTreeSet<ArtifactName>,
    pub up_to_date: BTreeSet<ArtifactName>,
    pub custom_preserved: BTreeSet<ArtifactName>,
    pub failed: BTreeMap<ArtifactName, FailureReason>,
    pub unresolved: BTreeSet<ArtifactName>,
    pub missing_mandatory: BTreeSet<ArtifactName>,
    pub backup: Option<PathBuf>,
    pub fatal: Option<String>,
    pub duration_secs: f64,
}

impl SyncReport {
    pub fn fatal(err: &AgsError) -> Self {
        Self {
            fatal: Some(err.to_string()),
            ..Default::default()
        }
    }

    pub fn record(&mut self, result: InstallResult) {
        let InstallResult { name, outcome } = result;
        match outcome {
            InstallOutcome::Installed => {
                self.installed.insert(name);
            }
            InstallOutcome::Upgraded => {
                self.upgraded.insert(name);
            }
            InstallOutcome::Skipped => {
                self.kept_as_is.insert(name);
            }
            InstallOutcome::Failed(reason) => {
                self.failed.insert(name, reason);
            }
        }
    }

    pub fn results(&self) -> Vec<InstallResult> {
        let with = |names: &BTreeSet<ArtifactName>, outcome: InstallOutcome| {
            names
                .iter()
                .map(|n| InstallResult {
                    name: n.clone(),
                    outcome: outcome.clone(),
                })
                .collect::<Vec<_>>()
        };
        let mut results = with(&self.installed, InstallOutcome::Installed);
        results.extend(with(&self.upgraded, InstallOutcome::Upgraded));
        results.extend(with(&self.kept_as_is, InstallOutcome::Skipped));
        results.extend(self.failed.iter().map(|(n, r)| InstallResult {
            name: n.clone(),
            outcome: InstallOutcome::Failed(r.clone()),
        }));
        results.sort_by(|a, b| a.name.cmp(&b.name));
        results
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// No fatal error and no failed artifact.
    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.failed.is_empty()
    }

    /// Whether the run changed anything on disk.
    pub fn wrote_anything(&self) -> bool {
        !self.installed.is_empty() || !self.upgraded.is_empty() || self.backup.is_some()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_every_outcome_once() {
        let mut report = SyncReport::default();
        for (name, outcome) in [
            ("a", InstallOutcome::Installed),
            ("b", InstallOutcome::Upgraded),
            ("c", InstallOutcome::Skipped),
            ("d", InstallOutcome::Failed(FailureReason::EmptyPayload)),
        ] {
            report.record(InstallResult {
                name: name.to_string(),
                outcome,
            });
        }
        let names: Vec<String> = report.results().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(!report.is_success());
        assert!(report.wrote_anything());
    }

    #[test]
    fn fatal_report_is_empty_otherwise() {
        let err = AgsError::ManifestParse("bad".into());
        let report = SyncReport::fatal(&err);
        assert!(report.is_fatal());
        assert!(!report.wrote_anything());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"fatal\""));
        assert!(json.contains("bad"));
    }

    #[test]
    fn json_uses_tagged_failure_reasons() {
        let mut report = SyncReport::default();
        report.record(InstallResult {
            name: "x".into(),
            outcome: InstallOutcome::Failed(FailureReason::Transport("timeout".into())),
        });
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["failed"]["x"]["kind"], "transport");
        assert_eq!(value["failed"]["x"]["detail"], "timeout");
    }
}
