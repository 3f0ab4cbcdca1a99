// ags-core/src/install/transaction.rs
use std::fmt;
use std::path::{Path, PathBuf};

use ags_common::error::{AgsError, Result};
use ags_common::model::{ArtifactName, FailureReason};
use ags_common::pipeline::ArtifactAction;
use tracing::{debug, instrument};

use super::staging::{StagedFile, StagingArea};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    Pending,
    Staged,
    Verified,
    Committed,
    Failed(FailureReason),
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Committed | TxState::Failed(_))
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxState::Pending => write!(f, "pending"),
            TxState::Staged => write!(f, "staged"),
            TxState::Verified => write!(f, "verified"),
            TxState::Committed => write!(f, "committed"),
            TxState::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Install or upgrade of a single artifact file.
///
/// `Pending -> Staged -> Verified -> Committed`, or `Failed` from any
/// non-terminal state. The final file is only touched by `commit`, and an
/// overwriting commit requires a backup to have been attached first.
#[derive(Debug)]
pub struct Transaction {
    name: ArtifactName,
    action: ArtifactAction,
    target: PathBuf,
    staged: Option<StagedFile>,
    backup: Option<PathBuf>,
    state: TxState,
    history: Vec<TxState>,
}

impl Transaction {
    pub fn new(name: impl Into<ArtifactName>, action: ArtifactAction, target: PathBuf) -> Self {
        Self {
            name: name.into(),
            action,
            target,
            staged: None,
            backup: None,
            state: TxState::Pending,
            history: vec![TxState::Pending],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> ArtifactAction {
        self.action
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn state(&self) -> &TxState {
        &self.state
    }

    /// Every state the transaction has passed through, oldest first.
    pub fn history(&self) -> &[TxState] {
        &self.history
    }

    fn transition(&mut self, next: TxState) {
        debug!("[{}] {} -> {}", self.name, self.state, next);
        self.state = next.clone();
        self.history.push(next);
    }

    fn expect_state(&self, wanted: &TxState, op: &str) -> Result<()> {
        if &self.state != wanted {
            return Err(AgsError::Transaction(format!(
                "cannot {op} '{}' in state {}",
                self.name, self.state
            )));
        }
        Ok(())
    }

    /// Marks the transaction failed and drops any staged payload. No-op once
    /// terminal.
    pub fn fail(&mut self, reason: FailureReason) {
        if self.state.is_terminal() {
            return;
        }
        self.staged = None;
        self.transition(TxState::Failed(reason));
    }

    pub fn stage(&mut self, area: &StagingArea, payload: &[u8]) -> Result<()> {
        self.expect_state(&TxState::Pending, "stage")?;
        match area.stage(&self.name, payload) {
            Ok(file) => {
                self.staged = Some(file);
                self.transition(TxState::Staged);
                Ok(())
            }
            Err(e) => {
                self.fail(FailureReason::from(&e));
                Err(e)
            }
        }
    }

    /// A staged payload is valid iff it is non-empty.
    pub fn verify(&mut self) -> Result<()> {
        self.expect_state(&TxState::Staged, "verify")?;
        let empty = match self.staged.as_ref().map(StagedFile::is_empty) {
            Some(Ok(empty)) => empty,
            Some(Err(e)) => {
                self.fail(FailureReason::from(&e));
                return Err(e);
            }
            None => {
                let e = AgsError::Transaction(format!("'{}' has no staged payload", self.name));
                self.fail(FailureReason::Io(e.to_string()));
                return Err(e);
            }
        };
        if empty {
            self.fail(FailureReason::EmptyPayload);
            return Err(AgsError::EmptyPayload(self.name.clone()));
        }
        self.transition(TxState::Verified);
        Ok(())
    }

    pub fn attach_backup(&mut self, path: PathBuf) {
        self.backup = Some(path);
    }

    pub fn backup(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    #[instrument(skip(self), fields(name = %self.name, action = ?self.action))]
    pub fn commit(&mut self) -> Result<()> {
        self.expect_state(&TxState::Verified, "commit")?;
        if self.action.overwrites() && self.backup.is_none() {
            let e = AgsError::Transaction(format!(
                "refusing to overwrite '{}' without a backup",
                self.name
            ));
            self.fail(FailureReason::Backup(e.to_string()));
            return Err(e);
        }
        let Some(staged) = self.staged.take() else {
            let e = AgsError::Transaction(format!("'{}' has no staged payload", self.name));
            self.fail(FailureReason::Io(e.to_string()));
            return Err(e);
        };
        match staged.persist(&self.target) {
            Ok(_) => {
                self.transition(TxState::Committed);
                Ok(())
            }
            Err(e) => {
                self.fail(FailureReason::from(&e));
                Err(e)
            }
        }
    }
}
