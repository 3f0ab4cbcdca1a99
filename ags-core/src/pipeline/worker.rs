// ags-core/src/pipeline/worker.rs
use std::path::PathBuf;
use std::sync::Arc;

use ags_common::error::{AgsError, Result};
use ags_common::model::{
    artifact_file_name, ArtifactName, FailureReason, InstallOutcome, InstallResult,
};
use ags_common::pipeline::{ArtifactAction, SyncEvent};
use ags_net::{Location, Transport};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::install::{StagingArea, Transaction, TxState};

/// Shared state for the per-artifact tasks of one run.
pub(crate) struct WorkerContext {
    pub transport: Arc<dyn Transport>,
    pub staging: Arc<StagingArea>,
    pub agents_dir: PathBuf,
    pub event_tx: Option<broadcast::Sender<SyncEvent>>,
}

impl WorkerContext {
    pub fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }
}

/// Retrieves `location`, retrying once when the first attempt fails in
/// transport. Empty payloads are returned as-is; judging them is the
/// transaction's job.
async fn fetch_with_retry(
    ctx: &WorkerContext,
    name: &str,
    location: &Location,
) -> Result<Vec<u8>> {
    match ctx.transport.fetch(location).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.is_transient() => {
            warn!("[{}] Retrying download after: {}", name, e);
            ctx.emit(SyncEvent::DownloadRetry {
                name: name.to_string(),
                error: e.to_string(),
            });
            ctx.transport.fetch(location).await
        }
        Err(e) => Err(e),
    }
}

fn transport_failure(err: &AgsError) -> FailureReason {
    match err {
        AgsError::Transport { reason, .. } => FailureReason::Transport(reason.clone()),
        other => FailureReason::Transport(other.to_string()),
    }
}

/// Runs one artifact transaction to a terminal state. Never returns an error:
/// every failure ends up in the returned `InstallResult`.
#[instrument(skip(ctx, location, backup))]
pub(crate) async fn execute_transaction(
    ctx: Arc<WorkerContext>,
    name: ArtifactName,
    action: ArtifactAction,
    location: Location,
    backup: Option<PathBuf>,
) -> InstallResult {
    let target = ctx.agents_dir.join(artifact_file_name(&name));
    let mut tx = Transaction::new(name.clone(), action, target);
    if let Some(path) = backup {
        tx.attach_backup(path);
    }

    ctx.emit(SyncEvent::DownloadStarted {
        name: name.clone(),
        location: location.to_string(),
    });

    let outcome = match fetch_with_retry(&ctx, &name, &location).await {
        Ok(payload) => {
            ctx.emit(SyncEvent::DownloadFinished {
                name: name.clone(),
                size_bytes: payload.len() as u64,
            });
            let committed = tx
                .stage(&ctx.staging, &payload)
                .and_then(|_| tx.verify())
                .and_then(|_| tx.commit());
            match committed {
                Ok(()) => {
                    ctx.emit(SyncEvent::ArtifactCommitted {
                        name: name.clone(),
                        action,
                    });
                    match action {
                        ArtifactAction::Install => InstallOutcome::Installed,
                        ArtifactAction::Upgrade => InstallOutcome::Upgraded,
                    }
                }
                Err(e) => {
                    ctx.emit(SyncEvent::artifact_failed(name.clone(), action, &e));
                    let reason = match tx.state() {
                        TxState::Failed(reason) => reason.clone(),
                        _ => FailureReason::from(&e),
                    };
                    InstallOutcome::Failed(reason)
                }
            }
        }
        Err(e) => {
            warn!("[{}] Download from {} failed: {}", name, location, e);
            let reason = transport_failure(&e);
            tx.fail(reason.clone());
            ctx.emit(SyncEvent::artifact_failed(name.clone(), action, &e));
            InstallOutcome::Failed(reason)
        }
    };

    debug!("[{}] Transaction history: {:?}", name, tx.history());
    InstallResult { name, outcome }
}

pub(crate) fn get_panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    match panic.downcast_ref::<&'static str>() {
        Some(s) => s.to_string(),
        None => match panic.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "unknown panic payload".to_string(),
        },
    }
}
