// ags-core/src/pipeline/engine.rs
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use ags_common::cache::Cache;
use ags_common::config::Config;
use ags_common::error::{AgsError, Result};
use ags_common::model::{
    ArtifactName, FailureReason, InstallOutcome, InstallResult, Manifest, ProjectProfile,
};
use ags_common::pipeline::{ArtifactAction, SyncEvent};
use ags_net::{fetch_manifest, Location, Transport};
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::worker::{self, get_panic_message, WorkerContext};
use crate::classify::{classify_against, ClassificationBuckets};
use crate::install::{BackupRecord, StagingArea};
use crate::manifest::{parse_manifest, ManifestResolver};
use crate::resolution::{self, FixedDecider, Resolution, ResolutionMode, UpgradeDecider};
use crate::report::SyncReport;
use crate::select::RuleSet;
use crate::{inventory, verify};

/// Inputs of one run besides configuration.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub profile: ProjectProfile,
    pub rules: RuleSet,
    pub mode: ResolutionMode,
    /// Read the manifest from the cache instead of fetching it.
    pub offline: bool,
}

impl SyncRequest {
    pub fn new(profile: ProjectProfile) -> Self {
        Self {
            profile,
            rules: RuleSet::builtin(),
            mode: ResolutionMode::default(),
            offline: false,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

/// Everything known before the first write: selection, inventory and their
/// classification against the catalog.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub manifest: Arc<Manifest>,
    pub manifest_location: Location,
    pub selected: BTreeSet<ArtifactName>,
    pub mandatory: BTreeSet<ArtifactName>,
    pub matched_rules: Vec<String>,
    pub local: BTreeSet<ArtifactName>,
    pub buckets: ClassificationBuckets,
    /// Retrieval locations for `new_install ∪ upgrade_candidate`.
    pub locations: BTreeMap<ArtifactName, Location>,
}

impl SyncPlan {
    pub fn has_work(&self) -> bool {
        !self.buckets.new_install.is_empty() || !self.buckets.upgrade_candidate.is_empty()
    }
}

pub struct SyncEngine {
    config: Config,
    cache: Option<Arc<Cache>>,
    transport: Arc<dyn Transport>,
    event_tx: Option<broadcast::Sender<SyncEvent>>,
}

impl SyncEngine {
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            cache: None,
            transport,
            event_tx: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_events(mut self, event_tx: broadcast::Sender<SyncEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }

    fn manifest_location(&self) -> Result<Location> {
        let raw_location = self.config.manifest_location()?;
        Location::parse(raw_location).map_err(|e| AgsError::ManifestFetch {
            location: raw_location.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetches (or, offline, loads from cache) and parses the manifest. A
    /// successful online fetch also refreshes the cache, best effort.
    pub async fn load_manifest(&self, offline: bool) -> Result<(Manifest, Location)> {
        let location = self.manifest_location()?;

        let raw = if offline {
            let cache = self.cache.as_ref().ok_or_else(|| AgsError::ManifestFetch {
                location: location.to_string(),
                reason: "offline mode needs a manifest cache".to_string(),
            })?;
            cache
                .load_manifest(location.as_str())
                .map_err(|e| AgsError::ManifestFetch {
                    location: location.to_string(),
                    reason: format!("no usable cached copy ({e}); run 'ags update'"),
                })?
        } else {
            let raw = fetch_manifest(self.transport.as_ref(), &location).await?;
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.store_manifest(location.as_str(), &raw) {
                    warn!("Failed to cache manifest: {}", e);
                }
            }
            raw
        };

        let manifest = parse_manifest(&raw, location.as_str())?;
        Ok((manifest, location))
    }

    /// Fetches the manifest and stores it for offline runs. Only a document that
    /// parses is cached, and a failed store is an error.
    pub async fn refresh_cache(&self) -> Result<(Manifest, Location)> {
        let cache = self
            .cache
            .as_ref()
            .ok_or_else(|| AgsError::Cache("no manifest cache configured".to_string()))?;
        let location = self.manifest_location()?;
        let raw = fetch_manifest(self.transport.as_ref(), &location).await?;
        let manifest = parse_manifest(&raw, location.as_str())?;
        cache
            .store_manifest(location.as_str(), &raw)
            .map_err(|e| AgsError::Cache(format!("could not store manifest: {e}")))?;
        // Read back so a cache that silently lost the write is caught here.
        cache.load_manifest(location.as_str())?;
        debug!("Cached manifest from {}", location);
        Ok((manifest, location))
    }

    /// Computes the plan without writing anything.
    #[instrument(skip_all)]
    pub async fn plan(&self, request: &SyncRequest) -> Result<SyncPlan> {
        let (manifest, manifest_location) = self.load_manifest(request.offline).await?;
        self.emit(SyncEvent::ManifestLoaded {
            entries: manifest.len(),
        });

        let local = inventory::scan(self.config.agents_dir())?;
        let selected = request.rules.select(&request.profile);
        let mandatory = request.rules.mandatory();
        let matched_rules = request
            .rules
            .explain(&request.profile)
            .into_iter()
            .map(|r| r.name.clone())
            .collect();

        let mut buckets = classify_against(&selected, &local, &manifest);

        let resolver = ManifestResolver::new(&manifest, &manifest_location)?;
        let work: BTreeSet<ArtifactName> = buckets
            .new_install
            .union(&buckets.upgrade_candidate)
            .cloned()
            .collect();
        let resolved = resolver.resolve(&manifest, &work);
        // Unretrievable names are never fetched: absent ones become unresolved,
        // present ones are left as they are.
        for name in &resolved.unresolved {
            if buckets.new_install.remove(name) {
                buckets.unresolved.insert(name.clone());
            } else if buckets.upgrade_candidate.remove(name) {
                buckets.custom.insert(name.clone());
            }
        }
        for name in &buckets.unresolved {
            warn!("Selected artifact '{}' is not offered by the catalog", name);
        }

        Ok(SyncPlan {
            manifest: Arc::new(manifest),
            manifest_location,
            selected,
            mandatory,
            matched_rules,
            local,
            buckets,
            locations: resolved.locations,
        })
    }

    /// Performs a full run and always returns a report. Fatal errors (manifest
    /// fetch or parse, unusable local directory) abort before any write and are
    /// carried in `SyncReport::fatal`.
    pub async fn run(
        &self,
        request: &SyncRequest,
        decider: Box<dyn UpgradeDecider + Send>,
    ) -> SyncReport {
        let start = Instant::now();
        self.emit(SyncEvent::RunStarted {
            manifest: self
                .config
                .manifest_location
                .clone()
                .unwrap_or_default(),
        });

        let mut report = match self.execute(request, decider).await {
            Ok(report) => report,
            Err(e) => {
                if e.is_fatal() {
                    error!("Catalog unusable, sync aborted: {}", e);
                } else {
                    error!("Sync aborted before any change: {}", e);
                }
                self.emit(SyncEvent::LogError {
                    message: e.to_string(),
                });
                SyncReport::fatal(&e)
            }
        };
        report.duration_secs = start.elapsed().as_secs_f64();

        self.emit(SyncEvent::RunFinished {
            duration_secs: report.duration_secs,
            success_count: report.installed.len() + report.upgraded.len(),
            fail_count: report.failed.len(),
        });
        info!(
            "Sync finished in {:.2}s: {} installed, {} upgraded, {} failed",
            report.duration_secs,
            report.installed.len(),
            report.upgraded.len(),
            report.failed.len()
        );
        report
    }

    async fn execute(
        &self,
        request: &SyncRequest,
        decider: Box<dyn UpgradeDecider + Send>,
    ) -> Result<SyncReport> {
        let plan = self.plan(request).await?;
        let buckets = &plan.buckets;
        self.emit(SyncEvent::PlanReady {
            new_installs: buckets.new_install.len(),
            upgrade_candidates: buckets.upgrade_candidate.len(),
            up_to_date: buckets.up_to_date.len(),
            custom: buckets.custom.len(),
            unresolved: buckets.unresolved.len(),
        });
        for name in &buckets.unresolved {
            self.emit(SyncEvent::LogWarn {
                message: format!("'{name}' is not offered by the catalog"),
            });
        }

        let mut report = SyncReport {
            up_to_date: buckets.up_to_date.clone(),
            custom_preserved: buckets.custom.clone(),
            unresolved: buckets.unresolved.clone(),
            ..Default::default()
        };

        if plan.has_work() {
            self.apply(&plan, request.mode, decider, &mut report).await?;
        } else {
            debug!("Nothing to install or upgrade");
            self.emit(SyncEvent::LogInfo {
                message: "nothing to install or upgrade".to_string(),
            });
        }

        report.missing_mandatory =
            match verify::verify_mandatory(self.config.agents_dir(), &plan.mandatory) {
                Ok(missing) => missing,
                Err(e) => {
                    warn!("Could not re-scan artifacts for verification: {}", e);
                    let present: BTreeSet<ArtifactName> = plan
                        .local
                        .union(&report.installed)
                        .cloned()
                        .collect();
                    plan.mandatory.difference(&present).cloned().collect()
                }
            };
        for name in &report.missing_mandatory {
            self.emit(SyncEvent::LogWarn {
                message: format!("mandatory artifact '{name}' is missing"),
            });
        }
        Ok(report)
    }

    async fn apply(
        &self,
        plan: &SyncPlan,
        mode: ResolutionMode,
        decider: Box<dyn UpgradeDecider + Send>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let agents_dir = self.config.agents_dir().to_path_buf();
        std::fs::create_dir_all(&agents_dir)?;
        let staging = Arc::new(StagingArea::new(&agents_dir)?);

        let ctx = Arc::new(WorkerContext {
            transport: Arc::clone(&self.transport),
            staging: Arc::clone(&staging),
            agents_dir: agents_dir.clone(),
            event_tx: self.event_tx.clone(),
        });
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks: JoinSet<InstallResult> = JoinSet::new();
        let mut pending: BTreeSet<ArtifactName> = BTreeSet::new();

        // New installs never overwrite, so they start before any upgrade decision.
        for name in &plan.buckets.new_install {
            match plan.locations.get(name) {
                Some(location) => {
                    self.spawn(
                        &mut tasks,
                        &ctx,
                        &permits,
                        name,
                        ArtifactAction::Install,
                        location,
                        None,
                    );
                    pending.insert(name.clone());
                }
                None => report.record(self.unlocatable(name, ArtifactAction::Install)),
            }
        }

        let resolution = self
            .decide(&plan.buckets.upgrade_candidate, mode, decider)
            .await;
        for name in &resolution.declined {
            self.emit(SyncEvent::ArtifactSkipped { name: name.clone() });
            report.record(InstallResult {
                name: name.clone(),
                outcome: InstallOutcome::Skipped,
            });
        }

        if !resolution.approved.is_empty() {
            let backup = {
                let config = self.config.clone();
                let approved = resolution.approved.clone();
                tokio::task::spawn_blocking(move || {
                    BackupRecord::create(&config, &approved, chrono::Local::now())
                })
                .await
                .unwrap_or_else(|e| {
                    let msg = if e.is_panic() {
                        get_panic_message(e.into_panic())
                    } else {
                        e.to_string()
                    };
                    Err(AgsError::Backup(format!("backup task failed: {msg}")))
                })
            };

            match backup {
                Ok(record) => {
                    self.emit(SyncEvent::BackupCreated {
                        path: record.path.clone(),
                        entries: record.len(),
                    });
                    report.backup = Some(record.path.clone());
                    for name in &resolution.approved {
                        let backup_path = record.backup_of(name).map(PathBuf::from);
                        match plan.locations.get(name) {
                            Some(location) => {
                                self.spawn(
                                    &mut tasks,
                                    &ctx,
                                    &permits,
                                    name,
                                    ArtifactAction::Upgrade,
                                    location,
                                    backup_path,
                                );
                                pending.insert(name.clone());
                            }
                            None => {
                                report.record(self.unlocatable(name, ArtifactAction::Upgrade))
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Backup failed, cancelling all upgrades: {}", e);
                    for name in &resolution.approved {
                        self.emit(SyncEvent::artifact_failed(
                            name.clone(),
                            ArtifactAction::Upgrade,
                            &e,
                        ));
                        report.record(InstallResult {
                            name: name.clone(),
                            outcome: InstallOutcome::Failed(FailureReason::Backup(e.to_string())),
                        });
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    pending.remove(&result.name);
                    report.record(result);
                }
                Err(join_error) => {
                    let msg = if join_error.is_panic() {
                        get_panic_message(join_error.into_panic())
                    } else {
                        join_error.to_string()
                    };
                    error!("Artifact task ended abnormally: {}", msg);
                }
            }
        }
        // Tasks that died without reporting still need a terminal state.
        for name in pending {
            report.record(InstallResult {
                name,
                outcome: InstallOutcome::Failed(FailureReason::Io(
                    "artifact task ended abnormally".to_string(),
                )),
            });
        }

        drop(ctx);
        match Arc::try_unwrap(staging) {
            Ok(area) => {
                if let Err(e) = area.close() {
                    warn!("Staging cleanup failed: {}", e);
                }
            }
            Err(_) => warn!("Staging area still in use; leaving it to be dropped"),
        }
        Ok(())
    }

    /// Resolves upgrade candidates. A per-item decider may block on user input,
    /// so it runs on the blocking pool while new installs proceed.
    async fn decide(
        &self,
        candidates: &BTreeSet<ArtifactName>,
        mode: ResolutionMode,
        mut decider: Box<dyn UpgradeDecider + Send>,
    ) -> Resolution {
        if candidates.is_empty() {
            return Resolution::default();
        }
        if mode != ResolutionMode::PerItem {
            return resolution::resolve(candidates, mode, &mut FixedDecider(None));
        }
        let owned = candidates.clone();
        let joined = tokio::task::spawn_blocking(move || {
            resolution::resolve(&owned, mode, decider.as_mut())
        })
        .await;
        match joined {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("Upgrade prompt failed, keeping all candidates: {}", e);
                Resolution {
                    approved: BTreeSet::new(),
                    declined: candidates.clone(),
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn(
        &self,
        tasks: &mut JoinSet<InstallResult>,
        ctx: &Arc<WorkerContext>,
        permits: &Arc<Semaphore>,
        name: &str,
        action: ArtifactAction,
        location: &Location,
        backup: Option<PathBuf>,
    ) {
        let ctx = Arc::clone(ctx);
        let permits = Arc::clone(permits);
        let name = name.to_string();
        let location = location.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            worker::execute_transaction(ctx, name, action, location, backup).await
        });
    }

    fn unlocatable(&self, name: &str, action: ArtifactAction) -> InstallResult {
        let e = AgsError::Transport {
            location: name.to_string(),
            reason: "no retrievable location in the catalog".to_string(),
        };
        self.emit(SyncEvent::artifact_failed(name.to_string(), action, &e));
        InstallResult {
            name: name.to_string(),
            outcome: InstallOutcome::Failed(FailureReason::Transport(
                "no retrievable location in the catalog".to_string(),
            )),
        }
    }
}
