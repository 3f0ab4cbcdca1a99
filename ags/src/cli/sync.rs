// ags/src/cli/sync.rs
use std::io::IsTerminal;
use std::sync::Arc;

use ags_common::cache::Cache;
use ags_common::config::Config;
use ags_common::error::{AgsError, Result};
use ags_common::pipeline::SyncEvent;
use ags_core::{FixedDecider, ResolutionMode, SyncEngine, SyncRequest, UpgradeDecider};
use ags_net::DefaultTransport;
use clap::Args;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use super::prompt::ConfirmDecider;
use super::report::{print_json, print_report};
use super::status;
use super::ProfileArgs;

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Upgrade every agent the catalog marks as newer
    #[arg(long, short = 'y', conflicts_with = "keep")]
    pub yes: bool,

    /// Never upgrade existing agents
    #[arg(long)]
    pub keep: bool,

    /// Use the cached manifest instead of fetching it
    #[arg(long)]
    pub offline: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    fn resolution(&self) -> (ResolutionMode, Box<dyn UpgradeDecider + Send>) {
        if self.yes {
            (ResolutionMode::All, Box::new(FixedDecider(Some(true))))
        } else if self.keep {
            (ResolutionMode::None, Box::new(FixedDecider(Some(false))))
        } else if !self.json && std::io::stdin().is_terminal() && std::io::stderr().is_terminal() {
            (ResolutionMode::PerItem, Box::new(ConfirmDecider))
        } else {
            debug!("No terminal for prompts; keeping existing agents");
            (ResolutionMode::None, Box::new(FixedDecider(None)))
        }
    }

    #[instrument(skip_all)]
    pub async fn run(&self, config: &Config, cache: Arc<Cache>) -> Result<()> {
        let (mode, decider) = self.resolution();
        let request = SyncRequest::new(self.profile.profile()?)
            .with_rules(self.profile.rules()?)
            .with_mode(mode)
            .offline(self.offline);
        debug!("Sync request: {:?}, mode {}", request.profile, mode);

        let transport = Arc::new(DefaultTransport::new(config.allow_http)?);
        let mut engine = SyncEngine::new(config.clone(), transport).with_cache(cache);

        let status_handle = if self.json {
            None
        } else {
            let (event_tx, event_rx) = broadcast::channel::<SyncEvent>(256);
            engine = engine.with_events(event_tx);
            Some(tokio::spawn(status::handle_events(event_rx)))
        };

        let report = engine.run(&request, decider).await;
        drop(engine);
        if let Some(handle) = status_handle {
            handle.await.ok();
        }

        if self.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }

        if let Some(fatal) = report.fatal {
            return Err(AgsError::Generic(fatal));
        }
        if !report.failed.is_empty() {
            return Err(AgsError::Generic(format!(
                "{} agent(s) failed to install",
                report.failed.len()
            )));
        }
        Ok(())
    }
}
