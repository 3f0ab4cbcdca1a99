//! Contains the logic for the `update` command.
use std::sync::Arc;

use ags_common::cache::Cache;
use ags_common::config::Config;
use ags_common::error::Result;
use ags_core::SyncEngine;
use ags_net::DefaultTransport;

#[derive(clap::Args, Debug)]
pub struct Update;

impl Update {
    pub async fn run(&self, config: &Config, cache: Arc<Cache>) -> Result<()> {
        tracing::debug!("Using cache directory: {:?}", config.cache_dir);
        println!("Updating agent catalog");

        let transport = Arc::new(DefaultTransport::new(config.allow_http)?);
        let engine = SyncEngine::new(config.clone(), transport).with_cache(cache);

        match engine.refresh_cache().await {
            Ok((manifest, location)) => {
                tracing::debug!("✓ Cached manifest from {}", location);
                println!(
                    "Cached {} agents in {} categories{}",
                    manifest.len(),
                    manifest.categories().len(),
                    manifest
                        .version()
                        .map(|v| format!(" (catalog version {v})"))
                        .unwrap_or_default()
                );
            }
            Err(e) => {
                tracing::error!("Failed to fetch/store manifest: {}", e);
                return Err(e);
            }
        }

        println!("Update completed successfully!");
        Ok(())
    }
}
