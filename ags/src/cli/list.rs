// ags/src/cli/list.rs
use std::sync::Arc;

use ags_common::cache::Cache;
use ags_common::config::Config;
use ags_common::error::Result;
use ags_core::{inventory, SyncEngine, SyncRequest};
use ags_net::DefaultTransport;
use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use tracing::warn;

use super::ProfileArgs;

#[derive(Args, Debug)]
pub struct List {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Use the cached manifest instead of fetching it
    #[arg(long)]
    pub offline: bool,
}

impl List {
    pub async fn run(&self, config: &Config, cache: Arc<Cache>) -> Result<()> {
        let request = SyncRequest::new(self.profile.profile()?)
            .with_rules(self.profile.rules()?)
            .offline(self.offline);
        let transport = Arc::new(DefaultTransport::new(config.allow_http)?);
        let engine = SyncEngine::new(config.clone(), transport).with_cache(cache);

        let installed = inventory::scan(config.agents_dir())?;
        if installed.is_empty() {
            println!(
                "{}",
                format!("0 agents installed in {}", config.agents_dir().display()).yellow()
            );
            return Ok(());
        }

        // The listing still works without a reachable catalog; it just loses the
        // status column.
        let plan = match engine.plan(&request).await {
            Ok(plan) => Some(plan),
            Err(e) => {
                warn!("Catalog unavailable, listing without status: {}", e);
                None
            }
        };

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Name").style_spec("b"),
            Cell::new("Category").style_spec("b"),
            Cell::new("Status").style_spec("b"),
            Cell::new("New?").style_spec("b"),
        ]));

        for name in &installed {
            let (category, status, has_new) = match &plan {
                Some(plan) => {
                    let entry = plan.manifest.get(name);
                    (
                        entry.map(|e| e.category.clone()).unwrap_or_else(|| "-".to_string()),
                        plan.buckets.bucket_of(name).unwrap_or("-"),
                        entry.is_some_and(|e| e.has_newer_version),
                    )
                }
                None => ("-".to_string(), "-", false),
            };
            let status_cell = match status {
                "custom" => Cell::new(status).style_spec("Fb"),
                "upgradable" => Cell::new(status).style_spec("Fm"),
                _ => Cell::new(status),
            };
            table.add_row(Row::new(vec![
                Cell::new(name).style_spec("Fc"),
                Cell::new(&category),
                status_cell,
                Cell::new(if has_new { "✔" } else { "" }),
            ]));
        }
        table.printstd();
        println!("{}", format!("{} agents installed", installed.len()).bold());
        Ok(())
    }
}
