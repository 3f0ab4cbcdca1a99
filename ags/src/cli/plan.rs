// ags/src/cli/plan.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use ags_common::cache::Cache;
use ags_common::config::Config;
use ags_common::error::Result;
use ags_core::{ClassificationBuckets, SyncEngine, SyncRequest};
use ags_net::DefaultTransport;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::ProfileArgs;

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Use the cached manifest instead of fetching it
    #[arg(long)]
    pub offline: bool,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    manifest: &'a str,
    matched_rules: &'a [String],
    selected: &'a BTreeSet<String>,
    buckets: &'a ClassificationBuckets,
}

fn list_line(label: colored::ColoredString, names: &BTreeSet<String>) {
    if names.is_empty() {
        println!("{:<14} -", label);
    } else {
        let joined = names.iter().cloned().collect::<Vec<_>>().join(", ");
        println!("{:<14} {}", label, joined);
    }
}

impl PlanArgs {
    pub async fn run(&self, config: &Config, cache: Arc<Cache>) -> Result<()> {
        let request = SyncRequest::new(self.profile.profile()?)
            .with_rules(self.profile.rules()?)
            .offline(self.offline);
        let transport = Arc::new(DefaultTransport::new(config.allow_http)?);
        let engine = SyncEngine::new(config.clone(), transport).with_cache(cache);

        let plan = engine.plan(&request).await?;

        if self.json {
            let output = PlanOutput {
                manifest: plan.manifest_location.as_str(),
                matched_rules: &plan.matched_rules,
                selected: &plan.selected,
                buckets: &plan.buckets,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{} {}", "Manifest:".bold(), plan.manifest_location);
        println!(
            "{} {}",
            "Matched rules:".bold(),
            plan.matched_rules.join(", ")
        );
        println!(
            "{} {} agents",
            "Selected:".bold(),
            plan.selected.len()
        );
        println!();
        let b = &plan.buckets;
        list_line("install".green().bold(), &b.new_install);
        list_line("upgradable".magenta().bold(), &b.upgrade_candidate);
        list_line("up to date".dimmed(), &b.up_to_date);
        list_line("custom".blue(), &b.custom);
        list_line("not in catalog".yellow(), &b.unresolved);

        if !plan.has_work() {
            println!();
            println!("{}", "Nothing to do.".green());
        }
        Ok(())
    }
}
