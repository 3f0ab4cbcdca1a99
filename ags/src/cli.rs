// ags/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;
use std::sync::Arc;

use ags_common::error::Result;
use ags_common::{Cache, Config, ProjectProfile};
use ags_core::RuleSet;
use clap::{ArgAction, Args, Parser, Subcommand};

pub mod list;
pub mod plan;
pub mod prompt;
pub mod report;
pub mod status;
pub mod sync;
pub mod update;

use crate::cli::list::List;
use crate::cli::plan::PlanArgs;
use crate::cli::sync::SyncArgs;
use crate::cli::update::Update;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "ags", bin_name = "ags")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding the installed agent files
    #[arg(long, global = true, value_name = "DIR")]
    pub agents_dir: Option<PathBuf>,

    /// Manifest location (https URL, file URL or path)
    #[arg(long, global = true, value_name = "LOCATION")]
    pub manifest: Option<String>,

    /// Maximum number of concurrent downloads
    #[arg(long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Applies command-line overrides on top of the environment configuration.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.agents_dir {
            config = config.with_agents_dir(dir.clone());
        }
        if let Some(manifest) = &self.manifest {
            config = config.with_manifest_location(manifest.clone());
        }
        if let Some(n) = self.concurrency {
            config = config.with_concurrency(n);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install and upgrade the agents the project profile needs
    Sync(SyncArgs),
    /// Show what a sync would do without changing anything
    Plan(PlanArgs),
    /// List installed agents and how they relate to the profile
    List(List),
    /// Refresh the cached manifest
    Update(Update),
}

impl Command {
    pub async fn run(&self, config: &Config, cache: Arc<Cache>) -> Result<()> {
        match self {
            Self::Sync(command) => command.run(config, cache).await,
            Self::Plan(command) => command.run(config, cache).await,
            Self::List(command) => command.run(config, cache).await,
            Self::Update(command) => command.run(config, cache).await,
        }
    }
}

/// Project profile and rule selection shared by `sync`, `plan` and `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Project type, e.g. api, web, cli, library
    #[arg(long = "type", value_name = "TYPE")]
    pub project_type: Option<String>,

    /// Language used by the project (repeatable)
    #[arg(long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Pain point to address (repeatable)
    #[arg(long = "pain-point", value_name = "PAIN")]
    pub pain_points: Vec<String>,

    /// TOML profile file; flags above are merged on top
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// TOML selection rules replacing the built-in set
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

impl ProfileArgs {
    pub fn profile(&self) -> Result<ProjectProfile> {
        let mut profile = match &self.profile {
            Some(path) => ProjectProfile::load(path)?,
            None => ProjectProfile::default(),
        };
        if let Some(t) = &self.project_type {
            profile.project_type = t.clone();
        }
        profile.languages.extend(self.languages.iter().cloned());
        profile.pain_points.extend(self.pain_points.iter().cloned());
        Ok(profile.normalized())
    }

    pub fn rules(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => RuleSet::load(path),
            None => Ok(RuleSet::builtin()),
        }
    }
}
