// ags/src/cli/status.rs
use std::collections::HashMap;

use ags_common::pipeline::{ArtifactAction, SyncEvent};
use colored::*;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStatus {
    Downloading,
    Retrying,
    Downloaded,
    Installed,
    Upgraded,
    Kept,
    Failed,
}

impl JobStatus {
    fn display_state(&self) -> &'static str {
        match self {
            JobStatus::Downloading => "downloading",
            JobStatus::Retrying => "retrying",
            JobStatus::Downloaded => "downloaded",
            JobStatus::Installed => "installed",
            JobStatus::Upgraded => "upgraded",
            JobStatus::Kept => "kept",
            JobStatus::Failed => "failed",
        }
    }

    fn slot_indicator(&self) -> String {
        match self {
            JobStatus::Downloading => " ↓".yellow().to_string(),
            JobStatus::Retrying => " ↻".yellow().to_string(),
            JobStatus::Downloaded => " ✓".green().to_string(),
            JobStatus::Installed | JobStatus::Upgraded => " ✓".green().bold().to_string(),
            JobStatus::Kept => " ·".dimmed().to_string(),
            JobStatus::Failed => " ✗".red().bold().to_string(),
        }
    }

    fn colored_state(&self) -> ColoredString {
        match self {
            JobStatus::Downloading | JobStatus::Retrying => self.display_state().yellow(),
            JobStatus::Downloaded => self.display_state().green(),
            JobStatus::Installed => self.display_state().green().bold(),
            JobStatus::Upgraded => self.display_state().magenta().bold(),
            JobStatus::Kept => self.display_state().dimmed(),
            JobStatus::Failed => self.display_state().red().bold(),
        }
    }
}

/// One line per artifact state change. No cursor tricks: upgrade prompts may
/// interleave with the output.
struct StatusPrinter {
    sizes: HashMap<String, u64>,
    logs_buffer: Vec<String>,
}

impl StatusPrinter {
    fn new() -> Self {
        Self {
            sizes: HashMap::new(),
            logs_buffer: Vec::new(),
        }
    }

    fn line(&self, name: &str, status: JobStatus) {
        let size = self
            .sizes
            .get(name)
            .map(|b| format_bytes(*b))
            .unwrap_or_else(|| "–".to_string());
        println!(
            "{:<12} {:<36} {:>8} {}",
            status.colored_state(),
            name.cyan(),
            size,
            status.slot_indicator()
        );
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "kB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit_idx = 0;

    while value >= 1000.0 && unit_idx < UNITS.len() - 1 {
        value /= 1000.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{bytes}B")
    } else {
        format!("{:.1}{}", value, UNITS[unit_idx])
    }
}

pub async fn handle_events(mut event_rx: broadcast::Receiver<SyncEvent>) {
    let mut printer = StatusPrinter::new();

    loop {
        match event_rx.recv().await {
            Ok(event) => match event {
                SyncEvent::RunStarted { manifest } => {
                    println!("{} {}", "Syncing agents from".cyan().bold(), manifest);
                }
                SyncEvent::ManifestLoaded { entries } => {
                    println!("{} {}", "Catalog entries:".bold(), entries);
                }
                SyncEvent::PlanReady {
                    new_installs,
                    upgrade_candidates,
                    up_to_date,
                    custom,
                    unresolved,
                } => {
                    println!(
                        "{} {} new, {} upgradable, {} up to date, {} custom, {} unresolved",
                        "Plan:".bold(),
                        new_installs.to_string().green(),
                        upgrade_candidates.to_string().magenta(),
                        up_to_date,
                        custom,
                        unresolved
                    );
                    println!();
                }
                SyncEvent::DownloadStarted { name, .. } => {
                    printer.line(&name, JobStatus::Downloading);
                }
                SyncEvent::DownloadRetry { name, error } => {
                    printer.line(&name, JobStatus::Retrying);
                    printer.logs_buffer.push(format!(
                        "{} {}: {}",
                        "Retried:".yellow(),
                        name.cyan(),
                        error
                    ));
                }
                SyncEvent::DownloadFinished { name, size_bytes } => {
                    printer.sizes.insert(name.clone(), size_bytes);
                    printer.line(&name, JobStatus::Downloaded);
                }
                SyncEvent::BackupCreated { path, entries } => {
                    println!(
                        "{} {} file(s) to {}",
                        "Backed up".bold(),
                        entries,
                        path.display()
                    );
                }
                SyncEvent::ArtifactCommitted { name, action } => {
                    let status = match action {
                        ArtifactAction::Install => JobStatus::Installed,
                        ArtifactAction::Upgrade => JobStatus::Upgraded,
                    };
                    printer.line(&name, status);
                }
                SyncEvent::ArtifactSkipped { name } => {
                    printer.line(&name, JobStatus::Kept);
                }
                SyncEvent::ArtifactFailed { name, error, .. } => {
                    printer.line(&name, JobStatus::Failed);
                    printer.logs_buffer.push(format!(
                        "{} {}: {}",
                        "✗".red().bold(),
                        name.cyan(),
                        error.red()
                    ));
                }
                SyncEvent::LogInfo { message } => {
                    printer.logs_buffer.push(message);
                }
                SyncEvent::LogWarn { message } => {
                    printer.logs_buffer.push(message.yellow().to_string());
                }
                SyncEvent::LogError { message } => {
                    printer.logs_buffer.push(message.red().to_string());
                }
                SyncEvent::RunFinished {
                    duration_secs,
                    success_count,
                    fail_count,
                } => {
                    println!();
                    println!(
                        "{} in {:.2}s ({} succeeded, {} failed)",
                        "Sync finished".bold(),
                        duration_secs,
                        success_count,
                        fail_count
                    );
                    if !printer.logs_buffer.is_empty() {
                        println!();
                        for log in &printer.logs_buffer {
                            println!("{log}");
                        }
                    }
                    break;
                }
            },
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
            Err(broadcast::error::RecvError::Lagged(_)) => {
                // Ignore lag for now
            }
        }
    }
}
