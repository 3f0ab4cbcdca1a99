// ags/src/cli/report.rs
use std::collections::BTreeSet;

use ags_core::SyncReport;
use colored::{ColoredString, Colorize};

fn section(title: ColoredString, names: &BTreeSet<String>) {
    if names.is_empty() {
        return;
    }
    println!("{} ({})", title, names.len());
    for name in names {
        println!("  {name}");
    }
}

/// Console summary of a finished run.
pub fn print_report(report: &SyncReport) {
    if let Some(fatal) = &report.fatal {
        println!("{} {}", "Sync aborted:".red().bold(), fatal);
        println!("No files were changed.");
        return;
    }

    println!();
    section("Installed".green().bold(), &report.installed);
    section("Upgraded".magenta().bold(), &report.upgraded);
    section("Kept as is".bold(), &report.kept_as_is);
    section("Up to date".dimmed(), &report.up_to_date);
    section("Custom (preserved)".blue(), &report.custom_preserved);

    if !report.failed.is_empty() {
        println!("{} ({})", "Failed".red().bold(), report.failed.len());
        for (name, reason) in &report.failed {
            println!("  {} {}", name, format!("({reason})").red());
        }
    }
    section("Not in catalog".yellow(), &report.unresolved);
    section("Missing mandatory".red().bold(), &report.missing_mandatory);

    if let Some(backup) = &report.backup {
        println!("{} {}", "Backup:".bold(), backup.display());
    }
}

pub fn print_json(report: &SyncReport) -> ags_common::Result<()> {
    println!("{}", report.to_json()?);
    Ok(())
}
