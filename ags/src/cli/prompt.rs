// ags/src/cli/prompt.rs
use ags_core::UpgradeDecider;
use colored::Colorize;
use dialoguer::Confirm;
use tracing::debug;

/// Asks on the terminal whether to upgrade each candidate. Default answer is no;
/// an aborted prompt (Esc, closed stdin) counts as no answer.
#[derive(Debug, Default)]
pub struct ConfirmDecider;

impl UpgradeDecider for ConfirmDecider {
    fn decide(&mut self, name: &str) -> Option<bool> {
        let answer = Confirm::new()
            .with_prompt(format!(
                "A newer version of {} is available. Upgrade it (current file is backed up)?",
                name.cyan()
            ))
            .default(false)
            .interact_opt();
        match answer {
            Ok(choice) => choice,
            Err(e) => {
                debug!("Prompt for '{}' failed: {}", name, e);
                None
            }
        }
    }
}
