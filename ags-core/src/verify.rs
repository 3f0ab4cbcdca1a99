// ags-core/src/verify.rs
use std::collections::BTreeSet;
use std::path::Path;

use ags_common::error::Result;
use ags_common::model::ArtifactName;
use tracing::{debug, warn};

use crate::inventory;

/// Re-scans `agents_dir` and returns the mandatory names that are not installed.
pub fn verify_mandatory(
    agents_dir: &Path,
    mandatory: &BTreeSet<ArtifactName>,
) -> Result<BTreeSet<ArtifactName>> {
    let present = inventory::scan(agents_dir)?;
    let missing: BTreeSet<ArtifactName> = mandatory.difference(&present).cloned().collect();
    for name in &missing {
        warn!("Mandatory artifact '{}' is not installed", name);
    }
    debug!(
        "Verified {} mandatory artifacts, {} missing",
        mandatory.len(),
        missing.len()
    );
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_absent_names() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("sdlc-enforcer.md"), "x").unwrap();
        let mandatory: BTreeSet<String> = ["sdlc-enforcer", "solution-architect"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing = verify_mandatory(tmp.path(), &mandatory).unwrap();
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["solution-architect"]);
    }
}
