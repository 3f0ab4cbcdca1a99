// ags-core/src/classify.rs
use std::collections::BTreeSet;

use ags_common::model::{ArtifactName, Manifest};
use serde::Serialize;
use tracing::debug;

/// Disjoint split of `selected ∪ local`.
///
/// `custom` holds every local file the run must not touch: names that are not
/// selected, and selected names the catalog does not offer. `unresolved` holds
/// selected names that exist neither in the catalog nor on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationBuckets {
    pub new_install: BTreeSet<ArtifactName>,
    pub upgrade_candidate: BTreeSet<ArtifactName>,
    pub up_to_date: BTreeSet<ArtifactName>,
    pub custom: BTreeSet<ArtifactName>,
    pub unresolved: BTreeSet<ArtifactName>,
}

impl ClassificationBuckets {
    pub fn total(&self) -> usize {
        self.new_install.len()
            + self.upgrade_candidate.len()
            + self.up_to_date.len()
            + self.custom.len()
            + self.unresolved.len()
    }

    /// Which bucket `name` landed in, if any.
    pub fn bucket_of(&self, name: &str) -> Option<&'static str> {
        if self.new_install.contains(name) {
            Some("new")
        } else if self.upgrade_candidate.contains(name) {
            Some("upgradable")
        } else if self.up_to_date.contains(name) {
            Some("up to date")
        } else if self.custom.contains(name) {
            Some("custom")
        } else if self.unresolved.contains(name) {
            Some("unresolved")
        } else {
            None
        }
    }
}

/// Three-way diff of the selection, the local inventory and the catalog's domain.
pub fn classify<F>(
    selected: &BTreeSet<ArtifactName>,
    local: &BTreeSet<ArtifactName>,
    offered: &BTreeSet<ArtifactName>,
    has_newer: F,
) -> ClassificationBuckets
where
    F: Fn(&str) -> bool,
{
    let mut buckets = ClassificationBuckets::default();

    for name in selected {
        match (offered.contains(name), local.contains(name)) {
            (true, false) => {
                buckets.new_install.insert(name.clone());
            }
            (true, true) => {
                if has_newer(name) {
                    buckets.upgrade_candidate.insert(name.clone());
                } else {
                    buckets.up_to_date.insert(name.clone());
                }
            }
            (false, true) => {
                buckets.custom.insert(name.clone());
            }
            (false, false) => {
                buckets.unresolved.insert(name.clone());
            }
        }
    }
    buckets.custom.extend(local.difference(selected).cloned());

    debug!(
        "Classified: {} new, {} upgradable, {} up to date, {} custom, {} unresolved",
        buckets.new_install.len(),
        buckets.upgrade_candidate.len(),
        buckets.up_to_date.len(),
        buckets.custom.len(),
        buckets.unresolved.len()
    );
    buckets
}

pub fn classify_against(
    selected: &BTreeSet<ArtifactName>,
    local: &BTreeSet<ArtifactName>,
    manifest: &Manifest,
) -> ClassificationBuckets {
    classify(selected, local, &manifest.names(), |name| {
        manifest.has_newer_version(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assert_partition(b: &ClassificationBuckets, selected: &BTreeSet<String>, local: &BTreeSet<String>) {
        let universe: BTreeSet<String> = selected.union(local).cloned().collect();
        let mut seen = BTreeSet::new();
        for bucket in [
            &b.new_install,
            &b.upgrade_candidate,
            &b.up_to_date,
            &b.custom,
            &b.unresolved,
        ] {
            for name in bucket {
                assert!(seen.insert(name.clone()), "{name} is in two buckets");
            }
        }
        assert_eq!(seen, universe);
        assert_eq!(b.total(), universe.len());
    }

    #[test]
    fn splits_every_case() {
        let selected = set(&["new", "stale", "fresh", "selected-custom", "ghost"]);
        let local = set(&["stale", "fresh", "selected-custom", "mine"]);
        let offered = set(&["new", "stale", "fresh", "other"]);
        let b = classify(&selected, &local, &offered, |n| n == "stale");

        assert_eq!(b.new_install, set(&["new"]));
        assert_eq!(b.upgrade_candidate, set(&["stale"]));
        assert_eq!(b.up_to_date, set(&["fresh"]));
        assert_eq!(b.custom, set(&["mine", "selected-custom"]));
        assert_eq!(b.unresolved, set(&["ghost"]));
        assert_partition(&b, &selected, &local);
        assert_eq!(b.bucket_of("mine"), Some("custom"));
        assert_eq!(b.bucket_of("other"), None);
    }

    #[test]
    fn partition_holds_for_mixed_inputs() {
        let offered = set(&["a", "b", "c", "d"]);
        let cases = [
            (set(&[]), set(&[])),
            (set(&["a", "b"]), set(&[])),
            (set(&[]), set(&["a", "x"])),
            (set(&["a", "b", "y"]), set(&["b", "c", "y", "z"])),
            (set(&["a", "b", "c", "d"]), set(&["a", "b", "c", "d"])),
        ];
        for (selected, local) in &cases {
            let b = classify(selected, local, &offered, |n| n == "b" || n == "c");
            assert_partition(&b, selected, local);
            let unselected: BTreeSet<String> = local.difference(selected).cloned().collect();
            assert!(b.custom.is_superset(&unselected));
        }
    }

    #[test]
    fn newer_flag_only_matters_for_overlap() {
        let b = classify(&set(&["a"]), &set(&[]), &set(&["a"]), |_| true);
        assert_eq!(b.new_install, set(&["a"]));
        assert!(b.upgrade_candidate.is_empty());
    }
}
