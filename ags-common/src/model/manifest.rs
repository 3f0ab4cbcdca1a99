// ags-common/src/model/manifest.rs
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactName;
use crate::error::{AgsError, Result};

/// One installable artifact offered by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub category: String,
    pub name: ArtifactName,
    /// Retrieval path as written in the catalog; may be relative.
    pub path: String,
    pub description: Option<String>,
    /// Opaque catalog signal; there is no version ordering behind it.
    pub has_newer_version: bool,
}

/// The parsed catalog: entries in document order, keyed uniquely by name.
/// Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    source: String,
    base_url: Option<String>,
    version: Option<String>,
    entries: Vec<ManifestEntry>,
    index: HashMap<ArtifactName, usize>,
}

impl Manifest {
    pub fn new(
        source: impl Into<String>,
        base_url: Option<String>,
        version: Option<String>,
        entries: Vec<ManifestEntry>,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if let Some(prev) = index.insert(entry.name.clone(), i) {
                return Err(AgsError::ManifestParse(format!(
                    "artifact '{}' is listed twice (categories '{}' and '{}')",
                    entry.name, entries[prev].category, entry.category
                )));
            }
        }
        Ok(Self {
            source: source.into(),
            base_url,
            version,
            entries,
            index,
        })
    }

    /// Location the document was fetched from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> BTreeSet<ArtifactName> {
        self.index.keys().cloned().collect()
    }

    /// Names not in the catalog never have a newer version.
    pub fn has_newer_version(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.has_newer_version)
    }

    /// Category names in document order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(&entry.category);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, name: &str, newer: bool) -> ManifestEntry {
        ManifestEntry {
            category: category.into(),
            name: name.into(),
            path: format!("{category}/{name}.md"),
            description: None,
            has_newer_version: newer,
        }
    }

    #[test]
    fn lookups_by_name() {
        let m = Manifest::new(
            "file:///m.json",
            None,
            Some("1.0".into()),
            vec![entry("core", "a", true), entry("testing", "b", false)],
        )
        .unwrap();
        assert_eq!(m.len(), 2);
        assert!(m.contains("a"));
        assert!(m.has_newer_version("a"));
        assert!(!m.has_newer_version("b"));
        assert!(!m.has_newer_version("missing"));
        assert_eq!(m.categories(), vec!["core", "testing"]);
        assert_eq!(m.get("b").unwrap().category, "testing");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Manifest::new(
            "file:///m.json",
            None,
            None,
            vec![entry("core", "a", false), entry("other", "a", false)],
        )
        .unwrap_err();
        assert!(matches!(err, AgsError::ManifestParse(_)));
    }
}
