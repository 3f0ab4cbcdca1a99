// ags-core/src/manifest.rs
//! Parses the catalog document and resolves artifact names to retrieval
//! locations.

use std::collections::{BTreeMap, BTreeSet};

use ags_common::error::{AgsError, Result};
use ags_common::model::{validate_name, ArtifactName, Manifest, ManifestEntry};
use ags_net::Location;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    categories: Option<Map<String, Value>>,
    #[serde(default)]
    agents: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCategoryEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, alias = "has_newer_version")]
        updated: Option<bool>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawAgentRecord {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "has_newer_version")]
    updated: Option<bool>,
}

fn parse_err(msg: impl Into<String>) -> AgsError {
    AgsError::ManifestParse(msg.into())
}

fn checked_name(name: &str, context: &str) -> Result<()> {
    validate_name(name).map_err(|_| parse_err(format!("invalid artifact name {name:?} in {context}")))
}

/// Parses a catalog document. `source` is recorded on the manifest for
/// diagnostics and relative path resolution.
pub fn parse_manifest(raw: &str, source: &str) -> Result<Manifest> {
    let doc: RawManifest =
        serde_json::from_str(raw).map_err(|e| parse_err(format!("{source}: {e}")))?;

    if doc.categories.is_none() && doc.agents.is_none() {
        return Err(parse_err(format!(
            "{source}: document has neither 'categories' nor 'agents'"
        )));
    }

    let mut entries: Vec<ManifestEntry> = Vec::new();

    for (category, list) in doc.categories.unwrap_or_default() {
        let items: Vec<RawCategoryEntry> = serde_json::from_value(list).map_err(|e| {
            parse_err(format!("category '{category}' must be a list of agents: {e}"))
        })?;
        for item in items {
            let entry = match item {
                RawCategoryEntry::Name(name) => {
                    checked_name(&name, &format!("category '{category}'"))?;
                    ManifestEntry {
                        path: format!("{category}/{name}.md"),
                        category: category.clone(),
                        name,
                        description: None,
                        has_newer_version: false,
                    }
                }
                RawCategoryEntry::Detailed {
                    name,
                    path,
                    description,
                    updated,
                } => {
                    checked_name(&name, &format!("category '{category}'"))?;
                    ManifestEntry {
                        path: path.unwrap_or_else(|| format!("{category}/{name}.md")),
                        category: category.clone(),
                        name,
                        description,
                        has_newer_version: updated.unwrap_or(false),
                    }
                }
            };
            entries.push(entry);
        }
    }

    for (name, value) in doc.agents.unwrap_or_default() {
        checked_name(&name, "agents table")?;
        let record: RawAgentRecord = serde_json::from_value(value)
            .map_err(|e| parse_err(format!("agents table entry '{name}': {e}")))?;
        match entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => {
                if let Some(path) = record.path {
                    existing.path = path;
                }
                if record.description.is_some() {
                    existing.description = record.description;
                }
                if let Some(updated) = record.updated {
                    existing.has_newer_version = updated;
                }
            }
            None => {
                let path = record.path.ok_or_else(|| {
                    parse_err(format!(
                        "agents table entry '{name}' has no category and no path"
                    ))
                })?;
                entries.push(ManifestEntry {
                    category: UNCATEGORIZED.to_string(),
                    name,
                    path,
                    description: record.description,
                    has_newer_version: record.updated.unwrap_or(false),
                });
            }
        }
    }

    if let Some(empty) = entries.iter().find(|e| e.path.trim().is_empty()) {
        return Err(parse_err(format!("artifact '{}' has an empty path", empty.name)));
    }

    let manifest = Manifest::new(source, doc.base_url, doc.version, entries)?;
    debug!(
        "Parsed manifest from {}: {} artifacts in {} categories",
        source,
        manifest.len(),
        manifest.categories().len()
    );
    Ok(manifest)
}

/// Result of resolving the selected names against the catalog.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSelection {
    pub locations: BTreeMap<ArtifactName, Location>,
    /// Selected names the catalog does not offer (`UnresolvedSelection`).
    pub unresolved: BTreeSet<ArtifactName>,
}

/// Maps catalog names to retrieval locations. `manifest_location` is where the
/// document itself came from; relative paths resolve against `base_url` when
/// present, else against the document. A remote document may only point at
/// remote payloads.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    base: Location,
    remote: bool,
}

impl ManifestResolver {
    pub fn new(manifest: &Manifest, manifest_location: &Location) -> Result<Self> {
        let base = match manifest.base_url() {
            Some(base_url) => {
                let dir = if base_url.ends_with('/') {
                    base_url.to_string()
                } else {
                    format!("{base_url}/")
                };
                manifest_location
                    .join(&dir)
                    .map_err(|e| parse_err(format!("invalid base_url '{base_url}': {e}")))?
            }
            None => manifest_location.clone(),
        };
        debug!("Resolving artifact paths against {}", base);
        Ok(Self {
            base,
            remote: !manifest_location.is_local(),
        })
    }

    pub fn location_for(&self, entry: &ManifestEntry) -> Result<Location> {
        let location = self.base.join(&entry.path)?;
        if self.remote && location.is_local() {
            return Err(AgsError::ValidationError(format!(
                "remote catalog may not reference local file '{}' for '{}'",
                location, entry.name
            )));
        }
        Ok(location)
    }

    /// Resolves every selected name. Names missing from the catalog, or whose
    /// path cannot be resolved, are reported as unresolved; the rest proceed.
    pub fn resolve(
        &self,
        manifest: &Manifest,
        selected: &BTreeSet<ArtifactName>,
    ) -> ResolvedSelection {
        let mut resolved = ResolvedSelection::default();
        for name in selected {
            match manifest.get(name) {
                Some(entry) => match self.location_for(entry) {
                    Ok(location) => {
                        resolved.locations.insert(name.clone(), location);
                    }
                    Err(e) => {
                        warn!("Cannot resolve path for '{}': {}", name, e);
                        resolved.unresolved.insert(name.clone());
                    }
                },
                None => {
                    debug!("Selected artifact '{}' is not offered by the catalog", name);
                    resolved.unresolved.insert(name.clone());
                }
            }
        }
        resolved
    }
}
