// ags-core/src/select/mod.rs
//! Profile-to-selection rules.
//!
//! A rule pairs a [`Predicate`] with a set of artifact names. Selection is the
//! union over every rule whose predicate holds; rules never short-circuit each
//! other, so their order only matters for `explain` output.

mod builtin;
pub mod predicate;

use std::collections::BTreeSet;
use std::path::Path;

use ags_common::error::{AgsError, Result};
use ags_common::model::{validate_name, ArtifactName, ProjectProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use builtin::default_rules;
pub use predicate::Predicate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRule {
    pub name: String,
    pub when: Predicate,
    pub artifacts: BTreeSet<ArtifactName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    rules: Vec<SelectionRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<SelectionRule>) -> Self {
        Self { rules }
    }

    pub fn builtin() -> Self {
        default_rules()
    }

    /// Parses a rule file:
    ///
    /// ```toml
    /// [[rules]]
    /// name = "core"
    /// when = "always"
    /// artifacts = ["sdlc-enforcer"]
    /// ```
    pub fn from_toml(raw: &str) -> Result<Self> {
        let set: RuleSet = toml::from_str(raw)?;
        for rule in &set.rules {
            for artifact in &rule.artifacts {
                validate_name(artifact).map_err(|_| {
                    AgsError::Config(format!(
                        "Rule '{}' names an invalid artifact {:?}",
                        rule.name, artifact
                    ))
                })?;
            }
        }
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading selection rules from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgsError::Config(format!("Failed to read rules {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn rules(&self) -> &[SelectionRule] {
        &self.rules
    }

    /// Union of all artifact sets whose predicate holds for `profile`.
    pub fn select(&self, profile: &ProjectProfile) -> BTreeSet<ArtifactName> {
        let selected: BTreeSet<ArtifactName> = self
            .explain(profile)
            .into_iter()
            .flat_map(|rule| rule.artifacts.iter().cloned())
            .collect();
        debug!(
            "Profile (type '{}') selects {} artifacts",
            profile.project_type,
            selected.len()
        );
        selected
    }

    /// Artifacts required regardless of profile.
    pub fn mandatory(&self) -> BTreeSet<ArtifactName> {
        self.rules
            .iter()
            .filter(|r| r.when.is_always())
            .flat_map(|r| r.artifacts.iter().cloned())
            .collect()
    }

    /// Rules that fire for `profile`, in declaration order.
    pub fn explain(&self, profile: &ProjectProfile) -> Vec<&SelectionRule> {
        self.rules
            .iter()
            .filter(|r| r.when.matches(profile))
            .collect()
    }
}

pub fn select(profile: &ProjectProfile, rules: &RuleSet) -> BTreeSet<ArtifactName> {
    rules.select(profile)
}
