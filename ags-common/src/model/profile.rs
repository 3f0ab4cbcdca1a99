// ags-common/src/model/profile.rs
use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgsError, Result};

/// Description of the target project, produced by the discovery dialogue (or by
/// command-line flags). Read-only input to selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    #[serde(rename = "type", default)]
    pub project_type: String,
    #[serde(default)]
    pub languages: BTreeSet<String>,
    #[serde(default)]
    pub pain_points: BTreeSet<String>,
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

impl ProjectProfile {
    pub fn new<L, P>(project_type: &str, languages: L, pain_points: P) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            project_type: project_type.to_string(),
            languages: languages.into_iter().map(|s| s.as_ref().to_string()).collect(),
            pain_points: pain_points
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
        }
        .normalized()
    }

    /// Lowercases and trims every attribute and drops empty values.
    pub fn normalized(self) -> Self {
        let clean = |set: BTreeSet<String>| {
            set.iter()
                .map(|s| normalize(s))
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            project_type: normalize(&self.project_type),
            languages: clean(self.languages),
            pain_points: clean(self.pain_points),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.project_type.is_empty() && self.languages.is_empty() && self.pain_points.is_empty()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let profile: ProjectProfile = toml::from_str(raw)?;
        Ok(profile.normalized())
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading project profile from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgsError::Config(format!(
                "Failed to read profile {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_values() {
        let p = ProjectProfile::new(" API ", ["Python", " "], ["Testing"]);
        assert_eq!(p.project_type, "api");
        assert_eq!(p.languages, BTreeSet::from(["python".to_string()]));
        assert_eq!(p.pain_points, BTreeSet::from(["testing".to_string()]));
    }

    #[test]
    fn parses_toml_profile() {
        let p = ProjectProfile::from_toml_str(
            r#"
type = "web"
languages = ["TypeScript", "python"]
pain_points = ["performance"]
"#,
        )
        .unwrap();
        assert_eq!(p.project_type, "web");
        assert!(p.languages.contains("typescript"));
        assert!(p.pain_points.contains("performance"));
    }

    #[test]
    fn empty_toml_is_empty_profile() {
        let p = ProjectProfile::from_toml_str("").unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ProjectProfile::from_toml_str("type = [1"),
            Err(AgsError::Toml(_))
        ));
    }
}
