// ags-core/src/resolution.rs
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use ags_common::error::AgsError;
use ags_common::model::ArtifactName;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How upgrade candidates are approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Upgrade every candidate.
    All,
    /// Keep every candidate as it is.
    #[default]
    None,
    /// Ask the decider once per candidate.
    PerItem,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::All => write!(f, "all"),
            ResolutionMode::None => write!(f, "none"),
            ResolutionMode::PerItem => write!(f, "per-item"),
        }
    }
}

impl FromStr for ResolutionMode {
    type Err = AgsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ResolutionMode::All),
            "none" => Ok(ResolutionMode::None),
            "per-item" | "peritem" | "ask" => Ok(ResolutionMode::PerItem),
            other => Err(AgsError::ValidationError(format!(
                "Unknown resolution mode '{other}'"
            ))),
        }
    }
}

/// Source of per-item upgrade dispositions. `None` means no answer, which is
/// treated as a decline.
pub trait UpgradeDecider {
    fn decide(&mut self, name: &str) -> Option<bool>;
}

/// Answers every question the same way. `FixedDecider(None)` models a user who
/// never responds.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecider(pub Option<bool>);

impl UpgradeDecider for FixedDecider {
    fn decide(&mut self, _name: &str) -> Option<bool> {
        self.0
    }
}

impl<F> UpgradeDecider for F
where
    F: FnMut(&str) -> Option<bool>,
{
    fn decide(&mut self, name: &str) -> Option<bool> {
        self(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub approved: BTreeSet<ArtifactName>,
    pub declined: BTreeSet<ArtifactName>,
}

/// Splits `candidates` into approved and declined. Touches nothing on disk.
pub fn resolve(
    candidates: &BTreeSet<ArtifactName>,
    mode: ResolutionMode,
    decider: &mut dyn UpgradeDecider,
) -> Resolution {
    let mut resolution = Resolution::default();
    for name in candidates {
        let approve = match mode {
            ResolutionMode::All => true,
            ResolutionMode::None => false,
            ResolutionMode::PerItem => decider.decide(name).unwrap_or(false),
        };
        if approve {
            resolution.approved.insert(name.clone());
        } else {
            resolution.declined.insert(name.clone());
        }
    }
    debug!(
        "Resolution ({}): {} approved, {} declined",
        mode,
        resolution.approved.len(),
        resolution.declined.len()
    );
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bulk_modes_ignore_decider() {
        let candidates = set(&["a", "b"]);
        let mut never_called = |_: &str| -> Option<bool> { panic!("decider must not be asked") };
        let all = resolve(&candidates, ResolutionMode::All, &mut never_called);
        assert_eq!(all.approved, candidates);
        let none = resolve(&candidates, ResolutionMode::None, &mut never_called);
        assert_eq!(none.declined, candidates);
        assert!(none.approved.is_empty());
    }

    #[test]
    fn per_item_asks_in_name_order() {
        let candidates = set(&["zeta", "alpha", "mid"]);
        let mut asked = Vec::new();
        let mut decider = |name: &str| {
            asked.push(name.to_string());
            match name {
                "alpha" => Some(true),
                "mid" => None,
                _ => Some(false),
            }
        };
        let r = resolve(&candidates, ResolutionMode::PerItem, &mut decider);
        assert_eq!(asked, vec!["alpha", "mid", "zeta"]);
        assert_eq!(r.approved, set(&["alpha"]));
        assert_eq!(r.declined, set(&["mid", "zeta"]));
    }

    #[test]
    fn silent_decider_declines_everything() {
        let candidates = set(&["a"]);
        let r = resolve(&candidates, ResolutionMode::PerItem, &mut FixedDecider(None));
        assert!(r.approved.is_empty());
        assert!(r.approved.is_subset(&candidates));
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("ALL".parse::<ResolutionMode>().unwrap(), ResolutionMode::All);
        assert_eq!("per-item".parse::<ResolutionMode>().unwrap(), ResolutionMode::PerItem);
        assert!("sometimes".parse::<ResolutionMode>().is_err());
    }
}
