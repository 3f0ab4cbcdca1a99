// ags-core/src/select/predicate.rs
use ags_common::model::ProjectProfile;
use serde::{Deserialize, Serialize};

/// Condition over a [`ProjectProfile`]. Kept as data so rule sets can be loaded
/// from TOML and printed by `ags plan`.
///
/// In TOML a predicate is either the string `"always"` or a one-key table such as
/// `{ language = "python" }` or `{ any_of = [{ project_type = "web" }, { project_type = "api" }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Always,
    #[serde(alias = "type")]
    ProjectType(String),
    Language(String),
    PainPoint(String),
    AnyOf(Vec<Predicate>),
    AllOf(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn matches(&self, profile: &ProjectProfile) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::ProjectType(t) => eq_normalized(&profile.project_type, t),
            Predicate::Language(l) => profile.languages.iter().any(|p| eq_normalized(p, l)),
            Predicate::PainPoint(p) => profile.pain_points.iter().any(|x| eq_normalized(x, p)),
            Predicate::AnyOf(preds) => preds.iter().any(|p| p.matches(profile)),
            Predicate::AllOf(preds) => preds.iter().all(|p| p.matches(profile)),
            Predicate::Not(inner) => !inner.matches(profile),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    pub fn project_type(t: &str) -> Self {
        Predicate::ProjectType(t.to_string())
    }

    pub fn language(l: &str) -> Self {
        Predicate::Language(l.to_string())
    }

    pub fn pain_point(p: &str) -> Self {
        Predicate::PainPoint(p.to_string())
    }
}

fn eq_normalized(have: &str, want: &str) -> bool {
    have.trim().eq_ignore_ascii_case(want.trim())
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |preds: &[Predicate], sep: &str| {
            preds
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self {
            Predicate::Always => write!(f, "always"),
            Predicate::ProjectType(t) => write!(f, "type = {t}"),
            Predicate::Language(l) => write!(f, "language = {l}"),
            Predicate::PainPoint(p) => write!(f, "pain point = {p}"),
            Predicate::AnyOf(preds) => write!(f, "({})", join(preds, " or ")),
            Predicate::AllOf(preds) => write!(f, "({})", join(preds, " and ")),
            Predicate::Not(inner) => write!(f, "not {inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ProjectProfile {
        ProjectProfile::new("API", ["Python", "rust"], ["testing"])
    }

    #[test]
    fn leaf_predicates() {
        let p = profile();
        assert!(Predicate::Always.matches(&p));
        assert!(Predicate::project_type("api").matches(&p));
        assert!(!Predicate::project_type("web").matches(&p));
        assert!(Predicate::language("python").matches(&p));
        assert!(Predicate::pain_point("Testing").matches(&p));
        assert!(!Predicate::pain_point("security").matches(&p));
    }

    #[test]
    fn combinators() {
        let p = profile();
        let any = Predicate::AnyOf(vec![Predicate::language("go"), Predicate::language("rust")]);
        let all = Predicate::AllOf(vec![Predicate::project_type("api"), Predicate::language("go")]);
        assert!(any.matches(&p));
        assert!(!all.matches(&p));
        assert!(Predicate::Not(Box::new(all)).matches(&p));
        assert!(!Predicate::AnyOf(vec![]).matches(&p));
        assert!(Predicate::AllOf(vec![]).matches(&p));
    }

    #[test]
    fn display_is_readable() {
        let p = Predicate::AnyOf(vec![
            Predicate::language("javascript"),
            Predicate::language("typescript"),
        ]);
        assert_eq!(p.to_string(), "(language = javascript or language = typescript)");
    }
}
