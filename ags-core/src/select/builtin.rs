// ags-core/src/select/builtin.rs
use super::predicate::Predicate;
use super::{RuleSet, SelectionRule};

fn rule(name: &str, when: Predicate, artifacts: &[&str]) -> SelectionRule {
    SelectionRule {
        name: name.to_string(),
        when,
        artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
    }
}

fn any_type(types: &[&str]) -> Predicate {
    Predicate::AnyOf(types.iter().map(|t| Predicate::project_type(t)).collect())
}

fn any_language(langs: &[&str]) -> Predicate {
    Predicate::AnyOf(langs.iter().map(|l| Predicate::language(l)).collect())
}

/// Default rule set shipped with ags.
pub fn default_rules() -> RuleSet {
    use Predicate::Always;

    RuleSet::new(vec![
        rule(
            "core",
            Always,
            &["sdlc-enforcer", "critical-goal-reviewer", "solution-architect"],
        ),
        rule(
            "pipeline",
            Always,
            &["devops-specialist", "github-integration-specialist"],
        ),
        // project type
        rule(
            "type-api",
            Predicate::project_type("api"),
            &["api-architect", "backend-engineer"],
        ),
        rule(
            "type-web",
            Predicate::project_type("web"),
            &["frontend-engineer", "ux-ui-architect"],
        ),
        rule(
            "type-cli",
            Predicate::project_type("cli"),
            &["cli-design-specialist"],
        ),
        rule(
            "type-library",
            Predicate::project_type("library"),
            &["api-architect", "documentation-architect"],
        ),
        rule(
            "type-mobile",
            Predicate::project_type("mobile"),
            &["mobile-architect"],
        ),
        rule(
            "type-data",
            any_type(&["data", "ml"]),
            &["data-architect", "ai-solution-architect"],
        ),
        // language
        rule(
            "language-python",
            Predicate::language("python"),
            &["python-expert"],
        ),
        rule(
            "language-javascript",
            any_language(&["javascript", "typescript"]),
            &["javascript-expert"],
        ),
        rule("language-rust", Predicate::language("rust"), &["rust-expert"]),
        rule("language-go", Predicate::language("go"), &["go-expert"]),
        // pain points
        rule(
            "pain-testing",
            Predicate::pain_point("testing"),
            &["ai-test-engineer", "integration-orchestrator"],
        ),
        rule(
            "pain-performance",
            Predicate::pain_point("performance"),
            &["performance-engineer"],
        ),
        rule(
            "pain-security",
            Predicate::pain_point("security"),
            &["security-specialist"],
        ),
        rule(
            "pain-documentation",
            Predicate::pain_point("documentation"),
            &["technical-writer"],
        ),
        rule(
            "pain-deployment",
            Predicate::pain_point("deployment"),
            &["devops-specialist", "sre-specialist"],
        ),
        rule(
            "pain-architecture",
            Predicate::pain_point("architecture"),
            &["solution-architect", "delivery-manager"],
        ),
    ])
}
