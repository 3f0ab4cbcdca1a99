use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MANDATORY: &[&str] = &[
    "sdlc-enforcer",
    "critical-goal-reviewer",
    "solution-architect",
    "devops-specialist",
    "github-integration-specialist",
];

/// A project root plus a file-based catalog offering the always-selected agents.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let core = dir.path().join("catalog").join("core");
        fs::create_dir_all(&core).unwrap();
        for name in MANDATORY {
            fs::write(core.join(format!("{name}.md")), format!("# {name}\n")).unwrap();
        }
        let entries: Vec<_> = MANDATORY
            .iter()
            .map(|name| serde_json::json!({"name": name}))
            .collect();
        let manifest = serde_json::json!({"version": "2.1", "categories": {"core": entries}});
        fs::write(self::Fixture::manifest_path(dir.path()), manifest.to_string()).unwrap();
        fs::create_dir_all(dir.path().join("project")).unwrap();
        Self { dir }
    }

    fn manifest_path(root: &Path) -> PathBuf {
        root.join("catalog").join("manifest.json")
    }

    fn project(&self) -> PathBuf {
        self.dir.path().join("project")
    }

    fn agents_dir(&self) -> PathBuf {
        self.project().join(".claude").join("agents")
    }

    fn ags(&self) -> Command {
        let mut cmd = Command::cargo_bin("ags").unwrap();
        cmd.env_clear()
            .env("AGS_PROJECT_ROOT", self.project())
            .env("AGS_CACHE_DIR", self.dir.path().join("cache"))
            .env(
                "AGS_MANIFEST_URL",
                Self::manifest_path(self.dir.path()).display().to_string(),
            );
        cmd
    }
}

#[test]
fn sync_installs_mandatory_agents() {
    let fx = Fixture::new();
    fx.ags()
        .args(["sync", "--keep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed"));

    for name in MANDATORY {
        let path = fx.agents_dir().join(format!("{name}.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), format!("# {name}\n"));
    }
}

#[test]
fn plan_writes_nothing() {
    let fx = Fixture::new();
    fx.ags()
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("sdlc-enforcer"));
    assert!(!fx.agents_dir().exists());
}

#[test]
fn sync_json_report_parses() {
    let fx = Fixture::new();
    let output = fx
        .ags()
        .args(["sync", "--keep", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["installed"].as_array().unwrap().len(), MANDATORY.len());
    assert!(report["fatal"].is_null());
}

#[test]
fn second_sync_reports_up_to_date() {
    let fx = Fixture::new();
    fx.ags().args(["sync", "--keep"]).assert().success();
    let output = fx
        .ags()
        .args(["sync", "--keep", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(report["installed"].as_array().unwrap().is_empty());
    assert_eq!(report["up_to_date"].as_array().unwrap().len(), MANDATORY.len());
}

#[test]
fn missing_manifest_aborts_without_writing() {
    let fx = Fixture::new();
    fs::remove_file(Fixture::manifest_path(fx.dir.path())).unwrap();
    fx.ags()
        .args(["sync", "--keep"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Sync aborted"));
    assert!(!fx.agents_dir().exists());
}

#[test]
fn unconfigured_manifest_is_an_error() {
    let fx = Fixture::new();
    fx.ags()
        .env_remove("AGS_MANIFEST_URL")
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AGS_MANIFEST_URL"));
}

#[test]
fn update_then_offline_sync() {
    let fx = Fixture::new();
    fx.ags()
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("Update completed successfully!"));

    // The catalog payloads are still reachable; only the manifest goes away.
    fs::remove_file(Fixture::manifest_path(fx.dir.path())).unwrap();
    fx.ags()
        .args(["sync", "--keep", "--offline"])
        .assert()
        .success();
    assert!(fx.agents_dir().join("sdlc-enforcer.md").exists());
}

#[test]
fn yes_and_keep_conflict() {
    let fx = Fixture::new();
    fx.ags()
        .args(["sync", "--yes", "--keep"])
        .assert()
        .failure();
}

#[test]
fn list_shows_custom_agents() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.agents_dir()).unwrap();
    fs::write(fx.agents_dir().join("my-helper.md"), "# mine\n").unwrap();
    fx.ags()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("my-helper"))
        .stdout(predicate::str::contains("1 agents installed"));
}

#[test]
fn update_fails_when_cache_cannot_be_written() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.dir.path().join("cache").join("manifest.json")).unwrap();
    fx.ags()
        .arg("update")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Update completed successfully!").not());
}
