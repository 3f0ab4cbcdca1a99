// ags-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{AgsError, Result};

const DEFAULT_AGENTS_SUBDIR: &str = ".claude/agents";
const DEFAULT_MAX_CONCURRENCY: usize = 4;
const CACHE_DIR_NAME: &str = "ags";

#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    pub agents_dir: PathBuf,
    pub manifest_location: Option<String>,
    pub cache_dir: PathBuf,
    pub concurrency: usize,
    pub allow_http: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading ags configuration");
        Self::load_from(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source. `load` passes the
    /// process environment.
    pub fn load_from<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let project_root = match var("AGS_PROJECT_ROOT") {
            Some(root) => PathBuf::from(root),
            None => env::current_dir().map_err(|e| {
                AgsError::Config(format!("Could not determine current directory: {e}"))
            })?,
        };
        debug!("Effective project root: {}", project_root.display());

        let agents_dir = var("AGS_AGENTS_DIR")
            .map(PathBuf::from)
            .map(|p| {
                if p.is_absolute() {
                    p
                } else {
                    project_root.join(p)
                }
            })
            .unwrap_or_else(|| project_root.join(DEFAULT_AGENTS_SUBDIR));

        let manifest_location = var("AGS_MANIFEST_URL");

        let cache_dir = var("AGS_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::cache_dir().map(|d| d.join(CACHE_DIR_NAME)))
            .unwrap_or_else(|| project_root.join(".ags").join("cache"));

        let concurrency = match var("AGS_CONCURRENCY") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                AgsError::Config(format!("AGS_CONCURRENCY must be a number, got '{raw}': {e}"))
            })?,
            None => default_concurrency(),
        }
        .max(1);

        let allow_http = var("AGS_ALLOW_HTTP").is_some_and(|v| v == "1" || v == "true");

        debug!("Configuration loaded successfully.");
        Ok(Self {
            project_root,
            agents_dir,
            manifest_location,
            cache_dir,
            concurrency,
            allow_http,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn agents_dir(&self) -> &Path {
        &self.agents_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.cache_dir.join("logs")
    }

    /// Directory that receives backup snapshots: the parent of the agents dir, so
    /// snapshots sit next to it.
    pub fn backup_root(&self) -> PathBuf {
        self.agents_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.project_root.clone())
    }

    /// Stem used for backup directory names, e.g. `agents` for `.claude/agents`.
    pub fn agents_dir_name(&self) -> String {
        self.agents_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "agents".to_string())
    }

    pub fn manifest_location(&self) -> Result<&str> {
        self.manifest_location.as_deref().ok_or_else(|| {
            AgsError::Config(
                "No manifest location configured; set AGS_MANIFEST_URL or pass --manifest"
                    .to_string(),
            )
        })
    }

    pub fn with_agents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.agents_dir = if dir.is_absolute() {
            dir
        } else {
            self.project_root.join(dir)
        };
        self
    }

    pub fn with_manifest_location(mut self, location: impl Into<String>) -> Self {
        self.manifest_location = Some(location.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

fn default_concurrency() -> usize {
    num_cpus::get_physical().clamp(1, DEFAULT_MAX_CONCURRENCY)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_derive_from_project_root() {
        let cfg = Config::load_from(lookup(&[
            ("AGS_PROJECT_ROOT", "/work/proj"),
            ("AGS_CACHE_DIR", "/tmp/ags-cache"),
        ]))
        .unwrap();
        assert_eq!(cfg.agents_dir(), Path::new("/work/proj/.claude/agents"));
        assert_eq!(cfg.backup_root(), PathBuf::from("/work/proj/.claude"));
        assert_eq!(cfg.agents_dir_name(), "agents");
        assert_eq!(cfg.logs_dir(), PathBuf::from("/tmp/ags-cache/logs"));
        assert!(cfg.concurrency >= 1);
        assert!(!cfg.allow_http);
        assert!(cfg.manifest_location().is_err());
    }

    #[test]
    fn relative_agents_dir_is_joined_to_root() {
        let cfg = Config::load_from(lookup(&[
            ("AGS_PROJECT_ROOT", "/work/proj"),
            ("AGS_AGENTS_DIR", "agents"),
            ("AGS_MANIFEST_URL", "https://example.com/m.json"),
            ("AGS_ALLOW_HTTP", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.agents_dir(), Path::new("/work/proj/agents"));
        assert_eq!(cfg.manifest_location().unwrap(), "https://example.com/m.json");
        assert!(cfg.allow_http);
    }

    #[test]
    fn bad_concurrency_is_a_config_error() {
        let err = Config::load_from(lookup(&[
            ("AGS_PROJECT_ROOT", "/work/proj"),
            ("AGS_CONCURRENCY", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AgsError::Config(_)));
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let cfg = Config::load_from(lookup(&[
            ("AGS_PROJECT_ROOT", "/work/proj"),
            ("AGS_CONCURRENCY", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.with_concurrency(0).concurrency, 1);
    }
}
