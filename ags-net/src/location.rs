// ags-net/src/location.rs
use std::fmt;
use std::path::{Path, PathBuf};

use ags_common::error::{AgsError, Result};
use url::Url;

/// Where a manifest or payload lives. Filesystem paths are carried as `file://`
/// URLs so that relative catalog paths join the same way for both kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Accepts `https://`, `http://` and `file://` URLs, or a filesystem path.
    /// A path ending in `/` is treated as a directory.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AgsError::ValidationError("empty location".to_string()));
        }
        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" | "file" => Ok(Self { url }),
                other => Err(AgsError::ValidationError(format!(
                    "Unsupported scheme '{other}' in location '{raw}'"
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Self::from_path(Path::new(raw)),
            Err(e) => Err(AgsError::ValidationError(format!(
                "Failed to parse location '{raw}': {e}"
            ))),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let is_dir_like = path.as_os_str().to_string_lossy().ends_with('/');
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| AgsError::IoError(format!("current directory unavailable: {e}")))?
                .join(path)
        };
        let url = if is_dir_like {
            Url::from_directory_path(&absolute)
        } else {
            Url::from_file_path(&absolute)
        }
        .map_err(|_| {
            AgsError::ValidationError(format!(
                "Path '{}' cannot be expressed as a location",
                absolute.display()
            ))
        })?;
        Ok(Self { url })
    }

    /// Resolves `reference` against this location with URL semantics: a trailing
    /// `/` marks a directory, otherwise the last segment is replaced. Absolute
    /// references pass through unchanged.
    pub fn join(&self, reference: &str) -> Result<Self> {
        let url = self.url.join(reference.trim()).map_err(|e| {
            AgsError::ValidationError(format!(
                "Cannot resolve '{}' against '{}': {}",
                reference, self.url, e
            ))
        })?;
        match url.scheme() {
            "http" | "https" | "file" => Ok(Self { url }),
            other => Err(AgsError::ValidationError(format!(
                "Unsupported scheme '{other}' in '{reference}'"
            ))),
        }
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn is_local(&self) -> bool {
        self.url.scheme() == "file"
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.is_local() {
            self.url.to_file_path().ok()
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_and_local() {
        let remote = Location::parse("https://example.com/catalog/manifest.json").unwrap();
        assert!(!remote.is_local());
        assert_eq!(remote.scheme(), "https");

        let local = Location::parse("/srv/catalog/manifest.json").unwrap();
        assert!(local.is_local());
        assert_eq!(
            local.to_file_path().unwrap(),
            PathBuf::from("/srv/catalog/manifest.json")
        );
    }

    #[test]
    fn rejects_unknown_schemes() {
        assert!(Location::parse("ftp://example.com/m.json").is_err());
        assert!(Location::parse("   ").is_err());
    }

    #[test]
    fn joins_relative_paths_against_document() {
        let base = Location::parse("https://example.com/catalog/manifest.json").unwrap();
        let joined = base.join("core/sdlc-enforcer.md").unwrap();
        assert_eq!(
            joined.as_str(),
            "https://example.com/catalog/core/sdlc-enforcer.md"
        );

        let dir = Location::parse("https://cdn.example.com/agents/").unwrap();
        assert_eq!(
            dir.join("x.md").unwrap().as_str(),
            "https://cdn.example.com/agents/x.md"
        );
    }

    #[test]
    fn absolute_references_pass_through() {
        let base = Location::parse("/srv/catalog/manifest.json").unwrap();
        let joined = base.join("https://other.example/a.md").unwrap();
        assert_eq!(joined.as_str(), "https://other.example/a.md");
    }

    #[test]
    fn local_join_stays_local() {
        let base = Location::parse("/srv/catalog/manifest.json").unwrap();
        let joined = base.join("core/a.md").unwrap();
        assert_eq!(
            joined.to_file_path().unwrap(),
            PathBuf::from("/srv/catalog/core/a.md")
        );
    }
}
