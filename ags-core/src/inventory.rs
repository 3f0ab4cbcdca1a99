// ags-core/src/inventory.rs
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use ags_common::error::{AgsError, Result};
use ags_common::model::{ArtifactName, ARTIFACT_EXTENSION};
use tracing::{debug, warn};

/// Lists the artifact names installed in `dir`: direct children that are regular
/// `.md` files, keyed by file stem. A missing directory is an empty inventory.
pub fn scan(dir: &Path) -> Result<BTreeSet<ArtifactName>> {
    let mut names = BTreeSet::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Artifact directory {} does not exist yet", dir.display());
            return Ok(names);
        }
        Err(e) => return Err(AgsError::Io(Arc::new(e))),
    };

    for entry_res in entries {
        let entry = match entry_res {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };
        // Symlinks to regular files count as installed.
        let is_file = file_type.is_file()
            || (file_type.is_symlink() && path.metadata().map(|m| m.is_file()).unwrap_or(false));
        if !is_file {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!("Skipping non UTF-8 file name {}", path.display());
            continue;
        };
        if stem.is_empty() || stem.starts_with('.') {
            continue;
        }
        names.insert(stem.to_string());
    }

    debug!("Found {} installed artifacts in {}", names.len(), dir.display());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn lists_markdown_stems_only() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("sdlc-enforcer.md"), "x").unwrap();
        fs::write(dir.join("my-custom-helper.md"), "x").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();
        fs::write(dir.join(".hidden.md"), "x").unwrap();
        fs::create_dir(dir.join("nested.md")).unwrap();

        let names = scan(dir).unwrap();
        let expected: BTreeSet<String> = ["my-custom-helper", "sdlc-enforcer"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, expected);
    }
}
