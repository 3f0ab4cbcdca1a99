// ags-net/src/api.rs
use ags_common::error::{AgsError, Result};
use tracing::{debug, error};

use crate::location::Location;
use crate::transport::Transport;

/// Fetches the raw catalog document. Any retrieval failure, including a
/// disallowed location, is a `ManifestFetch` error; a body that is not UTF-8
/// is a `ManifestParse` error.
pub async fn fetch_manifest(transport: &dyn Transport, location: &Location) -> Result<String> {
    debug!("Fetching manifest from {}", location);
    let bytes = transport.fetch(location).await.map_err(|e| {
        error!("Manifest fetch failed for {}: {}", location, e);
        let reason = match e {
            AgsError::Transport { reason, .. } => reason,
            other => other.to_string(),
        };
        AgsError::ManifestFetch {
            location: location.to_string(),
            reason,
        }
    })?;
    String::from_utf8(bytes).map_err(|e| {
        AgsError::ManifestParse(format!("manifest at {location} is not valid UTF-8: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FileTransport;

    #[tokio::test]
    async fn missing_manifest_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let location = Location::from_path(&dir.path().join("manifest.json")).unwrap();
        let err = fetch_manifest(&FileTransport, &location).await.unwrap_err();
        assert!(matches!(err, AgsError::ManifestFetch { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn binary_manifest_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let location = Location::from_path(&path).unwrap();
        let err = fetch_manifest(&FileTransport, &location).await.unwrap_err();
        assert!(matches!(err, AgsError::ManifestParse(_)));
    }
}
