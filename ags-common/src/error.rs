use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AgsError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Manifest fetch failed for '{location}': {reason}")]
    ManifestFetch { location: String, reason: String },

    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    #[error("Transport failure for '{location}': {reason}")]
    Transport { location: String, reason: String },

    #[error("Empty payload for '{0}'")]
    EmptyPayload(String),

    #[error("Backup Error: {0}")]
    Backup(String),

    #[error("Invalid artifact name '{0}'")]
    InvalidName(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Transaction Error: {0}")]
    Transaction(String),

    #[error("Cache Error: {0}")]
    Cache(String),

    #[error("IoError: {0}")]
    IoError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl AgsError {
    /// Manifest-level errors abort a run before any write.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgsError::ManifestFetch { .. } | AgsError::ManifestParse(_)
        )
    }

    /// Transport errors are the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, AgsError::Transport { .. } | AgsError::Http(_))
    }
}

impl From<std::io::Error> for AgsError {
    fn from(err: std::io::Error) -> Self {
        AgsError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for AgsError {
    fn from(err: reqwest::Error) -> Self {
        AgsError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for AgsError {
    fn from(err: serde_json::Error) -> Self {
        AgsError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for AgsError {
    fn from(err: toml::de::Error) -> Self {
        AgsError::Toml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_errors_are_fatal() {
        let fetch = AgsError::ManifestFetch {
            location: "https://example.com/manifest.json".into(),
            reason: "connection refused".into(),
        };
        assert!(fetch.is_fatal());
        assert!(AgsError::ManifestParse("bad".into()).is_fatal());
        assert!(!AgsError::EmptyPayload("x".into()).is_fatal());
        assert!(!AgsError::Backup("disk full".into()).is_fatal());
    }

    #[test]
    fn only_transport_errors_are_transient() {
        let transport = AgsError::Transport {
            location: "file:///nope".into(),
            reason: "gone".into(),
        };
        assert!(transport.is_transient());
        assert!(!AgsError::EmptyPayload("x".into()).is_transient());
    }
}
