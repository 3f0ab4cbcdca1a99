// ags-net/src/transport.rs
use std::io;

use ags_common::error::{AgsError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::http::{build_http_client, fetch_bytes};
use crate::location::Location;
use crate::validation::validate_location;

/// Retrieves raw bytes from a location. Implementations report retrieval problems
/// as `AgsError::Transport`; they never judge the content.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<Vec<u8>>;
}

/// Reads `file://` locations from the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FileTransport;

#[async_trait]
impl Transport for FileTransport {
    async fn fetch(&self, location: &Location) -> Result<Vec<u8>> {
        let path = location.to_file_path().ok_or_else(|| AgsError::Transport {
            location: location.to_string(),
            reason: "not a local file location".to_string(),
        })?;
        debug!("Reading local payload {}", path.display());
        tokio::fs::read(&path).await.map_err(|e| AgsError::Transport {
            location: location.to_string(),
            reason: match e.kind() {
                io::ErrorKind::NotFound => "file not found".to_string(),
                _ => e.to_string(),
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, location: &Location) -> Result<Vec<u8>> {
        fetch_bytes(&self.client, location).await
    }
}

/// Dispatches on the location scheme and enforces the scheme policy.
#[derive(Debug, Clone)]
pub struct DefaultTransport {
    http: HttpTransport,
    file: FileTransport,
    allow_http: bool,
}

impl DefaultTransport {
    pub fn new(allow_http: bool) -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new()?,
            file: FileTransport,
            allow_http,
        })
    }
}

#[async_trait]
impl Transport for DefaultTransport {
    async fn fetch(&self, location: &Location) -> Result<Vec<u8>> {
        validate_location(location, self.allow_http)?;
        if location.is_local() {
            self.file.fetch(location).await
        } else {
            self.http.fetch(location).await
        }
    }
}
