// ags-common/src/lib.rs
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;

// Re-export key types
pub use cache::Cache;
pub use config::Config;
pub use error::{AgsError, Result};
pub use model::{Manifest, ManifestEntry, ProjectProfile};
