// ags-common/src/model/mod.rs
pub mod artifact;
pub mod manifest;
pub mod profile;

// Re-export
pub use artifact::{
    artifact_file_name, validate_name, ArtifactName, FailureReason, InstallOutcome,
    InstallResult, ARTIFACT_EXTENSION,
};
pub use manifest::{Manifest, ManifestEntry};
pub use profile::ProjectProfile;
