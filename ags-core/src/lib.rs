// ags-core/src/lib.rs
pub mod classify;
pub mod install;
pub mod inventory;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod resolution;
pub mod select;
pub mod verify;

// Re-export key types for the CLI crate
pub use classify::{classify, ClassificationBuckets};
pub use install::BackupRecord;
pub use manifest::{parse_manifest, ManifestResolver, ResolvedSelection};
pub use pipeline::{SyncEngine, SyncPlan, SyncRequest};
pub use report::SyncReport;
pub use resolution::{resolve, FixedDecider, Resolution, ResolutionMode, UpgradeDecider};
pub use select::{select, Predicate, RuleSet, SelectionRule};
pub use verify::verify_mandatory;
