// ags-core/src/pipeline/mod.rs
pub mod engine;
mod worker;

pub use engine::{SyncEngine, SyncPlan, SyncRequest};
