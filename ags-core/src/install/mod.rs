// ags-core/src/install/mod.rs
pub mod backup;
pub mod staging;
pub mod transaction;

pub use backup::{BackupEntry, BackupRecord, BACKUP_MANIFEST_FILE};
pub use staging::{StagedFile, StagingArea};
pub use transaction::{Transaction, TxState};
