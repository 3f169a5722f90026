//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::inventory::InventoryRecord;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// A run groups every record harvested by one invocation. Records are
/// written once, after crawling, and read back for report-only passes.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Marks a run as completed and stamps its finish time
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Marks a run as failed and stamps its finish time
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Most recent run that completed
    fn latest_completed_run(&self) -> StorageResult<Option<RunRecord>>;

    // ===== Records =====

    /// Stores records for a run in one transaction
    ///
    /// # Returns
    ///
    /// The number of records written
    fn insert_records(&mut self, run_id: i64, records: &[InventoryRecord])
        -> StorageResult<usize>;

    /// Loads a run's records in insertion order
    fn load_records(&self, run_id: i64) -> StorageResult<Vec<InventoryRecord>>;

    /// Number of records stored for a run
    fn count_records(&self, run_id: i64) -> StorageResult<u64>;

    /// Stores a run's records and marks the run completed
    ///
    /// If either step fails, the run is marked failed before the error is
    /// returned, so no run is left running.
    fn store_run(&mut self, run_id: i64, records: &[InventoryRecord]) -> StorageResult<usize> {
        let result = self
            .insert_records(run_id, records)
            .and_then(|count| self.complete_run(run_id).map(|()| count));

        if result.is_err() {
            if let Err(e) = self.fail_run(run_id) {
                tracing::warn!("Failed to mark run {} as failed: {}", run_id, e);
            }
        }
        result
    }
}
